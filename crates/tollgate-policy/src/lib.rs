//! # tollgate-policy
//!
//! Tiered, Markdown-driven, ask-by-default rule evaluation for tollgate.
//!
//! ## Overview
//!
//! Rules live in four Markdown documents (project learned, project base,
//! global learned, global base). [`RuleStore`] loads them in that order,
//! [`evaluate`] walks the concatenated list and the first matching rule wins.
//! If no rule matches, the verdict is `ask`: defer to a human.
//! [`TieredPolicyEngine`] implements the
//! [`PolicyEngine`](tollgate_core::traits::PolicyEngine) trait on top of both.
//! [`RuleWriter`] appends learned rules back into the documents.
//!
//! ## Quick start
//!
//! ```rust,ignore
//! use tollgate_policy::{MemoryBank, RuleStore, TieredPolicyEngine};
//!
//! let bank = MemoryBank::from_dirs(&home, &project_dir);
//! let engine = TieredPolicyEngine::new(RuleStore::from_memory_bank(&bank));
//! // Pass `engine` to `tollgate_core::Gate::new(...)`.
//! ```

pub mod engine;
pub mod parser;
pub mod rule;
pub mod store;
pub mod writer;

pub use engine::{evaluate, TieredPolicyEngine};
pub use parser::parse_document;
pub use rule::Rule;
pub use store::{MemoryBank, RuleSource, RuleStore};
pub use writer::RuleWriter;

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use std::path::Path;

    use tollgate_contracts::{
        action::{Action, ToolInput},
        error::GateError,
        learning::{BasedOn, Scope, Suggestion},
        policy::{Decision, RuleAction, RuleTier, Verdict},
    };
    use tollgate_core::traits::PolicyEngine;

    use crate::{
        evaluate, parse_document, parser::scan_blocks, MemoryBank, RuleStore, RuleWriter,
        TieredPolicyEngine,
    };

    // ── Helpers ───────────────────────────────────────────────────────────────

    fn bash(command: &str) -> Action {
        Action::new("Bash", ToolInput::command(command))
    }

    fn file(tool: &str, path: &str) -> Action {
        Action::new(tool, ToolInput::file(path))
    }

    fn write_doc(path: &Path, content: &str) {
        std::fs::create_dir_all(path.parent().unwrap()).unwrap();
        std::fs::write(path, content).unwrap();
    }

    fn suggestion(tool: &str, pattern: Option<&str>, path: Option<&str>) -> Suggestion {
        Suggestion {
            tool: tool.to_string(),
            action: RuleAction::Allow,
            confidence: 1.0,
            based_on: BasedOn {
                approved: 4,
                rejected: 0,
                samples: vec![],
            },
            pattern: pattern.map(str::to_string),
            path: path.map(str::to_string),
            reason: "user consistently approves this".to_string(),
        }
    }

    // ── 1. ask-by-default ─────────────────────────────────────────────────────

    /// With no rules loaded, every action is deferred with no reason.
    #[test]
    fn test_ask_by_default() {
        let verdict = evaluate(&file("Read", "/a/b.txt"), &[]);
        assert_eq!(verdict, Verdict::ask());
    }

    // ── 2. explicit deny ──────────────────────────────────────────────────────

    /// A matching deny rule returns Deny with the rule's reason.
    #[test]
    fn test_explicit_deny() {
        let doc = r#"
### no-force-remove
- tool: Bash
  action: deny
  pattern: ^rm -rf
  reason: recursive force removal is never automated
"#;
        let rules = parse_document(doc, RuleTier::GlobalBase);
        let verdict = evaluate(&bash("rm -rf /tmp/x"), &rules);

        assert_eq!(verdict.decision, Decision::Deny);
        assert_eq!(
            verdict.reason.as_deref(),
            Some("recursive force removal is never automated")
        );
    }

    // ── 3. tool matching ──────────────────────────────────────────────────────

    /// Tool patterns support alternation and must match the whole name.
    #[test]
    fn test_tool_alternation_is_full_match() {
        let doc = "### edits\n- tool: Write|Edit\n  action: allow\n";
        let rules = parse_document(doc, RuleTier::ProjectBase);

        assert_eq!(evaluate(&file("Edit", "/a.rs"), &rules).decision, Decision::Allow);
        assert_eq!(evaluate(&file("Write", "/a.rs"), &rules).decision, Decision::Allow);
        assert_eq!(
            evaluate(&file("WriteFile", "/a.rs"), &rules),
            Verdict::ask(),
            "tool pattern must not match a longer tool name"
        );
    }

    // ── 4. content pattern ────────────────────────────────────────────────────

    /// The content pattern is a search, and falls back to file content when
    /// the action has no command.
    #[test]
    fn test_content_pattern_searches_command_then_content() {
        let doc = "### secrets\n- tool: Write\n  action: deny\n  pattern: API_KEY=\n";
        let rules = parse_document(doc, RuleTier::ProjectBase);

        let action = Action::new(
            "Write",
            ToolInput {
                content: Some("export API_KEY=abc".to_string()),
                file_path: Some("/app/.envrc".to_string()),
                ..ToolInput::default()
            },
        );
        assert_eq!(evaluate(&action, &rules).decision, Decision::Deny);
        assert_eq!(evaluate(&file("Write", "/app/x"), &rules), Verdict::ask());
    }

    /// An invalid content regex makes its rule a non-match; later rules are
    /// still evaluated.
    #[test]
    fn test_invalid_pattern_falls_through() {
        let doc = r#"
### broken
- tool: Bash
  action: deny
  pattern: ([unclosed

### fallback
- tool: Bash
  action: allow
  reason: fallback rule
"#;
        let rules = parse_document(doc, RuleTier::ProjectBase);
        assert_eq!(rules.len(), 2);

        let verdict = evaluate(&bash("ls"), &rules);
        assert_eq!(verdict.decision, Decision::Allow);
        assert_eq!(verdict.reason.as_deref(), Some("fallback rule"));
    }

    // ── 5. path matching ──────────────────────────────────────────────────────

    /// A `**/` prefix matches the base name in any directory.
    #[test]
    fn test_double_star_prefix_matches_base_name() {
        let doc = "### env\n- tool: Write|Edit\n  action: deny\n  path: \"**/*.env\"\n";
        let rules = parse_document(doc, RuleTier::GlobalBase);

        assert_eq!(rules[0].path.as_deref(), Some("**/*.env"), "quotes are stripped");
        assert_eq!(evaluate(&file("Write", "/tmp/.env"), &rules).decision, Decision::Deny);
        assert_eq!(
            evaluate(&file("Edit", "/deep/nested/dir/prod.env"), &rules).decision,
            Decision::Deny
        );
        assert_eq!(evaluate(&file("Edit", "/deep/app.envx"), &rules), Verdict::ask());
    }

    /// A wildcard without `**/` is matched against the full path; `*`
    /// crosses directory separators.
    #[test]
    fn test_plain_wildcard_matches_full_path() {
        let doc = "### tmp\n- tool: Write\n  action: allow\n  path: /tmp/*\n";
        let rules = parse_document(doc, RuleTier::GlobalBase);

        assert_eq!(evaluate(&file("Write", "/tmp/a/b.txt"), &rules).decision, Decision::Allow);
        assert_eq!(evaluate(&file("Write", "/home/tmp/a"), &rules), Verdict::ask());
    }

    /// A path rule never matches an action that carries no file path.
    #[test]
    fn test_path_rule_requires_file_path() {
        let doc = "### any\n- tool: .*\n  action: allow\n  path: \"*\"\n";
        let rules = parse_document(doc, RuleTier::GlobalBase);

        assert_eq!(evaluate(&bash("ls"), &rules), Verdict::ask());
        assert_eq!(evaluate(&file("Read", "/x"), &rules).decision, Decision::Allow);
    }

    // ── 6. first-match wins ───────────────────────────────────────────────────

    /// When two rules match, only the first one decides.
    #[test]
    fn test_first_match_wins() {
        let doc = r#"
### first
- tool: Bash
  action: allow
  reason: first

### second
- tool: Bash
  action: deny
  reason: must never fire
"#;
        let rules = parse_document(doc, RuleTier::ProjectBase);
        let verdict = evaluate(&bash("cargo build"), &rules);
        assert_eq!(verdict.decision, Decision::Allow);
        assert_eq!(verdict.reason.as_deref(), Some("first"));
    }

    // ── 7. tier priority ──────────────────────────────────────────────────────

    /// Identical rules in different tiers: the higher tier decides.
    #[test]
    fn test_tier_priority() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        let block = |action: &str, reason: &str| {
            format!("### r\n- tool: Bash\n  action: {action}\n  pattern: ^git push\n  reason: {reason}\n")
        };

        write_doc(&bank.rules_path(RuleTier::GlobalBase), &block("deny", "global-base"));
        write_doc(&bank.rules_path(RuleTier::GlobalLearned), &block("allow", "global-learned"));
        write_doc(&bank.rules_path(RuleTier::ProjectBase), &block("deny", "project-base"));
        write_doc(&bank.rules_path(RuleTier::ProjectLearned), &block("allow", "project-learned"));

        let engine = TieredPolicyEngine::new(RuleStore::from_memory_bank(&bank));
        let reason = |engine: &TieredPolicyEngine| {
            engine.evaluate(&bash("git push origin main")).unwrap().reason.unwrap()
        };

        assert_eq!(reason(&engine), "project-learned");
        std::fs::remove_file(bank.rules_path(RuleTier::ProjectLearned)).unwrap();
        assert_eq!(reason(&engine), "project-base");
        std::fs::remove_file(bank.rules_path(RuleTier::ProjectBase)).unwrap();
        assert_eq!(reason(&engine), "global-learned");
        std::fs::remove_file(bank.rules_path(RuleTier::GlobalLearned)).unwrap();
        assert_eq!(reason(&engine), "global-base");
    }

    /// Load order is the tier order and every rule carries its tier.
    #[test]
    fn test_store_concatenates_in_tier_order() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        write_doc(&bank.rules_path(RuleTier::GlobalBase), "### g\n- tool: Read\n  action: allow\n");
        write_doc(&bank.rules_path(RuleTier::ProjectBase), "### p\n- tool: Read\n  action: deny\n");

        let rules = RuleStore::from_memory_bank(&bank).load();
        let tiers: Vec<_> = rules.iter().map(|r| (r.id.as_str(), r.tier)).collect();
        assert_eq!(tiers, vec![("p", RuleTier::ProjectBase), ("g", RuleTier::GlobalBase)]);
    }

    /// An unreadable source is skipped and the others still load.
    #[test]
    fn test_unreadable_source_does_not_block_others() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        // A directory where a document should be cannot be read as text.
        std::fs::create_dir_all(bank.rules_path(RuleTier::ProjectBase)).unwrap();
        write_doc(&bank.rules_path(RuleTier::GlobalBase), "### g\n- tool: Read\n  action: allow\n");

        let rules = RuleStore::from_memory_bank(&bank).load();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "g");
    }

    // ── 8. parsing ────────────────────────────────────────────────────────────

    /// Blocks without `tool:` are skipped; prose under a heading is ignored.
    #[test]
    fn test_parse_skips_blocks_without_tool() {
        let doc = r#"
# Project rules

Some introduction text: with a colon.

### not-a-rule
- action: allow
  reason: no tool here

### described
This rule allows reading anything.
- tool: Read
  action: allow
  owner: platform-team
"#;
        let rules = parse_document(doc, RuleTier::ProjectBase);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, "described");
        assert_eq!(rules[0].tool, "Read");
        assert!(rules[0].pattern.is_none());
    }

    /// A blank line ends the block; keys after it are not part of the rule.
    #[test]
    fn test_blank_line_terminates_block() {
        let doc = "### r\n- tool: Bash\n  action: allow\n\n  pattern: ^never\n";
        let rules = parse_document(doc, RuleTier::ProjectBase);
        assert_eq!(rules.len(), 1);
        assert!(rules[0].pattern.is_none());
    }

    /// Blocks with a missing or unknown action are skipped, not fatal.
    #[test]
    fn test_invalid_action_skips_block() {
        let doc = "### a\n- tool: Bash\n  reason: x\n\n### b\n- tool: Bash\n  action: maybe\n\n### c\n- tool: Bash\n  action: deny\n";
        let rules = parse_document(doc, RuleTier::ProjectBase);
        assert_eq!(rules.iter().map(|r| r.id.as_str()).collect::<Vec<_>>(), vec!["c"]);
        assert_eq!(scan_blocks(doc).len(), 3, "all three blocks are scanned");
    }

    /// A block before any heading gets the placeholder id.
    #[test]
    fn test_block_without_heading() {
        let rules = parse_document("- tool: Glob\n  action: allow\n", RuleTier::GlobalBase);
        assert_eq!(rules[0].id, "unknown");
    }

    // ── 9. learned-rule persistence ───────────────────────────────────────────

    /// A saved rule is appended under a fresh header and loads back with its
    /// statistics.
    #[test]
    fn test_writer_round_trips_learned_rule() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        let writer = RuleWriter::new(bank.clone());

        let id = writer
            .save(&suggestion("Bash", Some("^npm test"), None), Scope::Project)
            .unwrap()
            .expect("first save must write");
        assert!(id.starts_with("learned-"));

        let content = std::fs::read_to_string(bank.learned_rules_path(Scope::Project)).unwrap();
        assert!(content.starts_with("# Project learned rules"));

        let rules = parse_document(&content, RuleTier::ProjectLearned);
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].id, id);
        assert_eq!(rules[0].pattern.as_deref(), Some("^npm test"));
        assert_eq!(rules[0].confidence, Some(1.0));
        let based_on = rules[0].based_on.as_ref().unwrap();
        assert_eq!((based_on.approved, based_on.rejected), (4, 0));

        assert_eq!(evaluate(&bash("npm test --watch"), &rules).decision, Decision::Allow);
    }

    /// Saving the same suggestion twice writes one block.
    #[test]
    fn test_writer_deduplicates() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        let writer = RuleWriter::new(bank.clone());
        let s = suggestion("Write", None, Some("**/*.ts"));

        assert!(writer.save(&s, Scope::Global).unwrap().is_some());
        assert!(writer.contains(&s, Scope::Global));
        assert!(!writer.contains(&s, Scope::Project));
        assert_eq!(writer.save(&s, Scope::Global).unwrap(), None);

        // Same path for a different tool is a different rule.
        assert!(writer
            .save(&suggestion("Edit", None, Some("**/*.ts")), Scope::Global)
            .unwrap()
            .is_some());

        let content = std::fs::read_to_string(bank.learned_rules_path(Scope::Global)).unwrap();
        let rules = parse_document(&content, RuleTier::GlobalLearned);
        assert_eq!(rules.len(), 2);
        assert_ne!(rules[0].id, rules[1].id, "rule ids must be unique");
    }

    /// A saved rule appended after hand-written rules does not disturb them.
    #[test]
    fn test_writer_appends_after_existing_rules() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        let path = bank.learned_rules_path(Scope::Project);
        write_doc(&path, "### manual\n- tool: Read\n  action: allow");

        RuleWriter::new(bank)
            .save(&suggestion("Bash", Some("^cargo test"), None), Scope::Project)
            .unwrap();

        let rules = parse_document(&std::fs::read_to_string(&path).unwrap(), RuleTier::ProjectLearned);
        assert_eq!(rules.len(), 2);
        assert_eq!(rules[0].id, "manual");
        assert!(rules[0].pattern.is_none(), "manual rule must stay intact");
    }

    /// A suggestion whose pattern cannot compile is never written.
    #[test]
    fn test_writer_rejects_invalid_pattern() {
        let dir = tempfile::tempdir().unwrap();
        let bank = MemoryBank::from_dirs(&dir.path().join("home"), &dir.path().join("project"));
        let writer = RuleWriter::new(bank.clone());

        match writer.save(&suggestion("Bash", Some("^npm ("), None), Scope::Project) {
            Err(GateError::InvalidPattern { pattern, .. }) => assert_eq!(pattern, "^npm ("),
            other => panic!("expected InvalidPattern, got {:?}", other),
        }
        assert!(!bank.learned_rules_path(Scope::Project).exists());
    }
}
