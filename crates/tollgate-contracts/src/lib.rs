//! # tollgate-contracts
//!
//! Shared types, configuration schema, and error contracts for the tollgate
//! approval engine.
//!
//! All crates in the workspace import from here. No business logic lives in
//! this crate, only data definitions, their encodings and the error type.

pub mod action;
pub mod config;
pub mod error;
pub mod feedback;
pub mod learning;
pub mod policy;

#[cfg(test)]
mod tests {
    use super::*;
    use action::{Action, SimplifiedInput, ToolInput};
    use config::GateConfig;
    use error::GateError;
    use feedback::{Executed, FeedbackEntry};
    use policy::{Decision, RuleAction, RuleTier, Verdict};

    // ── ToolInput ────────────────────────────────────────────────────────────

    #[test]
    fn primary_text_prefers_command_then_content() {
        let both = ToolInput {
            command: Some("ls -la".to_string()),
            content: Some("hello".to_string()),
            ..ToolInput::default()
        };
        assert_eq!(both.primary_text(), "ls -la");

        let content_only = ToolInput {
            content: Some("hello".to_string()),
            ..ToolInput::default()
        };
        assert_eq!(content_only.primary_text(), "hello");

        // An empty command falls through to content.
        let empty_command = ToolInput {
            command: Some(String::new()),
            content: Some("body".to_string()),
            ..ToolInput::default()
        };
        assert_eq!(empty_command.primary_text(), "body");

        assert_eq!(ToolInput::default().primary_text(), "");
    }

    #[test]
    fn tool_input_ignores_unknown_host_fields() {
        let input: ToolInput = serde_json::from_value(serde_json::json!({
            "command": "npm test",
            "description": "run the suite",
            "todos": [],
        }))
        .unwrap();
        assert_eq!(input, ToolInput::command("npm test"));
    }

    // ── SimplifiedInput ──────────────────────────────────────────────────────

    #[test]
    fn simplified_input_bounds_large_fields() {
        let input = ToolInput {
            command: Some("c".repeat(600)),
            content: Some("x".repeat(200)),
            query: Some("q".repeat(300)),
            file_path: Some("/tmp/test.py".to_string()),
            pattern: Some("**/*.rs".to_string()),
        };
        let simplified = SimplifiedInput::from_input(&input);

        assert_eq!(simplified.command.as_deref().map(str::len), Some(500));
        assert_eq!(
            simplified.content_preview.as_deref(),
            Some(format!("{}...", "x".repeat(100)).as_str())
        );
        assert_eq!(simplified.query.as_deref().map(str::len), Some(200));
        assert_eq!(simplified.file_path.as_deref(), Some("/tmp/test.py"));
        assert_eq!(simplified.pattern.as_deref(), Some("**/*.rs"));
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        let s = "é".repeat(10);
        assert_eq!(action::truncate_chars(&s, 3), "ééé");
        assert_eq!(action::truncate_chars("ab", 5), "ab");
    }

    // ── FeedbackEntry encoding ───────────────────────────────────────────────

    #[test]
    fn executed_is_encoded_as_nullable_bool() {
        let entry = FeedbackEntry::new(
            "toolu_1",
            "session-1",
            &Action::new("Bash", ToolInput::command("ls")),
            Decision::Ask,
        );
        let value = serde_json::to_value(&entry).unwrap();
        assert!(value["executed"].is_null());
        assert_eq!(value["auto_decision"], "ask");
        assert_eq!(value["input"]["command"], "ls");

        let mut patched = entry.clone();
        patched.executed = Executed::Yes;
        let value = serde_json::to_value(&patched).unwrap();
        assert_eq!(value["executed"], serde_json::Value::Bool(true));
    }

    #[test]
    fn feedback_entry_tolerates_missing_optional_fields() {
        let line = r#"{"id":"a","ts":"2026-01-02T03:04:05Z","tool":"Read","auto_decision":"allow"}"#;
        let entry: FeedbackEntry = serde_json::from_str(line).unwrap();
        assert_eq!(entry.executed, Executed::Unknown);
        assert_eq!(entry.session_id, "");
        assert_eq!(entry.input, SimplifiedInput::default());
        assert!(!entry.is_resolved_ask());
    }

    #[test]
    fn feedback_entry_reads_offsetless_local_timestamps() {
        let line = r#"{"id": "toolu_1", "ts": "2026-10-19T12:34:56.123456", "session_id": "s", "tool": "Bash", "input": {"command": "ls"}, "auto_decision": "ask", "executed": null}"#;
        let entry: FeedbackEntry = serde_json::from_str(line).unwrap();
        let local = entry.timestamp.with_timezone(&chrono::Local);
        assert_eq!(
            local.naive_local().to_string(),
            "2026-10-19 12:34:56.123456"
        );
        assert_eq!(
            entry.partition_date(),
            chrono::NaiveDate::from_ymd_opt(2026, 10, 19).unwrap()
        );

        let whole_seconds = r#"{"id":"b","ts":"2026-10-19T08:00:00","tool":"Read","auto_decision":"allow"}"#;
        assert!(serde_json::from_str::<FeedbackEntry>(whole_seconds).is_ok());

        let garbage = r#"{"id":"c","ts":"yesterday","tool":"Read","auto_decision":"allow"}"#;
        assert!(serde_json::from_str::<FeedbackEntry>(garbage).is_err());
    }

    #[test]
    fn resolved_ask_requires_known_outcome() {
        let mut entry = FeedbackEntry::new(
            "x",
            "",
            &Action::new("Bash", ToolInput::command("ls")),
            Decision::Ask,
        );
        assert!(!entry.is_resolved_ask());
        entry.executed = Executed::No;
        assert!(entry.is_resolved_ask());
        entry.decision = Decision::Allow;
        assert!(!entry.is_resolved_ask());
    }

    // ── Policy types ─────────────────────────────────────────────────────────

    #[test]
    fn ask_verdict_is_not_automated() {
        let v = Verdict::ask();
        assert_eq!(v.decision, Decision::Ask);
        assert!(v.reason.is_none());
        assert!(!v.is_automated());
        assert!(Verdict::new(Decision::Deny, None).is_automated());
    }

    #[test]
    fn rule_action_parses_case_insensitively() {
        assert_eq!(" Allow ".parse::<RuleAction>().unwrap(), RuleAction::Allow);
        assert_eq!("deny".parse::<RuleAction>().unwrap(), RuleAction::Deny);
        assert!("ask".parse::<RuleAction>().is_err());
    }

    #[test]
    fn tier_priority_order() {
        assert_eq!(
            RuleTier::PRIORITY.map(RuleTier::as_str),
            ["project-learned", "project-base", "global-learned", "global-base"]
        );
    }

    // ── GateConfig ───────────────────────────────────────────────────────────

    #[test]
    fn config_defaults_fill_missing_keys() {
        let config = GateConfig::from_toml_str("[learning]\nthreshold = 5\n").unwrap();
        assert_eq!(config.learning.threshold, 5);
        assert_eq!(config.learning.confidence_min, 0.8);
        assert_eq!(config.learning.interval, 10);
        assert_eq!(config.feedback.patch_window_days, 7);
        assert!(config.session_review.enabled);
        assert!(!config.advisor.enabled);
    }

    #[test]
    fn config_missing_file_yields_defaults() {
        let config = GateConfig::load(std::path::Path::new("/nonexistent/tollgate.toml")).unwrap();
        assert_eq!(config, GateConfig::default());
    }

    #[test]
    fn config_malformed_toml_is_config_error() {
        match GateConfig::from_toml_str("this is ][ not toml") {
            Err(GateError::Config { reason }) => {
                assert!(reason.contains("failed to parse config TOML"), "got: {reason}");
            }
            other => panic!("expected Config error, got {:?}", other),
        }
    }

    // ── GateError display messages ───────────────────────────────────────────

    #[test]
    fn error_io_display() {
        let err = GateError::io(
            std::path::Path::new("/tmp/rules.md"),
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/rules.md"));
        assert!(msg.contains("denied"));
    }

    #[test]
    fn error_invalid_pattern_display() {
        let err = GateError::InvalidPattern {
            pattern: "([".to_string(),
            reason: "unclosed group".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("invalid pattern"));
        assert!(msg.contains("(["));
    }
}
