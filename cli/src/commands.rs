//! Subcommand handlers. Each writes its user-facing output to `out`; hook
//! handlers never fail the host.

use std::io::Write;

use chrono::Local;
use tracing::{debug, info};

use tollgate_contracts::{
    error::{GateError, GateResult},
    feedback::Executed,
    learning::Suggestion,
};
use tollgate_core::{traits::FeedbackStore, Gate};
use tollgate_learn::{LearnOutcome, LearningCycle, Resolution};
use tollgate_policy::TieredPolicyEngine;

use crate::{
    hook::{HookInput, HookOutput, StopInput, SystemMessage},
    paths::Paths,
    session,
};

fn gate(paths: &Paths) -> Gate {
    Gate::new(
        Box::new(TieredPolicyEngine::new(paths.rule_store())),
        Box::new(paths.feedback_log()),
    )
}

fn learning_cycle(paths: &Paths) -> LearningCycle {
    LearningCycle::new(
        paths.config().learning,
        Box::new(paths.feedback_log()),
        Box::new(paths.call_counter()),
        paths.rule_writer(),
        paths.pending_queue(),
    )
}

fn write_json<T: serde::Serialize>(out: &mut dyn Write, value: &T) -> GateResult<()> {
    let line = serde_json::to_string(value).map_err(|e| GateError::Storage {
        reason: format!("failed to encode hook output: {e}"),
    })?;
    writeln!(out, "{line}").map_err(|e| GateError::Storage {
        reason: format!("failed to write hook output: {e}"),
    })
}

fn write_text(out: &mut dyn Write, text: &str) -> GateResult<()> {
    writeln!(out, "{text}").map_err(|e| GateError::Storage {
        reason: format!("failed to write output: {e}"),
    })
}

// ── Hooks ─────────────────────────────────────────────────────────────────────

/// Decide on a proposed tool call. Prints a decision only for allow/deny.
pub fn pre_tool_use(paths: &Paths, stdin: &str, out: &mut dyn Write) -> GateResult<()> {
    let input = match HookInput::parse(stdin) {
        Ok(input) => input,
        Err(e) => {
            debug!(error = %e, "ignoring pre-tool-use event");
            return Ok(());
        }
    };

    let verdict = gate(paths).decide(&input.into_request());
    match HookOutput::for_verdict(&verdict) {
        Some(output) => write_json(out, &output),
        None => Ok(()),
    }
}

/// Record that a tool ran, then give the learning cycle its tick.
pub fn post_tool_use(paths: &Paths, stdin: &str, out: &mut dyn Write) -> GateResult<()> {
    match HookInput::parse(stdin) {
        Ok(input) if !input.tool_use_id.is_empty() => {
            let window = paths.config().feedback.patch_window_days;
            let found = gate(paths).report_executed(&input.tool_use_id, Executed::Yes, window);
            debug!(tool = %input.tool_name, id = %input.tool_use_id, found, "reported execution");
        }
        Ok(_) => debug!("post-tool-use event without a tool use id"),
        Err(e) => debug!(error = %e, "ignoring post-tool-use event"),
    }

    let outcomes = learning_cycle(paths).tick();
    match describe_outcomes(&outcomes) {
        Some(message) => write_json(
            out,
            &SystemMessage {
                system_message: message,
            },
        ),
        None => Ok(()),
    }
}

/// Write the end-of-session summary.
pub fn stop(paths: &Paths, stdin: &str) -> GateResult<()> {
    let session_id = StopInput::parse_lenient(stdin)
        .session_id
        .filter(|id| !id.is_empty())
        .unwrap_or_else(|| Local::now().format("%Y%m%d_%H%M%S").to_string());

    let config = paths.config();
    let todays = paths.feedback_log().recent(1)?;
    session::review(
        &config.session_review,
        &todays,
        &session_id,
        &paths.bank().sessions_dir(),
        Local::now(),
    )?;
    Ok(())
}

// ── Management ────────────────────────────────────────────────────────────────

pub fn pending_list(paths: &Paths, out: &mut dyn Write) -> GateResult<()> {
    let pending = paths.pending_queue().list();
    if pending.is_empty() {
        return write_text(out, "No rules awaiting confirmation.");
    }
    for entry in pending {
        write_text(
            out,
            &format!(
                "{}  {}  ({})\n    {}",
                entry.id,
                describe_rule(&entry.rule),
                entry.reason,
                entry.rule.reason
            ),
        )?;
    }
    Ok(())
}

pub fn pending_resolve(
    paths: &Paths,
    id: &str,
    resolution: Resolution,
    out: &mut dyn Write,
) -> GateResult<()> {
    let resolved = paths
        .pending_queue()
        .resolve(id, resolution, &paths.rule_writer())?
        .ok_or_else(|| GateError::InvalidInput {
            reason: format!("no pending rule with id '{id}'"),
        })?;

    let rule = describe_rule(&resolved.entry.rule);
    let message = match (resolution, resolved.rule_id) {
        (Resolution::Dismiss, _) => format!("Dismissed {rule}."),
        (_, None) => format!("{rule} is already learned."),
        (Resolution::Global, Some(rule_id)) => format!("Saved {rule} globally as {rule_id}."),
        (Resolution::ProjectOnly, Some(rule_id)) => {
            format!("Saved {rule} for this project as {rule_id}.")
        }
    };
    info!(pending_id = %id, "{message}");
    write_text(out, &message)
}

/// Print the merged rule list in evaluation order.
pub fn rules(paths: &Paths, out: &mut dyn Write) -> GateResult<()> {
    let rules = paths.rule_store().load();
    if rules.is_empty() {
        return write_text(out, "No rules loaded; every action is deferred.");
    }
    for rule in rules {
        let mut line = format!(
            "{:<16} {:<28} {:<6} {}",
            rule.tier.as_str(),
            rule.id,
            rule.action.as_str(),
            rule.tool
        );
        if let Some(pattern) = &rule.pattern {
            line.push_str(&format!("  pattern={pattern}"));
        }
        if let Some(path) = &rule.path {
            line.push_str(&format!("  path={path}"));
        }
        write_text(out, &line)?;
    }
    Ok(())
}

/// Run the learning cycle now, regardless of the counter.
pub fn learn(paths: &Paths, out: &mut dyn Write) -> GateResult<()> {
    let outcomes = learning_cycle(paths).run();
    if outcomes.is_empty() {
        return write_text(out, "No new patterns found.");
    }
    for outcome in &outcomes {
        let line = match outcome {
            LearnOutcome::SavedProject { rule_id, suggestion } => {
                format!("saved    {rule_id}  {}", describe_rule(suggestion))
            }
            LearnOutcome::QueuedGlobal {
                pending_id,
                suggestion,
                ..
            } => format!("queued   {pending_id}  {}", describe_rule(suggestion)),
            LearnOutcome::Skipped { suggestion, scope } => {
                format!("skipped  ({scope})  {}", describe_rule(suggestion))
            }
        };
        write_text(out, &line)?;
    }
    Ok(())
}

// ── Formatting ────────────────────────────────────────────────────────────────

fn describe_rule(rule: &Suggestion) -> String {
    let mut text = format!("{} -> {}", rule.tool, rule.action);
    if let Some(pattern) = &rule.pattern {
        text.push_str(&format!(" [{pattern}]"));
    } else if let Some(path) = &rule.path {
        text.push_str(&format!(" [{path}]"));
    }
    text
}

/// The note shown after a learning tick, if anything was learned or queued.
pub fn describe_outcomes(outcomes: &[LearnOutcome]) -> Option<String> {
    let lines: Vec<String> = outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            LearnOutcome::SavedProject { suggestion, .. } => {
                Some(format!("Learned project rule: {}", suggestion.reason))
            }
            LearnOutcome::QueuedGlobal {
                pending_id,
                suggestion,
                reason,
            } => Some(format!(
                "Rule may apply to every project: {} ({reason}). \
                 Run `tollgate pending approve {pending_id}` to save it globally, \
                 `tollgate pending project {pending_id}` to keep it in this project, \
                 or `tollgate pending dismiss {pending_id}` to drop it.",
                describe_rule(suggestion)
            )),
            LearnOutcome::Skipped { .. } => None,
        })
        .collect();

    if lines.is_empty() {
        None
    } else {
        Some(lines.join("\n"))
    }
}
