//! The host's hook protocol: one JSON object in on stdin, at most one out on
//! stdout.

use serde::{Deserialize, Serialize};

use tollgate_contracts::{
    action::{Action, ToolInput},
    error::{GateError, GateResult},
    policy::{Decision, Verdict},
};
use tollgate_core::DecisionRequest;

/// A tool event as sent by the host. Unknown fields are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct HookInput {
    #[serde(default)]
    pub tool_name: String,
    #[serde(default)]
    pub tool_input: ToolInput,
    #[serde(default)]
    pub tool_use_id: String,
    #[serde(default)]
    pub session_id: String,
}

impl HookInput {
    pub fn parse(raw: &str) -> GateResult<Self> {
        serde_json::from_str(raw).map_err(|e| GateError::InvalidInput {
            reason: format!("malformed hook payload: {e}"),
        })
    }

    pub fn into_request(self) -> DecisionRequest {
        DecisionRequest {
            id: self.tool_use_id,
            session_id: self.session_id,
            action: Action::new(self.tool_name, self.tool_input),
        }
    }
}

/// The end-of-session event. Only the session id is used.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct StopInput {
    #[serde(default)]
    pub session_id: Option<String>,
}

impl StopInput {
    /// Parse `raw`; a malformed payload is an empty one.
    pub fn parse_lenient(raw: &str) -> Self {
        serde_json::from_str(raw).unwrap_or_default()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HookOutput {
    pub hook_specific_output: PermissionDecision,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PermissionDecision {
    pub hook_event_name: &'static str,
    pub permission_decision: Decision,
    pub permission_decision_reason: String,
}

impl HookOutput {
    /// The reply for `verdict`, or `None` for `ask`: the host's own prompt
    /// applies when nothing is printed.
    pub fn for_verdict(verdict: &Verdict) -> Option<Self> {
        if !verdict.is_automated() {
            return None;
        }
        let reason = verdict
            .reason
            .clone()
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| format!("Auto {}", verdict.decision));
        Some(Self {
            hook_specific_output: PermissionDecision {
                hook_event_name: "PreToolUse",
                permission_decision: verdict.decision,
                permission_decision_reason: reason,
            },
        })
    }
}

/// A note shown to the user after a tool ran.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SystemMessage {
    pub system_message: String,
}
