use serde_json::json;

use crate::error::DeskError;
use crate::guard::{GuardDecision, RedirectReason};

pub fn ok(id: &str, result: serde_json::Value) -> serde_json::Value {
    json!({
        "id": id,
        "ok": true,
        "result": result
    })
}

pub fn err(
    id: &str,
    code: &str,
    message: impl Into<String>,
    details: Option<serde_json::Value>,
) -> serde_json::Value {
    let mut error = json!({
        "code": code,
        "message": message.into(),
    });
    if let Some(d) = details {
        error["details"] = d;
    }
    json!({
        "id": id,
        "ok": false,
        "error": error,
    })
}

pub fn desk_err(id: &str, e: &DeskError) -> serde_json::Value {
    let details = match e {
        DeskError::InvalidInput { field, .. } => Some(json!({ "field": field })),
        DeskError::ConnectionUnavailable { .. } => Some(json!({ "retryable": true })),
        _ => None,
    };
    err(id, e.code(), e.to_string(), details)
}

pub fn no_workspace(id: &str) -> serde_json::Value {
    err(id, "no_workspace", "select a workspace first", None)
}

/// Response for a guard decision that did not render.
pub fn guard_err(id: &str, decision: &GuardDecision) -> serde_json::Value {
    match decision {
        GuardDecision::Loading => err(id, "session_loading", "session is still loading", None),
        GuardDecision::Redirect { to, reason } => {
            let code = match reason {
                RedirectReason::NotAuthenticated => "not_authenticated",
                RedirectReason::PasswordChangeRequired => "password_change_required",
                RedirectReason::PermissionDenied => "permission_denied",
            };
            err(id, code, "access denied", Some(json!({ "redirect": to })))
        }
        GuardDecision::Render { .. } => err(id, "internal", "render is not an error", None),
    }
}
