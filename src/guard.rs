use serde::Serialize;
use tracing::debug;

use crate::permission;
use crate::routes::{Route, CHANGE_PASSWORD_PATH, LOGIN_PATH, UNAUTHORIZED_PATH};
use crate::session::SessionStore;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "decision", rename_all = "camelCase")]
pub enum GuardDecision {
    /// Session restore still running; show a neutral placeholder.
    Loading,
    Render { path: String },
    Redirect { to: String, reason: RedirectReason },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum RedirectReason {
    NotAuthenticated,
    PasswordChangeRequired,
    PermissionDenied,
}

impl GuardDecision {
    pub fn is_render(&self) -> bool {
        matches!(self, Self::Render { .. })
    }
}

fn redirect(to: &str, reason: RedirectReason) -> GuardDecision {
    GuardDecision::Redirect {
        to: to.to_string(),
        reason,
    }
}

/// Decides whether `route` may be shown for the current session.
pub fn decide(session: &SessionStore, route: &Route) -> GuardDecision {
    if session.is_loading() {
        return GuardDecision::Loading;
    }
    let Some(principal) = session.principal() else {
        return redirect(LOGIN_PATH, RedirectReason::NotAuthenticated);
    };
    if principal.must_change_password && !route.password_change_exempt {
        return redirect(CHANGE_PASSWORD_PATH, RedirectReason::PasswordChangeRequired);
    }
    let decision = if permission::check(Some(principal), route.requires) {
        GuardDecision::Render {
            path: route.path.to_string(),
        }
    } else {
        redirect(UNAUTHORIZED_PATH, RedirectReason::PermissionDenied)
    };
    debug!(path = route.path, role = %principal.role, ?decision, "route guard");
    decision
}
