use serde_json::json;

use crate::ipc::error::{desk_err, no_workspace, ok};
use crate::ipc::helpers::{param_value, require_screen};
use crate::ipc::types::{AppState, Request};
use crate::preferences;
use crate::routes::Screen;

/// Branding is shown on the sign-in page too, so reads are not guarded.
fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return ok(&req.id, json!({ "preferences": preferences::default_preferences() }));
    };
    match preferences::load_preferences(conn) {
        Ok(p) => ok(&req.id, json!({ "preferences": p })),
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_screen(&state.session, req, Screen::Settings) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let patch = match param_value(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match preferences::update_preferences(conn, patch) {
        Ok(p) => ok(&req.id, json!({ "preferences": p })),
        Err(e) => desk_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "preferences.get" => Some(handle_get(state, req)),
        "preferences.update" => Some(handle_update(state, req)),
        _ => None,
    }
}
