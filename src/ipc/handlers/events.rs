use chrono::{DateTime, Utc};
use serde_json::{json, Value};

use crate::error::DeskError;
use crate::events::{self, EventDraft};
use crate::ipc::error::{desk_err, err, no_workspace, ok};
use crate::ipc::helpers::{param_opt_str, param_str, param_value, require_screen};
use crate::ipc::types::{AppState, Request};
use crate::routes::Screen;

fn param_instant(req: &Request, key: &str) -> Result<Option<DateTime<Utc>>, Value> {
    let Some(raw) = param_opt_str(req, key) else {
        return Ok(None);
    };
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| Some(dt.with_timezone(&Utc)))
        .map_err(|e| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be an RFC 3339 timestamp: {}", key, e),
                Some(json!({ "field": key })),
            )
        })
}

fn handle_list(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let from = match param_instant(req, "from") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let to = match param_instant(req, "to") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match events::list_events(conn, from, to) {
        Ok(events) => ok(&req.id, json!({ "events": events })),
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_create(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let raw = match param_value(req, "event") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let draft: EventDraft = match serde_json::from_value(raw.clone()) {
        Ok(d) => d,
        Err(e) => return desk_err(&req.id, &DeskError::invalid_input("event", e.to_string())),
    };
    match events::create_event(conn, draft) {
        Ok(event) => ok(&req.id, json!({ "event": event })),
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_update(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let id = match param_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let patch = match param_value(req, "patch") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match events::update_event(conn, id, patch) {
        Ok(event) => ok(&req.id, json!({ "event": event })),
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_delete(state: &mut AppState, req: &Request) -> Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let id = match param_str(req, "id") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match events::delete_event(conn, id) {
        Ok(()) => ok(&req.id, json!({ "deleted": id })),
        Err(e) => desk_err(&req.id, &e),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    let handler: fn(&mut AppState, &Request) -> Value = match req.method.as_str() {
        "events.list" => handle_list,
        "events.create" => handle_create,
        "events.update" => handle_update,
        "events.delete" => handle_delete,
        _ => return None,
    };
    if let Err(resp) = require_screen(&state.session, req, Screen::Calendar) {
        return Some(resp);
    }
    Some(handler(state, req))
}
