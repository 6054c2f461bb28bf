use serde_json::json;

use crate::datasource::DataMode;
use crate::ipc::error::{desk_err, err, no_workspace, ok};
use crate::ipc::helpers::{param_str, require_screen};
use crate::ipc::types::{AppState, Request};
use crate::routes::Screen;

fn handle_get(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "dataSource": state.data_source.config() }))
}

fn handle_set_mode(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_screen(&state.session, req, Screen::Settings) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let raw = match param_str(req, "mode") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(mode) = DataMode::parse(raw) else {
        return err(&req.id, "bad_params", "mode must be one of: mock, real", None);
    };
    match state.data_source.set_mode(conn, mode) {
        Ok(connected) => {
            state.desks.reset_lists();
            ok(
                &req.id,
                json!({ "connected": connected, "dataSource": state.data_source.config() }),
            )
        }
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_set_base_url(state: &mut AppState, req: &Request) -> serde_json::Value {
    if let Err(resp) = require_screen(&state.session, req, Screen::Settings) {
        return resp;
    }
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let url = match param_str(req, "baseUrl") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    match state.data_source.set_base_url(conn, url) {
        Ok(connected) => {
            state.desks.reset_lists();
            ok(
                &req.id,
                json!({ "connected": connected, "dataSource": state.data_source.config() }),
            )
        }
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_check(state: &mut AppState, req: &Request) -> serde_json::Value {
    let connected = state.data_source.check_connection();
    ok(
        &req.id,
        json!({ "connected": connected, "dataSource": state.data_source.config() }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "dataSource.get" => Some(handle_get(state, req)),
        "dataSource.setMode" => Some(handle_set_mode(state, req)),
        "dataSource.setBaseUrl" => Some(handle_set_base_url(state, req)),
        "dataSource.check" => Some(handle_check(state, req)),
        _ => None,
    }
}
