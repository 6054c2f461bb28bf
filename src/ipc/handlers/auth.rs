use rusqlite::Connection;
use serde_json::json;

use crate::auth::{Authenticator, MockAuthenticator, RemoteAuthenticator};
use crate::datasource::DataSourceSwitch;
use crate::error::DeskResult;
use crate::ipc::error::{desk_err, no_workspace, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::session::Credentials;

/// The demo table serves sign-in unless a real backend is configured.
fn authenticator<'a>(
    data_source: &DataSourceSwitch,
    conn: &'a Connection,
) -> DeskResult<Box<dyn Authenticator + 'a>> {
    if data_source.uses_backend() {
        let client = data_source.client()?.clone();
        Ok(Box::new(RemoteAuthenticator::new(client)))
    } else {
        Ok(Box::new(MockAuthenticator::new(conn)))
    }
}

fn handle_login(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let email = match param_str(req, "email") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let password = match param_str(req, "password") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let auth = match authenticator(&state.data_source, conn) {
        Ok(a) => a,
        Err(e) => return desk_err(&req.id, &e),
    };

    match state
        .session
        .login(conn, auth.as_ref(), &Credentials::new(email, password))
    {
        Ok(principal) => {
            state.desks.reset_lists();
            ok(&req.id, json!({ "principal": principal, "session": state.session.state() }))
        }
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_logout(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    if let Err(e) = state.session.logout(conn) {
        return desk_err(&req.id, &e);
    }
    state.desks.reset_lists();
    ok(&req.id, json!({ "session": state.session.state() }))
}

fn handle_session(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(&req.id, json!({ "session": state.session.state() }))
}

fn handle_change_password(state: &mut AppState, req: &Request) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return no_workspace(&req.id);
    };
    let current = match param_str(req, "currentPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let new_password = match param_str(req, "newPassword") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let auth = match authenticator(&state.data_source, conn) {
        Ok(a) => a,
        Err(e) => return desk_err(&req.id, &e),
    };
    match state
        .session
        .change_password(conn, auth.as_ref(), current, new_password)
    {
        Ok(principal) => ok(&req.id, json!({ "principal": principal })),
        Err(e) => desk_err(&req.id, &e),
    }
}

fn handle_dismiss_error(state: &mut AppState, req: &Request) -> serde_json::Value {
    state.session.dismiss_error();
    ok(&req.id, json!({ "session": state.session.state() }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "auth.login" => Some(handle_login(state, req)),
        "auth.logout" => Some(handle_logout(state, req)),
        "auth.session" => Some(handle_session(state, req)),
        "auth.changePassword" => Some(handle_change_password(state, req)),
        "auth.dismissError" => Some(handle_dismiss_error(state, req)),
        _ => None,
    }
}
