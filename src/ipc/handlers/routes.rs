use serde_json::json;

use crate::guard::{self, GuardDecision};
use crate::ipc::error::{err, ok};
use crate::ipc::helpers::param_str;
use crate::ipc::types::{AppState, Request};
use crate::routes::{find_route, is_public, route_table};

/// Route table annotated with what the current session would get, so the
/// shell can build its navigation menu.
fn handle_list(state: &mut AppState, req: &Request) -> serde_json::Value {
    let routes: Vec<serde_json::Value> = route_table()
        .iter()
        .map(|r| {
            json!({
                "route": r,
                "decision": guard::decide(&state.session, r)
            })
        })
        .collect();
    ok(&req.id, json!({ "routes": routes }))
}

fn handle_resolve(state: &mut AppState, req: &Request) -> serde_json::Value {
    let path = match param_str(req, "path") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    if is_public(path) {
        let decision = GuardDecision::Render {
            path: path.to_string(),
        };
        return ok(&req.id, json!(decision));
    }
    let Some(route) = find_route(path) else {
        return err(
            &req.id,
            "not_found",
            format!("unknown route: {}", path),
            None,
        );
    };
    ok(&req.id, json!(guard::decide(&state.session, &route)))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "routes.list" => Some(handle_list(state, req)),
        "routes.resolve" => Some(handle_resolve(state, req)),
        _ => None,
    }
}
