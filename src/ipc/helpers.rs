use serde_json::Value;

use crate::guard;
use crate::ipc::error::{err, guard_err};
use crate::ipc::types::Request;
use crate::routes::{route_for, Screen};
use crate::session::SessionStore;

pub fn param_str<'a>(req: &'a Request, key: &str) -> Result<&'a str, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_str())
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

pub fn param_opt_str<'a>(req: &'a Request, key: &str) -> Option<&'a str> {
    req.params.get(key).and_then(|v| v.as_str())
}

pub fn param_usize(req: &Request, key: &str) -> Result<usize, Value> {
    req.params
        .get(key)
        .and_then(|v| v.as_u64())
        .map(|n| n as usize)
        .ok_or_else(|| {
            err(
                &req.id,
                "bad_params",
                format!("{} must be a non-negative integer", key),
                None,
            )
        })
}

pub fn param_value<'a>(req: &'a Request, key: &str) -> Result<&'a Value, Value> {
    req.params
        .get(key)
        .ok_or_else(|| err(&req.id, "bad_params", format!("missing {}", key), None))
}

/// Runs the route guard for `screen`; `Err` carries the denial response.
pub fn require_screen(session: &SessionStore, req: &Request, screen: Screen) -> Result<(), Value> {
    let decision = guard::decide(session, &route_for(screen));
    if decision.is_render() {
        Ok(())
    } else {
        Err(guard_err(&req.id, &decision))
    }
}
