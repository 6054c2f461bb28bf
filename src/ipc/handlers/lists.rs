use serde_json::{json, Value};

use crate::datasource::{DataMode, DataSourceSwitch};
use crate::entities::{Entity, EntityKind};
use crate::error::{DeskError, DeskResult};
use crate::ipc::error::{desk_err, err, ok};
use crate::ipc::helpers::{param_opt_str, param_str, param_usize, param_value, require_screen};
use crate::ipc::types::{AppState, EntityDesk, Request};
use crate::repository::{RemoteRepository, Repository};

/// What the caller asked for, with params already pulled out of the request.
enum Op<'r> {
    Load,
    View,
    Search(&'r str),
    Sort(&'r str),
    Page { page: usize, page_size: Option<usize> },
    Get(&'r str),
    Create(&'r Value),
    Update(&'r str, &'r Value),
    Delete(&'r str),
}

struct Backend<'s> {
    data_source: &'s DataSourceSwitch,
}

impl Backend<'_> {
    /// Runs `f` against the repository the current data mode selects.
    fn with_repo<T, R>(
        &self,
        desk: &mut EntityDesk<T>,
        f: impl FnOnce(&mut dyn Repository<T>) -> DeskResult<R>,
    ) -> DeskResult<R>
    where
        T: Entity,
    {
        match self.data_source.mode() {
            DataMode::Mock => {
                let repo: &mut dyn Repository<T> = &mut desk.fixtures;
                f(repo)
            }
            DataMode::Real => {
                let client = self.data_source.client()?;
                let mut remote = RemoteRepository::new(client);
                let repo: &mut dyn Repository<T> = &mut remote;
                f(repo)
            }
        }
    }

    fn reload<T: Entity>(&self, desk: &mut EntityDesk<T>) -> bool {
        match self.data_source.mode() {
            DataMode::Mock => desk.list.load(&desk.fixtures),
            DataMode::Real => match self.data_source.client() {
                Ok(client) => desk.list.load(&RemoteRepository::new(client)),
                Err(e) => {
                    let ticket = desk.list.begin_load();
                    desk.list.finish_load(ticket, Err(e))
                }
            },
        }
    }
}

fn view_result<T: Entity>(desk: &EntityDesk<T>) -> Value {
    json!({ "view": desk.list.view() })
}

fn run<T: Entity>(
    desk: &mut EntityDesk<T>,
    backend: &Backend<'_>,
    req: &Request,
    op: Op<'_>,
) -> Value {
    match op {
        Op::Load => {
            backend.reload(desk);
            ok(&req.id, view_result(desk))
        }
        Op::View => ok(&req.id, view_result(desk)),
        Op::Search(term) => {
            desk.list.set_search_term(term);
            ok(&req.id, view_result(desk))
        }
        Op::Sort(field) => match desk.list.toggle_sort(field) {
            Ok(()) => ok(&req.id, view_result(desk)),
            Err(e) => desk_err(&req.id, &e),
        },
        Op::Page { page, page_size } => {
            if let Some(size) = page_size {
                desk.list.set_page_size(size);
            }
            desk.list.set_page(page);
            ok(&req.id, view_result(desk))
        }
        Op::Get(id) => match backend.with_repo(desk, |repo| repo.get(id)) {
            Ok(record) => ok(&req.id, json!({ "record": record })),
            Err(e) => desk_err(&req.id, &e),
        },
        Op::Create(raw) => {
            let item: T = match serde_json::from_value(raw.clone()) {
                Ok(v) => v,
                Err(e) => {
                    return desk_err(&req.id, &DeskError::invalid_input("record", e.to_string()))
                }
            };
            if let Err(e) = item.validate() {
                return desk_err(&req.id, &e);
            }
            match backend.with_repo(desk, |repo| repo.create(item)) {
                Ok(record) => {
                    backend.reload(desk);
                    ok(&req.id, json!({ "record": record, "view": desk.list.view() }))
                }
                Err(e) => desk_err(&req.id, &e),
            }
        }
        Op::Update(id, patch) => match backend.with_repo(desk, |repo| repo.update(id, patch)) {
            Ok(record) => {
                backend.reload(desk);
                ok(&req.id, json!({ "record": record, "view": desk.list.view() }))
            }
            Err(e) => desk_err(&req.id, &e),
        },
        Op::Delete(id) => match backend.with_repo(desk, |repo| repo.delete(id)) {
            Ok(()) => {
                backend.reload(desk);
                ok(&req.id, json!({ "deleted": id, "view": desk.list.view() }))
            }
            Err(e) => desk_err(&req.id, &e),
        },
    }
}

fn parse_op<'r>(req: &'r Request) -> Result<Op<'r>, Value> {
    let op = match req.method.as_str() {
        "lists.load" => Op::Load,
        "lists.view" => Op::View,
        "lists.search" => Op::Search(param_opt_str(req, "term").unwrap_or("")),
        "lists.sort" => Op::Sort(param_str(req, "field")?),
        "lists.page" => Op::Page {
            page: param_usize(req, "page")?,
            page_size: match req.params.get("pageSize") {
                None | Some(Value::Null) => None,
                Some(_) => Some(param_usize(req, "pageSize")?),
            },
        },
        "records.get" => Op::Get(param_str(req, "id")?),
        "records.create" => Op::Create(param_value(req, "record")?),
        "records.update" => Op::Update(param_str(req, "id")?, param_value(req, "patch")?),
        "records.delete" => Op::Delete(param_str(req, "id")?),
        _ => return Err(err(&req.id, "not_implemented", "unknown list method", None)),
    };
    Ok(op)
}

fn handle(state: &mut AppState, req: &Request) -> Value {
    let raw_kind = match param_str(req, "entity") {
        Ok(v) => v,
        Err(resp) => return resp,
    };
    let Some(kind) = EntityKind::parse(raw_kind) else {
        return err(
            &req.id,
            "bad_params",
            format!("unknown entity: {}", raw_kind),
            None,
        );
    };
    if let Err(resp) = require_screen(&state.session, req, kind.screen()) {
        return resp;
    }
    let op = match parse_op(req) {
        Ok(op) => op,
        Err(resp) => return resp,
    };

    let backend = Backend {
        data_source: &state.data_source,
    };
    let desks = &mut state.desks;
    match kind {
        EntityKind::Students => run(&mut desks.students, &backend, req, op),
        EntityKind::Employees => run(&mut desks.employees, &backend, req, op),
        EntityKind::Accounts => run(&mut desks.accounts, &backend, req, op),
        EntityKind::Enrollments => run(&mut desks.enrollments, &backend, req, op),
        EntityKind::Books => run(&mut desks.books, &backend, req, op),
        EntityKind::Users => run(&mut desks.users, &backend, req, op),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<Value> {
    if req.method.starts_with("lists.") || req.method.starts_with("records.") {
        Some(handle(state, req))
    } else {
        None
    }
}
