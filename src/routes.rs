use serde::Serialize;

use crate::roles::{Role, RoleRequirement, RoleSet};

pub const LOGIN_PATH: &str = "/login";
pub const CHANGE_PASSWORD_PATH: &str = "/change-password";
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";
pub const DEFAULT_PATH: &str = "/dashboard";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Screen {
    Dashboard,
    Students,
    Enrollment,
    Accounts,
    Employees,
    Library,
    Users,
    Settings,
    Calendar,
    ChangePassword,
}

/// A guarded navigation target.
#[derive(Debug, Clone, Copy, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    pub screen: Screen,
    pub path: &'static str,
    pub title: &'static str,
    pub requires: RoleRequirement,
    /// Reachable while a forced password change is pending.
    pub password_change_exempt: bool,
}

const fn route(
    screen: Screen,
    path: &'static str,
    title: &'static str,
    requires: RoleSet,
) -> Route {
    Route {
        screen,
        path,
        title,
        requires,
        password_change_exempt: false,
    }
}

impl Screen {
    pub const ALL: [Screen; 10] = [
        Screen::Dashboard,
        Screen::Students,
        Screen::Enrollment,
        Screen::Accounts,
        Screen::Employees,
        Screen::Library,
        Screen::Users,
        Screen::Settings,
        Screen::Calendar,
        Screen::ChangePassword,
    ];
}

pub fn route_for(screen: Screen) -> Route {
    use Role::*;
    let everyone = RoleSet::all();
    match screen {
        Screen::Dashboard => route(screen, DEFAULT_PATH, "Dashboard", everyone),
        Screen::Students => route(
            screen,
            "/students",
            "Students",
            RoleSet::of(&[Admin, Registrar, Teacher]),
        ),
        Screen::Enrollment => route(
            screen,
            "/enrollment",
            "Enrollment",
            RoleSet::of(&[Admin, Registrar]),
        ),
        Screen::Accounts => route(
            screen,
            "/accounts",
            "Accounts",
            RoleSet::of(&[Admin, Cashier]),
        ),
        Screen::Employees => route(screen, "/employees", "Employees", RoleSet::of(&[Admin])),
        Screen::Library => route(
            screen,
            "/library",
            "Library",
            RoleSet::of(&[Admin, Librarian, Teacher, Student]),
        ),
        Screen::Users => route(screen, "/users", "Users", RoleSet::of(&[Admin])),
        Screen::Settings => route(screen, "/settings", "Settings", RoleSet::of(&[Admin])),
        Screen::Calendar => route(screen, "/calendar", "Calendar", everyone),
        Screen::ChangePassword => Route {
            password_change_exempt: true,
            ..route(screen, CHANGE_PASSWORD_PATH, "Change password", everyone)
        },
    }
}

pub fn route_table() -> Vec<Route> {
    Screen::ALL.into_iter().map(route_for).collect()
}

pub fn find_route(path: &str) -> Option<Route> {
    let norm = normalize_path(path);
    route_table().into_iter().find(|r| r.path == norm)
}

/// Pages reachable without a session.
pub fn is_public(path: &str) -> bool {
    matches!(normalize_path(path).as_str(), LOGIN_PATH | UNAUTHORIZED_PATH)
}

fn normalize_path(path: &str) -> String {
    let p = path.trim().split(['?', '#']).next().unwrap_or("");
    let p = p.trim_end_matches('/');
    if p.is_empty() {
        return DEFAULT_PATH.to_string();
    }
    if p.starts_with('/') {
        p.to_ascii_lowercase()
    } else {
        format!("/{}", p.to_ascii_lowercase())
    }
}
