mod test_support;

use serde_json::json;
use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::time::{Duration, Instant};
use test_support::closed_port_url;

use schooldeskd::api::ApiClient;
use schooldeskd::auth::{Authenticator, RemoteAuthenticator};
use schooldeskd::datasource::{ConnectionStatus, DataMode, DataSourceSwitch, HttpHealthProbe};
use schooldeskd::entities::{Book, Student};
use schooldeskd::error::DeskError;
use schooldeskd::list::ListController;
use schooldeskd::repository::{RemoteRepository, Repository};
use schooldeskd::roles::Role;
use schooldeskd::session::Credentials;
use schooldeskd::storage::MemoryStore;

type Handler = fn(&str, &str, &str) -> (u16, String);

fn read_request(stream: &mut TcpStream) -> Option<(String, String, String)> {
    let mut reader = BufReader::new(stream.try_clone().ok()?);
    let mut request_line = String::new();
    reader.read_line(&mut request_line).ok()?;
    let mut parts = request_line.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let mut content_length = 0usize;
    loop {
        let mut header = String::new();
        reader.read_line(&mut header).ok()?;
        let header = header.trim_end();
        if header.is_empty() {
            break;
        }
        if let Some((name, value)) = header.split_once(':') {
            if name.eq_ignore_ascii_case("content-length") {
                content_length = value.trim().parse().unwrap_or(0);
            }
        }
    }
    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body).ok()?;
    Some((method, path, String::from_utf8_lossy(&body).to_string()))
}

/// Serves `handler` on a loopback port until the test process exits.
fn serve(handler: Handler) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let Some((method, path, body)) = read_request(&mut stream) else {
                continue;
            };
            let (status, payload) = handler(&method, &path, &body);
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                payload.len(),
                payload
            );
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        }
    });
    format!("http://{}", addr)
}

/// Accepts connections and holds them open without ever answering.
fn serve_silently() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let addr = listener.local_addr().expect("addr");
    std::thread::spawn(move || {
        let mut held = Vec::new();
        for stream in listener.incoming().flatten() {
            held.push(stream);
        }
    });
    format!("http://{}", addr)
}

fn healthy(_method: &str, path: &str, _body: &str) -> (u16, String) {
    if path == "/health" {
        (200, "{\"status\":\"ok\"}".into())
    } else {
        (404, "{}".into())
    }
}

fn failing(_method: &str, _path: &str, _body: &str) -> (u16, String) {
    (500, "{}".into())
}

fn school_api(method: &str, path: &str, body: &str) -> (u16, String) {
    match (method, path) {
        ("GET", "/students") => (
            200,
            json!({ "data": [
                {
                    "id": "s-1",
                    "studentNo": "2025-0001",
                    "firstName": "Remote",
                    "lastName": "Learner",
                    "gradeLevel": 8,
                    "status": "active"
                }
            ]})
            .to_string(),
        ),
        ("GET", "/books") => (
            200,
            json!([
                {
                    "id": "b-1",
                    "isbn": "978-1",
                    "title": "Remote Atlas",
                    "author": "Cartographer",
                    "category": "Reference",
                    "copiesTotal": 1,
                    "copiesAvailable": 0
                }
            ])
            .to_string(),
        ),
        ("POST", "/auth/login") => {
            let creds: serde_json::Value = serde_json::from_str(body).unwrap_or_default();
            if creds["email"] == "teacher@school.edu" && creds["password"] == "teacher123" {
                (
                    200,
                    json!({
                        "id": "remote-7",
                        "displayName": "Remote Teacher",
                        "email": "teacher@school.edu",
                        "role": "teacher"
                    })
                    .to_string(),
                )
            } else {
                (401, "{\"message\":\"bad credentials\"}".into())
            }
        }
        _ => (404, "{}".into()),
    }
}

#[test]
fn health_probe_needs_a_2xx_answer() {
    let ok_url = serve(healthy);
    let bad_url = serve(failing);
    let probe = HttpHealthProbe::new(Duration::from_secs(2)).expect("probe");
    let mut switch = DataSourceSwitch::new(Box::new(probe));
    let store = MemoryStore::new();

    assert!(switch.set_base_url(&store, &ok_url).expect("set url"));
    assert!(switch.set_mode(&store, DataMode::Real).expect("set mode"));
    assert_eq!(switch.status(), ConnectionStatus::Connected);

    assert!(!switch.set_base_url(&store, &bad_url).expect("set url"));
    assert_eq!(switch.status(), ConnectionStatus::Disconnected);

    assert!(!switch.set_base_url(&store, &closed_port_url()).expect("set url"));
    assert_eq!(switch.status(), ConnectionStatus::Disconnected);
    assert!(switch.last_checked_at().is_some());
}

#[test]
fn silent_backend_times_out_as_disconnected() {
    let url = serve_silently();
    let health = HttpHealthProbe::new(Duration::from_millis(500)).expect("health check");
    let mut switch = DataSourceSwitch::new(Box::new(health));
    let store = MemoryStore::new();
    switch.set_mode(&store, DataMode::Real).expect("set mode");

    let started = Instant::now();
    let reachable = switch.set_base_url(&store, &url).expect("set url");
    let elapsed = started.elapsed();

    assert!(!reachable);
    assert_eq!(switch.status(), ConnectionStatus::Disconnected);
    assert!(switch.last_checked_at().is_some());
    assert!(
        elapsed < Duration::from_secs(3),
        "health check took {:?}",
        elapsed
    );
}

#[test]
fn remote_repository_reads_wrapped_and_bare_lists() {
    let url = serve(school_api);
    let client = ApiClient::new(&url, Duration::from_secs(2)).expect("client");

    let students: RemoteRepository<'_, Student> = RemoteRepository::new(&client);
    let rows = students.list().expect("students");
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].last_name, "Learner");

    let books: RemoteRepository<'_, Book> = RemoteRepository::new(&client);
    let rows = books.list().expect("books");
    assert_eq!(rows[0].status(), "checkedOut");

    match students.get("missing") {
        Err(DeskError::NotFound { entity, id }) => {
            assert_eq!(entity, "students");
            assert_eq!(id, "missing");
        }
        other => panic!("expected not found, got {:?}", other.map(|s| s.id)),
    }
}

#[test]
fn list_controller_loads_through_the_remote_repository() {
    let url = serve(school_api);
    let client = ApiClient::new(&url, Duration::from_secs(2)).expect("client");
    let repo: RemoteRepository<'_, Student> = RemoteRepository::new(&client);

    let mut list = ListController::new(10);
    assert!(list.load(&repo));
    let view = list.view();
    assert_eq!(view.total, 1);
    assert!(view.error.is_none());
    assert!(!view.is_loading);
}

#[test]
fn remote_login_maps_rejection_to_invalid_credentials() {
    let url = serve(school_api);
    let client = ApiClient::new(&url, Duration::from_secs(2)).expect("client");
    let auth = RemoteAuthenticator::new(client);

    let principal = auth
        .authenticate(&Credentials::new("Teacher@School.edu", "teacher123"))
        .expect("login");
    assert_eq!(principal.role, Role::Teacher);
    assert!(!principal.must_change_password);

    let err = auth
        .authenticate(&Credentials::new("teacher@school.edu", "nope"))
        .expect_err("rejected");
    assert!(matches!(err, DeskError::InvalidCredentials));
}

#[test]
fn unreachable_backend_is_retryable() {
    let client = ApiClient::new(&closed_port_url(), Duration::from_secs(1)).expect("client");
    let repo: RemoteRepository<'_, Student> = RemoteRepository::new(&client);
    let err = repo.list().expect_err("nothing listening");
    assert!(err.is_retryable());
    assert_eq!(err.code(), "connection_unavailable");
}
