mod test_support;

use serde_json::json;
use test_support::{login, request_err_code, request_ok, spawn_sidecar, temp_dir};

#[test]
fn real_mode_without_backend_url_lists_nothing_and_stays_retryable() {
    let workspace = temp_dir("schooldesk-real-no-url");
    let (mut child, mut stdin, mut reader) = spawn_sidecar();
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "1",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    login(&mut stdin, &mut reader, "2", "admin@school.edu", "admin123");

    let set = request_ok(
        &mut stdin,
        &mut reader,
        "3",
        "dataSource.setBaseUrl",
        json!({ "baseUrl": "" }),
    );
    assert_eq!(set["dataSource"]["baseUrl"], "");
    let set = request_ok(
        &mut stdin,
        &mut reader,
        "4",
        "dataSource.setMode",
        json!({ "mode": "real" }),
    );
    assert_eq!(set["connected"], false);
    assert_eq!(set["dataSource"]["connectionStatus"], "disconnected");

    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "lists.load",
        json!({ "entity": "students" }),
    );
    let view = &loaded["view"];
    assert_eq!(view["retryable"], true);
    assert!(view["error"].is_string());
    assert_eq!(view["isLoading"], false);
    assert_eq!(view["total"], 0);
    assert_eq!(view["items"].as_array().map(|rows| rows.len()), Some(0));

    let (code, error) = request_err_code(
        &mut stdin,
        &mut reader,
        "6",
        "records.get",
        json!({ "entity": "students", "id": "stu-001" }),
    );
    assert_eq!(code, "connection_unavailable");
    assert_eq!(error["details"]["retryable"], true);

    // Back in mock mode the fixtures are served again.
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "dataSource.setMode",
        json!({ "mode": "mock" }),
    );
    let loaded = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "lists.load",
        json!({ "entity": "students" }),
    );
    assert!(loaded["view"]["total"].as_u64().unwrap_or(0) > 0);
    assert_eq!(loaded["view"]["retryable"], false);

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
