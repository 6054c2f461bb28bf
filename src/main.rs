use std::io::{self, BufRead, Write};

use schooldeskd::config::{DaemonConfig, ENV_LOG};
use schooldeskd::datasource::HttpHealthProbe;
use schooldeskd::ipc;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

fn init_tracing() {
    // stdout carries IPC responses, so logs go to stderr.
    let filter = EnvFilter::try_from_env(ENV_LOG)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_ansi(false)
        .init();
}

fn main() {
    init_tracing();

    let config = DaemonConfig::from_env();
    let probe = match HttpHealthProbe::new(config.probe_timeout) {
        Ok(p) => p,
        Err(e) => {
            error!(error = %e, "cannot build health probe client");
            std::process::exit(1);
        }
    };
    let workspace = config.workspace.clone();
    let mut state = ipc::AppState::new(config, Box::new(probe));

    if let Some(path) = workspace {
        if let Err(e) = ipc::open_workspace(&mut state, &path) {
            error!(error = ?e, workspace = %path.to_string_lossy(), "cannot open workspace");
        }
    }
    info!(version = env!("CARGO_PKG_VERSION"), "schooldeskd ready");

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(_) => break,
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // Can't reply without id.
                let resp = serde_json::json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", resp);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }
}
