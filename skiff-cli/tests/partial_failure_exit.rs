//! Drives the real binary against a local HTTP stub: the origin rejects the
//! freshness check, the hub accepts the manifest upload. The run must report
//! the failed artifact and exit non-zero without dying outright.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn respond(mut stream: TcpStream) {
    let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() || request_line.is_empty() {
        return;
    }

    let mut content_length = 0usize;
    let mut chunked = false;
    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).is_err() {
            return;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }
        let lower = line.to_ascii_lowercase();
        if let Some(value) = lower.strip_prefix("content-length:") {
            content_length = value.trim().parse().unwrap_or(0);
        }
        if lower.starts_with("transfer-encoding:") && lower.contains("chunked") {
            chunked = true;
        }
    }
    if content_length > 0 {
        let mut body = vec![0u8; content_length];
        let _ = reader.read_exact(&mut body);
    } else if chunked {
        // Drain until the chunked-body terminator so the client finishes
        // writing before we respond.
        let mut seen = Vec::new();
        let mut buf = [0u8; 1024];
        while !seen.windows(5).any(|w| w == b"0\r\n\r\n") {
            match reader.read(&mut buf) {
                Ok(0) | Err(_) => break,
                Ok(n) => seen.extend_from_slice(&buf[..n]),
            }
        }
    }

    let response: &str = if request_line.starts_with("HEAD") {
        "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    } else if request_line.starts_with("PUT") {
        "HTTP/1.1 200 OK\r\nContent-Length: 0\r\nConnection: close\r\n\r\n"
    } else {
        "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 2\r\nConnection: close\r\n\r\n[]"
    };
    let _ = stream.write_all(response.as_bytes());
}

fn spawn_stub() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub");
    let port = listener.local_addr().expect("addr").port();
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            respond(stream);
        }
    });
    port
}

#[test]
fn failed_artifact_yields_nonzero_exit_and_summary() {
    let port = spawn_stub();
    let home = TempDir::new().unwrap();
    let dir = home.path().join(".skiff");
    std::fs::create_dir_all(&dir).unwrap();
    std::fs::write(
        dir.join("config.yaml"),
        format!(
            r#"store:
  endpoint: http://127.0.0.1:{port}
  repo: archive/test
artifacts:
  - name: works.txt.gz
    url: http://127.0.0.1:{port}/works.txt.gz
    repo_path: works.txt.gz
"#
        ),
    )
    .unwrap();

    Command::cargo_bin("skiff")
        .unwrap()
        .env("HOME", home.path())
        .env("USERPROFILE", home.path())
        .args(["sync", "--all"])
        .assert()
        .code(1)
        .stdout(predicate::str::contains("failed while checking"))
        .stdout(predicate::str::contains("Failed artifacts: works.txt.gz"));

    // The run itself completed: the (empty) manifest was still persisted.
    assert!(dir.join("manifest.json").exists());
}
