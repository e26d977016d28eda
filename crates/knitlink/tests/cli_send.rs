#![cfg(feature = "cli")]

use std::process::Command;

use knitlink::transport::{split_stream, Transport, TransportEvent, Unit};
use tokio::net::TcpListener;
use tokio_tungstenite::accept_async;

/// Accepts one connection and answers the first text unit with `reply`.
async fn one_shot_controller(
    reply: &'static str,
) -> (String, tokio::task::JoinHandle<Option<Unit>>) {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let handle = tokio::spawn(async move {
        let (tcp, _) = listener.accept().await.unwrap();
        let (mut tx, mut rx) = split_stream(accept_async(tcp).await.unwrap());
        let mut request = None;
        while let Some(event) = rx.next_event().await {
            match event {
                TransportEvent::Unit(unit @ Unit::Text(_)) => {
                    tx.send(Unit::text(reply)).unwrap();
                    request = Some(unit);
                }
                TransportEvent::Closed { .. } | TransportEvent::Error(_) => break,
                _ => {}
            }
        }
        request
    });

    (format!("ws://{addr}/ws"), handle)
}

async fn run_cli(args: Vec<String>) -> std::process::Output {
    tokio::task::spawn_blocking(move || {
        Command::new(env!("CARGO_BIN_EXE_knitlink"))
            .args(["--log-level", "error", "--format", "json"])
            .args(args)
            .output()
            .unwrap()
    })
    .await
    .unwrap()
}

#[tokio::test]
async fn send_list_files_prints_reply() {
    let (url, controller) = one_shot_controller(
        r#"{"id":160,"data":{"list_files":[{"name":"a.png","size":10,"url":"/a.png"}]}}"#,
    )
    .await;

    let output = run_cli(vec!["send".into(), "list-files".into(), "--url".into(), url]).await;

    assert!(
        output.status.success(),
        "{}",
        String::from_utf8_lossy(&output.stderr)
    );
    let line: serde_json::Value =
        serde_json::from_str(String::from_utf8_lossy(&output.stdout).trim()).unwrap();
    assert_eq!(line["name"], "list-files reply");
    assert_eq!(line["detail"]["data"]["list_files"][0]["name"], "a.png");

    assert_eq!(controller.await.unwrap(), Some(Unit::text(r#"{"id":32}"#)));
}

#[tokio::test]
async fn send_reports_failed_result() {
    let (url, _controller) = one_shot_controller(r#"{"id":161,"result":-1}"#).await;

    let output = run_cli(vec![
        "send".into(),
        "delete-files".into(),
        "--file".into(),
        "/a.png".into(),
        "--url".into(),
        url,
    ])
    .await;

    assert_eq!(output.status.code(), Some(1));
    assert!(String::from_utf8_lossy(&output.stderr).contains("result -1"));
}
