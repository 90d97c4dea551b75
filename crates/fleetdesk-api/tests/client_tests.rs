// Copyright 2026 Phillip Cloud
// Licensed under the Apache License, Version 2.0

use anyhow::{Result, anyhow};
use fleetdesk_api::Client;
use fleetdesk_app::{FieldEdit, FormPayload, InspectionFormInput, Page, RepairRow, Section};
use std::io::{Read as _, Write};
use std::net::TcpListener;
use std::thread;
use std::time::Duration;
use tiny_http::{Header, Method, Response, Server};

fn json_response(status: u16, body: &str) -> Response<std::io::Cursor<Vec<u8>>> {
    Response::from_string(body)
        .with_status_code(status)
        .with_header(
            Header::from_bytes("Content-Type", "application/json")
                .expect("valid content type header"),
        )
}

#[test]
fn unreachable_server_error_is_actionable() {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))
        .expect("client should initialize");

    let error = client
        .fetch_page::<RepairRow>(Section::Repairs, 0, 50, "")
        .expect_err("fetch should fail for unreachable endpoint");
    let message = error.to_string();
    assert!(message.contains("127.0.0.1:1"), "{message}");
}

#[test]
fn fetch_page_sends_paging_params() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.method(), &Method::Get);
        assert_eq!(
            request.url(),
            "/api/fleet?section=repairs&skip=50&limit=50&q=alt"
        );
        let body = r#"{"repairs":[{"_id":"r51","vehicle":"VAN-9","description":"Alternator"}],"total":51,"hasMore":false}"#;
        request
            .respond(json_response(200, body))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let page: Page<RepairRow> = client.fetch_page(Section::Repairs, 50, 50, "alt")?;
    assert_eq!(page.rows.len(), 1);
    assert_eq!(page.rows[0].id, "r51");
    assert_eq!(page.total, 51);
    assert!(!page.has_more);

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn missing_rows_key_is_malformed_not_error() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        assert_eq!(request.url(), "/api/fleet?section=repairs&skip=0&limit=50");
        request
            .respond(json_response(200, r#"{"inspections":[],"total":0}"#))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let page: Page<RepairRow> = client.fetch_page(Section::Repairs, 0, 50, "")?;
    assert!(page.malformed);
    assert!(page.rows.is_empty());

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn truncated_success_body_is_a_transport_error() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0")?;
    let addr = format!("http://{}", listener.local_addr()?);

    let handle = thread::spawn(move || {
        let (mut stream, _) = listener.accept().expect("connection expected");
        let mut request = [0_u8; 1024];
        let _ = stream.read(&mut request).expect("request should read");
        stream
            .write_all(
                b"HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: 4000\r\n\r\n{\"repairs\":[",
            )
            .expect("partial response should write");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let result = client.fetch_page::<RepairRow>(Section::Repairs, 0, 50, "");
    handle.join().expect("server thread should join");

    let error = result.expect_err("cut-off body should fail, not parse as malformed");
    assert!(format!("{error:#}").contains("read fleet response body"));
    Ok(())
}

#[test]
fn non_success_status_surfaces_server_message() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let request = server.recv().expect("request expected");
        request
            .respond(json_response(503, r#"{"error":"database unavailable"}"#))
            .expect("response should succeed");
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let error = client
        .fetch_page::<RepairRow>(Section::Repairs, 0, 50, "")
        .expect_err("503 should fail");
    assert_eq!(error.to_string(), "server error (503): database unavailable");

    handle.join().expect("server thread should join");
    Ok(())
}

#[test]
fn write_path_uses_put_post_and_delete() -> Result<()> {
    let server =
        Server::http("127.0.0.1:0").map_err(|error| anyhow!("start mock server: {error}"))?;
    let addr = format!("http://{}", server.server_addr());

    let handle = thread::spawn(move || {
        let mut seen = Vec::new();
        for _ in 0..3 {
            let mut request = server.recv().expect("request expected");
            let mut body = String::new();
            request
                .as_reader()
                .read_to_string(&mut body)
                .expect("body should read");
            seen.push((request.method().clone(), request.url().to_owned(), body));
            request
                .respond(json_response(200, r#"{"ok":true}"#))
                .expect("response should succeed");
        }
        seen
    });

    let client = Client::new(&addr, Duration::from_secs(1))?;
    let edit = FieldEdit::new(Section::Repairs, "r7", "cost", "99.5")?;
    client.update(&edit)?;

    let form = InspectionFormInput {
        vehicle: "TRK-12".to_owned(),
        inspector: "Avery Walker".to_owned(),
        result: "pass".to_owned(),
        odometer: Some(120_400.0),
        inspected_at: time::macros::date!(2026-04-01),
        notes: String::new(),
    };
    client.create(&FormPayload::Inspection(form))?;
    client.delete(Section::Inspections, "i3")?;

    let seen = handle.join().expect("server thread should join");

    let (method, url, body) = &seen[0];
    assert_eq!(method, &Method::Put);
    assert_eq!(url, "/api/fleet");
    let body: serde_json::Value = serde_json::from_str(body)?;
    assert_eq!(
        body,
        serde_json::json!({"type": "repair", "id": "r7", "data": {"cost": 99.5}})
    );

    let (method, url, body) = &seen[1];
    assert_eq!(method, &Method::Post);
    assert_eq!(url, "/api/fleet");
    let body: serde_json::Value = serde_json::from_str(body)?;
    assert_eq!(body["type"], "inspection");
    assert_eq!(body["data"]["inspectedAt"], "2026-04-01");
    assert!(body["data"].get("notes").is_none());

    let (method, url, _) = &seen[2];
    assert_eq!(method, &Method::Delete);
    assert_eq!(url, "/api/fleet?type=inspection&id=i3");
    Ok(())
}

#[test]
fn create_validates_before_sending() -> Result<()> {
    let client = Client::new("http://127.0.0.1:1", Duration::from_millis(50))?;
    let form = InspectionFormInput {
        vehicle: String::new(),
        inspector: String::new(),
        result: "pass".to_owned(),
        odometer: None,
        inspected_at: time::macros::date!(2026-04-01),
        notes: String::new(),
    };
    let error = client
        .create(&FormPayload::Inspection(form))
        .expect_err("invalid form should fail");
    assert!(error.to_string().contains("vehicle is required"));
    Ok(())
}
