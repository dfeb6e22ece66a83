//! Integration tests for ApiServer
//!
//! These tests drive a real loopback server with raw HTTP/1.1 requests and
//! check responses against the simulated hardware.

mod common;

use std::time::Duration;

use common::{Client, get, post_form, send_once, start, start_with};
use homestation_core::{FirmwareVariant, HttpConfig};
use serde_json::json;
use tokio::net::TcpStream;
use tokio::time::timeout;

#[tokio::test]
async fn test_data_reports_full_snapshot() {
    let station = start(FirmwareVariant::Full, 4).await;
    station.climate.set(25.5, 60.0);
    station.gas.set_raw(4095);
    station.rain.set_high(false);
    station.motion.set_high(true);

    let response = send_once(station.addr, &get("/data")).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.header("content-type"), Some("application/json"));
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        response.json(),
        json!({
            "temp": 25.5,
            "hum": 60.0,
            "gas": 1000,
            "rain": true,
            "motion": true,
            "led_state": false,
            "door_state": false,
            "tender_state": false,
        })
    );
}

#[tokio::test]
async fn test_basic_variant_reports_water() {
    let station = start(FirmwareVariant::Basic, 4).await;
    station.water.set_raw(4095);

    let json = send_once(station.addr, &get("/data")).await.json();
    let mut keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
    keys.sort();

    assert_eq!(keys, ["gas", "hum", "led_state", "motion", "temp", "water"]);
    assert_eq!(json["water"], 0);
}

#[tokio::test]
async fn test_led_command_round_trip() {
    let station = start(FirmwareVariant::Full, 4).await;

    let response = send_once(station.addr, &post_form("/led", "state=on")).await;
    assert_eq!(response.status, 200);
    assert_eq!(response.json(), json!({"success": true, "led_state": true}));
    assert!(station.led.is_high());

    let data = send_once(station.addr, &get("/data")).await.json();
    assert_eq!(data["led_state"], true);
}

#[tokio::test]
async fn test_led_without_state_is_rejected() {
    let station = start(FirmwareVariant::Full, 4).await;

    let request = b"POST /led HTTP/1.1\r\nHost: station\r\nContent-Length: 0\r\n\r\n";
    let response = send_once(station.addr, request).await;

    assert_eq!(response.status, 400);
    assert_eq!(response.header("content-type"), Some("text/plain"));
    assert!(response.text().contains("state"));
    assert!(!station.store.lock().await.snapshot().led_on);
}

#[tokio::test]
async fn test_door_open_shows_in_data() {
    let station = start(FirmwareVariant::Full, 4).await;

    let response = send_once(station.addr, &post_form("/door", "state=open")).await;
    assert_eq!(response.json(), json!({"success": true, "door_state": true}));
    assert_eq!(station.door.angle(), Some(90));

    let data = send_once(station.addr, &get("/data")).await.json();
    assert_eq!(data["door_state"], true);
}

#[tokio::test]
async fn test_tender_extend_and_retract() {
    let station = start(FirmwareVariant::Full, 4).await;
    let mut client = Client::connect(station.addr).await;

    let response = client.exchange(&post_form("/tender", "state=extend")).await;
    assert_eq!(response.json()["tender_state"], true);
    assert_eq!(station.tender.angle(), Some(90));

    let response = client.exchange(&post_form("/tender", "state=retract")).await;
    assert_eq!(response.json()["tender_state"], false);
    assert_eq!(station.tender.angle(), Some(0));
}

#[tokio::test]
async fn test_multipart_command_from_browser_form() {
    let station = start(FirmwareVariant::Full, 4).await;

    let body = "--XX\r\n\
                Content-Disposition: form-data; name=\"state\"\r\n\
                \r\n\
                on\r\n\
                --XX--\r\n";
    let request = format!(
        "POST /led HTTP/1.1\r\nHost: station\r\n\
         Content-Type: multipart/form-data; boundary=XX\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    );
    let response = send_once(station.addr, request.as_bytes()).await;

    assert_eq!(response.status, 200);
    assert_eq!(response.json(), json!({"success": true, "led_state": true}));
    assert!(station.led.is_high());
}

#[tokio::test]
async fn test_door_on_basic_variant_is_not_found() {
    let station = start(FirmwareVariant::Basic, 4).await;

    let response = send_once(station.addr, &post_form("/door", "state=open")).await;
    assert_eq!(response.status, 404);
}

#[tokio::test]
async fn test_options_preflight() {
    let station = start(FirmwareVariant::Full, 4).await;

    let request = b"OPTIONS /data HTTP/1.1\r\nHost: station\r\n\r\n";
    let response = send_once(station.addr, request).await;

    assert_eq!(response.status, 204);
    assert_eq!(response.header("access-control-allow-origin"), Some("*"));
    assert_eq!(
        response.header("access-control-allow-methods"),
        Some("GET, POST, OPTIONS")
    );
    assert_eq!(
        response.header("access-control-allow-headers"),
        Some("Content-Type")
    );
}

#[tokio::test]
async fn test_keep_alive_serves_sequential_requests() {
    let station = start(FirmwareVariant::Full, 4).await;
    let mut client = Client::connect(station.addr).await;

    for _ in 0..3 {
        let response = client.exchange(&get("/data")).await;
        assert_eq!(response.status, 200);
        assert_eq!(response.header("connection"), None);
    }
}

#[tokio::test]
async fn test_pipelined_requests_answer_in_order() {
    let station = start(FirmwareVariant::Full, 4).await;
    let mut client = Client::connect(station.addr).await;

    let mut requests = post_form("/led", "state=1");
    requests.extend_from_slice(&get("/nowhere"));
    requests.extend_from_slice(&get("/data"));
    client.send(&requests).await;

    assert_eq!(client.read_response().await.status, 200);
    assert_eq!(client.read_response().await.status, 404);
    let data = client.read_response().await;
    assert_eq!(data.status, 200);
    assert_eq!(data.json()["led_state"], true);
}

#[tokio::test]
async fn test_connection_close_is_honoured() {
    let station = start(FirmwareVariant::Full, 4).await;
    let mut client = Client::connect(station.addr).await;

    let request = b"GET /data HTTP/1.1\r\nHost: station\r\nConnection: close\r\n\r\n";
    let response = client.exchange(request).await;
    assert_eq!(response.header("connection"), Some("close"));
    assert!(client.read_until_closed().await.is_empty());
}

#[tokio::test]
async fn test_malformed_request_closes_connection() {
    let station = start(FirmwareVariant::Full, 4).await;
    let mut client = Client::connect(station.addr).await;

    let response = client.exchange(b"NONSENSE\r\n\r\n").await;
    assert_eq!(response.status, 400);
    assert_eq!(response.header("connection"), Some("close"));
}

#[tokio::test]
async fn test_chunked_request_is_not_implemented() {
    let station = start(FirmwareVariant::Full, 4).await;

    let request = b"POST /led HTTP/1.1\r\nTransfer-Encoding: chunked\r\n\r\n";
    let response = send_once(station.addr, request).await;
    assert_eq!(response.status, 501);
}

#[tokio::test]
async fn test_oversized_body_is_rejected() {
    let station = start(FirmwareVariant::Full, 4).await;

    let request = b"POST /led HTTP/1.1\r\nContent-Length: 1048576\r\n\r\n";
    let response = send_once(station.addr, request).await;
    assert_eq!(response.status, 413);
}

#[tokio::test]
async fn test_servo_fault_is_server_error() {
    let station = start(FirmwareVariant::Full, 4).await;
    station.door.set_faulted(true);

    let response = send_once(station.addr, &post_form("/door", "state=open")).await;
    assert_eq!(response.status, 500);

    let data = send_once(station.addr, &get("/data")).await.json();
    assert_eq!(data["door_state"], false);
}

#[tokio::test]
async fn test_concurrent_clients() {
    let station = start(FirmwareVariant::Full, 8).await;
    let addr = station.addr;

    let tasks: Vec<_> = (0..5)
        .map(|i| {
            tokio::spawn(async move {
                let body = if i % 2 == 0 { "state=on" } else { "state=off" };
                send_once(addr, &post_form("/led", body)).await.status
            })
        })
        .collect();

    for task in tasks {
        assert_eq!(task.await.unwrap(), 200);
    }
}

fn limited(max_connections: usize, idle_timeout_ms: u64) -> HttpConfig {
    HttpConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_connections,
        idle_timeout_ms,
        ..HttpConfig::default()
    }
}

#[tokio::test]
async fn test_idle_connection_is_closed() {
    let station = start_with(FirmwareVariant::Full, limited(4, 200)).await;
    let mut client = Client::connect(station.addr).await;

    assert_eq!(client.exchange(&get("/data")).await.status, 200);
    let rest = timeout(Duration::from_secs(5), client.read_until_closed())
        .await
        .expect("idle connection was not closed");
    assert!(rest.is_empty());
}

#[tokio::test]
async fn test_idle_connections_release_their_slots() {
    let station = start_with(FirmwareVariant::Full, limited(2, 200)).await;

    // Two clients that connect and never send anything
    let _idle_a = TcpStream::connect(station.addr).await.unwrap();
    let _idle_b = TcpStream::connect(station.addr).await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    let response = send_once(station.addr, &get("/data")).await;
    assert_eq!(response.status, 200);
}

#[tokio::test]
async fn test_connection_over_cap_gets_503() {
    let station = start_with(FirmwareVariant::Full, limited(1, 5_000)).await;

    // Holds the only slot
    let mut first = Client::connect(station.addr).await;
    assert_eq!(first.exchange(&get("/data")).await.status, 200);

    let mut second = Client::connect(station.addr).await;
    let response = second.exchange(&get("/data")).await;
    assert_eq!(response.status, 503);
    assert_eq!(response.header("connection"), Some("close"));
    assert_eq!(response.header("retry-after"), Some("1"));

    // The first connection is still served
    assert_eq!(first.exchange(&get("/data")).await.status, 200);
}

#[tokio::test]
async fn test_head_is_not_allowed() {
    let station = start(FirmwareVariant::Full, 4).await;

    let request = b"HEAD /data HTTP/1.1\r\nHost: station\r\n\r\n";
    let response = send_once(station.addr, request).await;
    assert_eq!(response.status, 405);
    assert_eq!(response.header("allow"), Some("GET, OPTIONS"));
}

#[tokio::test]
async fn test_shutdown_stops_server() {
    let station = start(FirmwareVariant::Full, 4).await;

    station.shutdown.send(true).unwrap();
    timeout(Duration::from_secs(5), station.server)
        .await
        .expect("server did not stop")
        .unwrap();

    // Listener is dropped once run() returns
    assert!(TcpStream::connect(station.addr).await.is_err());
}
