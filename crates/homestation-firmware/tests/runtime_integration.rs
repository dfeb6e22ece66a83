//! End-to-end tests for the firmware runtime on a simulated board.

use std::net::SocketAddr;
use std::time::Duration;

use homestation_access::{AccessOutcome, AccessState};
use homestation_core::{FirmwareVariant, StationConfig};
use homestation_firmware::Runtime;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::time::timeout;

fn config(variant: FirmwareVariant) -> StationConfig {
    let mut config = StationConfig::default();
    config.variant = variant;
    config.http.bind_addr = "127.0.0.1:0".parse().unwrap();
    config.tick_ms = 5;
    config.access.presentation_ms = 60_000;
    config
}

/// Send one request with `Connection: close` and return status and body.
async fn request(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: station\r\nConnection: close\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    );
    stream.write_all(request.as_bytes()).await.unwrap();

    let mut raw = Vec::new();
    timeout(Duration::from_secs(5), stream.read_to_end(&mut raw))
        .await
        .expect("response timeout")
        .unwrap();
    let raw = String::from_utf8(raw).unwrap();

    let status = raw.split(' ').nth(1).unwrap().parse().unwrap();
    let body = raw.split_once("\r\n\r\n").unwrap().1.to_string();
    (status, body)
}

#[tokio::test]
async fn test_runtime_serves_api() {
    let runtime = Runtime::start(&config(FirmwareVariant::Full)).await.unwrap();
    let addr = runtime.local_addr();
    let door = runtime.sensors().door.clone().unwrap();

    // Startup state: door closed at the rest angle
    assert_eq!(door.angle(), Some(0));

    let (status, body) = request(addr, "POST", "/door", "state=open").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["door_state"], true);
    assert_eq!(door.angle(), Some(90));

    runtime.sensors().climate.set(18.5, 70.0);
    runtime.store().lock().await.refresh_sensors();
    let (status, body) = request(addr, "GET", "/data", "").await;
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    assert_eq!(json["temp"], 18.5);
    assert_eq!(json["door_state"], true);

    runtime.shutdown().await.unwrap();
}

#[tokio::test]
async fn test_keypad_grants_access() {
    let runtime = Runtime::start(&config(FirmwareVariant::Full)).await.unwrap();
    let keypad = runtime.keypad().unwrap();

    keypad.press_sequence("99D1234A").await.unwrap();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let station = runtime.shutdown().await.unwrap();
    let controller = station.panel().unwrap().controller();

    assert_eq!(controller.stats().granted, 1);
    assert_eq!(controller.stats().denied, 0);
    assert_eq!(controller.last_result(), Some(AccessOutcome::Granted));
    assert!(matches!(controller.state(), AccessState::Presenting { .. }));
    assert_eq!(controller.display().render(), "ACCESS GRANTED|");
}

#[tokio::test]
async fn test_basic_variant_has_no_keypad() {
    let runtime = Runtime::start(&config(FirmwareVariant::Basic)).await.unwrap();
    assert!(runtime.keypad().is_none());

    let (status, _) = request(runtime.local_addr(), "POST", "/tender", "state=extend").await;
    assert_eq!(status, 404);

    let station = runtime.shutdown().await.unwrap();
    assert!(station.panel().is_none());
}

#[tokio::test]
async fn test_bind_conflict_fails_start() {
    let first = Runtime::start(&config(FirmwareVariant::Full)).await.unwrap();

    let mut taken = config(FirmwareVariant::Full);
    taken.http.bind_addr = first.local_addr();
    assert!(Runtime::start(&taken).await.is_err());

    first.shutdown().await.unwrap();
}
