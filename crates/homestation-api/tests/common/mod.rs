//! Shared helpers for HTTP integration tests.
//!
//! Starts a real server on a loopback port picked by the OS and speaks raw
//! HTTP/1.1 to it over a `TcpStream`.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use homestation_api::{ApiServer, Router};
use homestation_core::{FirmwareVariant, HttpConfig};
use homestation_device::{DeviceStore, SharedDeviceStore};
use homestation_hardware::mock::*;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::timeout;

/// Handles for the simulated hardware behind a test server.
pub struct Station {
    pub addr: SocketAddr,
    pub store: SharedDeviceStore,
    pub climate: MockClimateHandle,
    pub gas: MockAnalogHandle,
    pub water: MockAnalogHandle,
    pub rain: MockInputHandle,
    pub motion: MockInputHandle,
    pub led: MockOutputHandle,
    pub door: MockServoHandle,
    pub tender: MockServoHandle,
    pub shutdown: watch::Sender<bool>,
    pub server: JoinHandle<()>,
}

/// Start a server for `variant` with the matching set of devices fitted.
pub async fn start(variant: FirmwareVariant, max_connections: usize) -> Station {
    let config = HttpConfig {
        bind_addr: "127.0.0.1:0".parse().unwrap(),
        max_connections,
        ..HttpConfig::default()
    };
    start_with(variant, config).await
}

/// Start a server for `variant` with explicit listener settings.
pub async fn start_with(variant: FirmwareVariant, config: HttpConfig) -> Station {
    let (climate, climate_handle) = MockClimateSensor::new();
    let (gas, gas_handle) = MockAnalogInput::new();
    let (water, water_handle) = MockAnalogInput::new();
    let (rain, rain_handle) = MockDigitalInput::new();
    let (motion, motion_handle) = MockDigitalInput::new();
    let (led, led_handle) = MockOutputPin::new();
    let (door, door_handle) = MockServo::new();
    let (tender, tender_handle) = MockServo::new();

    let mut builder = DeviceStore::builder()
        .with_climate(climate)
        .with_gas(gas)
        .with_motion(motion)
        .with_led(led);
    if variant.has_water_sensor() {
        builder = builder.with_water(water);
    }
    if variant.has_rain_sensor() {
        builder = builder.with_rain(rain);
    }
    if variant.has_servos() {
        builder = builder.with_door(door).with_tender(tender);
    }
    let store = builder.build().unwrap().into_shared();

    let router = Router::new(store.clone(), variant);
    let server = ApiServer::bind(&config, router).await.unwrap();
    let addr = server.local_addr().unwrap();

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let handle = tokio::spawn(async move {
        server.run(shutdown_rx).await.unwrap();
    });

    Station {
        addr,
        store,
        climate: climate_handle,
        gas: gas_handle,
        water: water_handle,
        rain: rain_handle,
        motion: motion_handle,
        led: led_handle,
        door: door_handle,
        tender: tender_handle,
        shutdown: shutdown_tx,
        server: handle,
    }
}

/// A parsed response.
#[derive(Debug)]
pub struct RawResponse {
    pub status: u16,
    pub headers: Vec<(String, String)>,
    pub body: Vec<u8>,
}

impl RawResponse {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn json(&self) -> serde_json::Value {
        serde_json::from_slice(&self.body).unwrap()
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }
}

/// One client connection.
///
/// Bytes read past the end of a response stay buffered for the next one, so
/// pipelined responses that arrive in a single read are not lost.
pub struct Client {
    stream: TcpStream,
    buffer: Vec<u8>,
}

impl Client {
    pub async fn connect(addr: SocketAddr) -> Self {
        Self {
            stream: TcpStream::connect(addr).await.unwrap(),
            buffer: Vec::new(),
        }
    }

    pub async fn send(&mut self, request: &[u8]) {
        self.stream.write_all(request).await.unwrap();
    }

    /// Read more bytes into the buffer; returns how many arrived.
    async fn fill(&mut self, what: &str) -> usize {
        let mut chunk = [0u8; 1024];
        let n = timeout(Duration::from_secs(5), self.stream.read(&mut chunk))
            .await
            .unwrap_or_else(|_| panic!("{what} timeout"))
            .unwrap();
        self.buffer.extend_from_slice(&chunk[..n]);
        n
    }

    /// Read one response, using `Content-Length` for the body.
    pub async fn read_response(&mut self) -> RawResponse {
        let head_end = loop {
            if let Some(pos) = self.buffer.windows(4).position(|w| w == b"\r\n\r\n") {
                break pos + 4;
            }
            let n = self.fill("response head").await;
            assert!(n > 0, "connection closed before response head");
        };

        let head = String::from_utf8(self.buffer[..head_end].to_vec()).unwrap();
        let mut lines = head.split("\r\n");
        let status_line = lines.next().unwrap();
        let status = status_line.split(' ').nth(1).unwrap().parse().unwrap();
        let headers: Vec<(String, String)> = lines
            .filter(|line| !line.is_empty())
            .map(|line| {
                let (name, value) = line.split_once(':').unwrap();
                (name.to_string(), value.trim().to_string())
            })
            .collect();

        let length: usize = headers
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
            .map(|(_, value)| value.parse().unwrap())
            .unwrap_or(0);

        while self.buffer.len() < head_end + length {
            let n = self.fill("response body").await;
            assert!(n > 0, "connection closed before response body");
        }
        let body = self.buffer[head_end..head_end + length].to_vec();
        self.buffer.drain(..head_end + length);

        RawResponse {
            status,
            headers,
            body,
        }
    }

    /// Write raw request bytes and read one response.
    pub async fn exchange(&mut self, request: &[u8]) -> RawResponse {
        self.send(request).await;
        self.read_response().await
    }

    /// Wait for the server to close; returns the bytes sent before the close.
    pub async fn read_until_closed(&mut self) -> Vec<u8> {
        while self.fill("close").await > 0 {}
        std::mem::take(&mut self.buffer)
    }
}

/// Open a connection, send one request and return the response.
pub async fn send_once(addr: SocketAddr, request: &[u8]) -> RawResponse {
    Client::connect(addr).await.exchange(request).await
}

pub fn get(path: &str) -> Vec<u8> {
    format!("GET {path} HTTP/1.1\r\nHost: station\r\n\r\n").into_bytes()
}

pub fn post_form(path: &str, body: &str) -> Vec<u8> {
    format!(
        "POST {path} HTTP/1.1\r\nHost: station\r\n\
         Content-Type: application/x-www-form-urlencoded\r\n\
         Content-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .into_bytes()
}
