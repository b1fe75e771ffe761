//! Loopback stand-in for the Cloudflare API
//!
//! Serves scripted responses per `(method, path)` and records every request so
//! tests can assert on exactly what went over the wire.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

pub const TOKEN: &str = "test-token-abc123";

/// One request as the stub saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    /// Path including the query string
    pub target: String,
    pub authorization: Option<String>,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> serde_json::Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }
}

#[derive(Default)]
struct StubState {
    routes: HashMap<(String, String), VecDeque<(u16, String)>>,
    requests: Vec<RecordedRequest>,
}

#[derive(Clone)]
pub struct StubApi {
    addr: SocketAddr,
    state: Arc<Mutex<StubState>>,
}

impl StubApi {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let state = Arc::new(Mutex::new(StubState::default()));

        let server_state = Arc::clone(&state);
        tokio::spawn(async move {
            loop {
                let Ok((socket, _)) = listener.accept().await else {
                    break;
                };
                tokio::spawn(handle(socket, Arc::clone(&server_state)));
            }
        });

        Self { addr, state }
    }

    pub fn base_url(&self) -> String {
        format!("http://{}/client/v4", self.addr)
    }

    /// Answer `method path` (query ignored) with `status` and `body`
    ///
    /// Several responses for one route are served in order; the last one repeats.
    pub fn respond(&self, method: &str, path: &str, status: u16, body: serde_json::Value) {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry((method.to_string(), format!("/client/v4{}", path)))
            .or_default()
            .push_back((status, body.to_string()));
    }

    /// Answer with a raw, possibly non-JSON body
    pub fn respond_raw(&self, method: &str, path: &str, status: u16, body: &str) {
        self.state
            .lock()
            .unwrap()
            .routes
            .entry((method.to_string(), format!("/client/v4{}", path)))
            .or_default()
            .push_back((status, body.to_string()));
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.lock().unwrap().requests.clone()
    }
}

async fn handle(mut socket: TcpStream, state: Arc<Mutex<StubState>>) {
    let mut raw = Vec::new();
    let mut buf = [0u8; 4096];

    let header_end = loop {
        if let Some(pos) = raw.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => return,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    };

    let head = String::from_utf8_lossy(&raw[..header_end]).to_string();
    let mut lines = head.split("\r\n");
    let mut request_line = lines.next().unwrap_or_default().split(' ');
    let method = request_line.next().unwrap_or_default().to_string();
    let target = request_line.next().unwrap_or_default().to_string();

    let mut content_length = 0;
    let mut authorization = None;
    for line in lines {
        if let Some((name, value)) = line.split_once(':') {
            match name.trim().to_ascii_lowercase().as_str() {
                "content-length" => content_length = value.trim().parse().unwrap_or(0),
                "authorization" => authorization = Some(value.trim().to_string()),
                _ => {}
            }
        }
    }

    while raw.len() < header_end + content_length {
        match socket.read(&mut buf).await {
            Ok(0) | Err(_) => break,
            Ok(n) => raw.extend_from_slice(&buf[..n]),
        }
    }
    let body_end = raw.len().min(header_end + content_length);
    let body = String::from_utf8_lossy(&raw[header_end..body_end]).to_string();

    let path = target.split('?').next().unwrap_or_default().to_string();
    let (status, response_body) = {
        let mut state = state.lock().unwrap();
        state.requests.push(RecordedRequest {
            method: method.clone(),
            target: target.clone(),
            authorization,
            body,
        });

        match state.routes.get_mut(&(method, path)) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => (
                404,
                r#"{"success":false,"errors":[{"code":7003,"message":"Could not route to the requested resource"}],"result":null}"#
                    .to_string(),
            ),
        }
    };

    let response = format!(
        "HTTP/1.1 {} Stub\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        response_body.len(),
        response_body
    );
    let _ = socket.write_all(response.as_bytes()).await;
    let _ = socket.shutdown().await;
}

/// A successful envelope around `result`
pub fn ok(result: serde_json::Value) -> serde_json::Value {
    serde_json::json!({
        "success": true,
        "errors": [],
        "messages": [],
        "result": result,
    })
}

/// A failed envelope carrying one error
pub fn failed(code: u32, message: &str) -> serde_json::Value {
    serde_json::json!({
        "success": false,
        "errors": [{ "code": code, "message": message }],
        "messages": [],
        "result": null,
    })
}

/// A record as Cloudflare returns it
pub fn record_json(
    id: &str,
    name: &str,
    content: &str,
    ttl: u32,
    proxied: bool,
) -> serde_json::Value {
    serde_json::json!({
        "id": id,
        "zone_id": "zone-1",
        "zone_name": "example.com",
        "name": name,
        "type": "A",
        "content": content,
        "proxiable": true,
        "proxied": proxied,
        "ttl": ttl,
        "locked": false,
        "created_on": "2024-01-01T05:20:00.12345Z",
        "modified_on": "2024-01-01T05:20:00.12345Z",
    })
}
