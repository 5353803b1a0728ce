//! End-to-end tests: a real listener on a loopback port, raw HTTP requests,
//! and a registry written to while the server runs.

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::Arc;
use std::thread;

use rill::Registry;
use rill_server::{Datasource, api};
use serde_json::{Value, json};

/// 2017-10-25T11:16:54Z
const T1_NS: u64 = 1_508_930_214_000_000_000;
const MINUTE_NS: u64 = 60_000_000_000;

fn start_server(registry: Arc<Registry>) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    thread::spawn(move || api::serve(listener, Datasource::new(registry)));
    addr
}

/// Sends one request and returns `(status, body)`.
fn send(addr: SocketAddr, method: &str, path: &str, body: &str) -> (u16, String) {
    let mut stream = TcpStream::connect(addr).unwrap();
    write!(
        stream,
        "{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\r\n{body}",
        body.len()
    )
    .unwrap();

    let mut raw = String::new();
    stream.read_to_string(&mut raw).unwrap();

    let (head, body) = raw.split_once("\r\n\r\n").unwrap();
    let status = head.split_whitespace().nth(1).unwrap().parse().unwrap();
    (status, body.to_string())
}

fn query_body(targets: &[&str], max_points: i64) -> String {
    json!({
        "panelId": 1,
        "range": {
            "from": "2017-10-25T11:15:54.000Z",
            "to": "2017-10-25T11:20:54.000Z",
            "raw": {"from": "now-5m", "to": "now"}
        },
        "interval": "1s",
        "intervalMs": 1000,
        "targets": targets.iter().map(|t| json!({"target": t, "refId": "A", "type": "timeserie"})).collect::<Vec<_>>(),
        "format": "json",
        "maxDataPoints": max_points
    })
    .to_string()
}

#[test]
fn test_connection_check() {
    let addr = start_server(Arc::new(Registry::new()));

    let (status, body) = send(addr, "GET", "/", "");
    assert_eq!(status, 200);
    assert!(body.is_empty());
}

#[test]
fn test_search_lists_series() {
    let registry = Arc::new(Registry::new());
    registry.create("mem", 2).unwrap();
    registry.create("cpu", 2).unwrap();
    let addr = start_server(Arc::clone(&registry));

    let (status, body) = send(addr, "POST", "/search", r#"{"target": ""}"#);
    assert_eq!(status, 200);
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!(["cpu", "mem"]));

    // Series registered after startup show up too.
    registry.create("disk", 2).unwrap();
    let (_, body) = send(addr, "POST", "/search", "");
    assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!(["cpu", "disk", "mem"]));
}

#[test]
fn test_query_returns_decimated_datapoints() {
    let registry = Arc::new(Registry::new());
    let cpu = registry.create("cpu", 10).unwrap();
    for i in 0..4u64 {
        cpu.append_at(i as f64, T1_NS + i * MINUTE_NS);
    }
    let addr = start_server(registry);

    let (status, body) = send(addr, "POST", "/query", &query_body(&["cpu"], 2));
    assert_eq!(status, 200);

    let t1_ms = T1_NS / 1_000_000;
    assert_eq!(
        serde_json::from_str::<Value>(&body).unwrap(),
        json!([{"target": "cpu", "datapoints": [[0.0, t1_ms], [2.0, t1_ms + 120_000]]}])
    );
}

#[test]
fn test_query_multiple_targets() {
    let registry = Arc::new(Registry::new());
    registry.create("a", 4).unwrap().append_at(1.0, T1_NS);
    registry.create("b", 4).unwrap();
    let addr = start_server(registry);

    let (status, body) = send(addr, "POST", "/query", &query_body(&["a", "b"], 100));
    assert_eq!(status, 200);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value[0]["target"], "a");
    assert_eq!(value[0]["datapoints"].as_array().unwrap().len(), 1);
    assert_eq!(value[1]["target"], "b");
    assert_eq!(value[1]["datapoints"], json!([]));
}

#[test]
fn test_query_unknown_series_is_bad_request() {
    let addr = start_server(Arc::new(Registry::new()));

    let (status, body) = send(addr, "POST", "/query", &query_body(&["ghost"], 10));
    assert_eq!(status, 400);
    let value: Value = serde_json::from_str(&body).unwrap();
    assert!(value["error"].as_str().unwrap().contains("ghost"));
}

#[test]
fn test_unknown_route() {
    let addr = start_server(Arc::new(Registry::new()));

    let (status, _) = send(addr, "GET", "/nowhere", "");
    assert_eq!(status, 404);
}

#[test]
fn test_series_stats_endpoint() {
    let registry = Arc::new(Registry::new());
    let cpu = registry.create("cpu", 3).unwrap();
    cpu.append_at(1.0, T1_NS);
    cpu.append_at(2.0, T1_NS + MINUTE_NS);
    let addr = start_server(registry);

    let (status, body) = send(addr, "GET", "/series", "");
    assert_eq!(status, 200);

    let value: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(value[0]["name"], "cpu");
    assert_eq!(value[0]["len"], 2);
    assert_eq!(value[0]["capacity"], 3);
    assert_eq!(value[0]["oldest_ms"], T1_NS / 1_000_000);
    assert_eq!(value[0]["sort_pending"], true);
}

#[test]
fn test_concurrent_clients_while_writing() {
    let registry = Arc::new(Registry::new());
    let cpu = registry.create("cpu", 1000).unwrap();
    let addr = start_server(Arc::clone(&registry));

    let writer = thread::spawn(move || {
        for i in 0..2_000u64 {
            cpu.append_at(i as f64, T1_NS + i * 1_000_000);
        }
    });

    let clients: Vec<_> = (0..4)
        .map(|_| {
            thread::spawn(move || {
                for _ in 0..10 {
                    let (status, body) = send(addr, "POST", "/query", &query_body(&["cpu"], 50));
                    assert_eq!(status, 200);
                    let value: Value = serde_json::from_str(&body).unwrap();
                    assert!(value[0]["datapoints"].as_array().unwrap().len() <= 50);
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for client in clients {
        client.join().unwrap();
    }
}
