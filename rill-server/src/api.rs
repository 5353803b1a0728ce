//! Minimal HTTP/1.1 server for the SimpleJSON data source.
//!
//! Uses `std::net::TcpListener` with one short-lived thread per connection;
//! every response closes the connection. Endpoints:
//!
//! - `GET /`                — connection test, empty `200`
//! - `POST /search`         — series names (JSON array)
//! - `POST /query`          — datapoints for the requested targets
//! - `POST /annotations`    — always `[]`
//! - `GET /series`          — per-series buffer stats

use std::io::{BufRead, BufReader, Read, Write};
use std::net::{TcpListener, TcpStream};
use std::thread;
use std::time::Duration;

use crate::error::{ApiError, Result};
use crate::grafana::{Datasource, QueryRequest};

/// Largest request body accepted.
const MAX_BODY_BYTES: usize = 1 << 20;

/// Largest request line plus headers accepted.
const MAX_HEADER_BYTES: u64 = 8 << 10;

/// Slow clients are dropped after this long without sending anything.
const READ_TIMEOUT: Duration = Duration::from_secs(5);

/// A parsed request: only what routing needs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    /// Upper-case method, e.g. `POST`.
    pub method: String,
    /// Path without the query string.
    pub path: String,
    /// Raw body bytes.
    pub body: Vec<u8>,
}

/// A response ready to be written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Response {
    /// HTTP status code.
    pub status: u16,
    /// JSON body, possibly empty.
    pub body: String,
}

impl Response {
    fn ok(body: String) -> Self {
        Self { status: 200, body }
    }

    fn json<T: serde::Serialize>(value: &T) -> Result<Self> {
        Ok(Self::ok(serde_json::to_string(value)?))
    }

    fn error(err: &ApiError) -> Self {
        Self {
            status: err.status(),
            body: err.to_json(),
        }
    }
}

/// Accepts connections forever, serving each on its own thread.
///
/// There is no connection limit: every accepted client gets a thread until
/// its request completes or the 5 s read timeout expires.
pub fn serve(listener: TcpListener, datasource: Datasource) {
    for stream in listener.incoming() {
        let stream = match stream {
            Ok(s) => s,
            Err(e) => {
                tracing::warn!("accept error: {e}");
                continue;
            }
        };

        let datasource = datasource.clone();
        thread::spawn(move || {
            if let Err(e) = handle_connection(&stream, &datasource) {
                tracing::debug!("request error: {e}");
            }
        });
    }
}

/// Binds `addr` and serves until the process exits.
///
/// # Errors
///
/// Returns the bind error if the address is unavailable.
pub fn run_api_server(addr: &str, datasource: Datasource) -> std::io::Result<()> {
    let listener = TcpListener::bind(addr)?;
    tracing::info!("serving dashboard queries on {}", listener.local_addr()?);
    serve(listener, datasource);
    Ok(())
}

fn handle_connection(stream: &TcpStream, datasource: &Datasource) -> Result<()> {
    stream.set_read_timeout(Some(READ_TIMEOUT))?;

    let response = match read_request(&mut BufReader::new(stream)) {
        Ok(request) => {
            tracing::debug!(method = %request.method, path = %request.path, "request");
            route(datasource, &request)
        }
        Err(ApiError::Io(e)) => return Err(ApiError::Io(e)),
        Err(e) => Response::error(&e),
    };

    write_response(stream, &response)?;
    Ok(())
}

/// Reads one request: request line, headers, and a `Content-Length` body.
///
/// # Errors
///
/// - [`ApiError::BadRequest`] for a malformed request line or header, or an
///   oversized header section or body
/// - [`ApiError::Io`] if the socket fails or closes early
pub fn read_request<R: BufRead>(reader: &mut R) -> Result<Request> {
    let mut head = reader.by_ref().take(MAX_HEADER_BYTES);

    let mut request_line = String::new();
    head.read_line(&mut request_line)?;

    // "POST /query HTTP/1.1"
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target)) = (parts.next(), parts.next()) else {
        return Err(ApiError::BadRequest {
            reason: format!("malformed request line {:?}", request_line.trim_end()),
        });
    };
    let method = method.to_ascii_uppercase();
    let path = target.split_once('?').map_or(target, |(p, _)| p).to_string();

    let mut content_length = 0usize;
    loop {
        let mut line = String::new();
        if head.read_line(&mut line)? == 0 {
            if head.limit() == 0 {
                return Err(ApiError::BadRequest {
                    reason: format!("headers exceed {MAX_HEADER_BYTES} bytes"),
                });
            }
            break;
        }
        let line = line.trim_end();
        if line.is_empty() {
            break;
        }

        let Some((name, value)) = line.split_once(':') else {
            return Err(ApiError::BadRequest {
                reason: format!("malformed header {line:?}"),
            });
        };
        if name.trim().eq_ignore_ascii_case("content-length") {
            content_length = value.trim().parse().map_err(|_| ApiError::BadRequest {
                reason: format!("invalid content-length {:?}", value.trim()),
            })?;
        }
    }

    if content_length > MAX_BODY_BYTES {
        return Err(ApiError::BadRequest {
            reason: format!("body of {content_length} bytes exceeds {MAX_BODY_BYTES}"),
        });
    }

    let mut body = vec![0; content_length];
    reader.read_exact(&mut body)?;

    Ok(Request { method, path, body })
}

/// Dispatches a request to its handler. Handler errors become JSON error
/// responses.
pub fn route(datasource: &Datasource, request: &Request) -> Response {
    let result = match (request.method.as_str(), request.path.as_str()) {
        ("GET" | "HEAD", "/") => Ok(Response::ok(String::new())),
        ("GET" | "POST", "/search") => Response::json(&datasource.search()),
        ("POST", "/query") => handle_query(datasource, &request.body),
        ("POST", "/annotations") => Ok(Response::ok("[]".to_string())),
        ("GET", "/series") => Response::json(&datasource.series()),
        (method, path) => Err(ApiError::RouteNotFound {
            method: method.to_string(),
            path: path.to_string(),
        }),
    };

    result.unwrap_or_else(|e| {
        tracing::debug!("{} {} failed: {e}", request.method, request.path);
        Response::error(&e)
    })
}

fn handle_query(datasource: &Datasource, body: &[u8]) -> Result<Response> {
    let request: QueryRequest = serde_json::from_slice(body)?;
    let targets: Vec<&str> = request.targets.iter().map(|t| t.target.as_str()).collect();
    tracing::info!("sending response for targets {targets:?}");

    Response::json(&datasource.query(&request)?)
}

fn write_response<W: Write>(mut writer: W, response: &Response) -> std::io::Result<()> {
    let status_text = match response.status {
        200 => "OK",
        400 => "Bad Request",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Unknown",
    };

    write!(
        writer,
        "HTTP/1.1 {} {status_text}\r\n\
         Content-Type: application/json\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\
         \r\n\
         {}",
        response.status,
        response.body.len(),
        response.body,
    )?;
    writer.flush()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rill::Registry;
    use std::io::Cursor;
    use std::sync::Arc;

    fn datasource() -> Datasource {
        let registry = Arc::new(Registry::new());
        registry.create("cpu", 4).unwrap();
        registry.create("mem", 4).unwrap();
        Datasource::new(registry)
    }

    fn request(method: &str, path: &str, body: &str) -> Request {
        Request {
            method: method.to_string(),
            path: path.to_string(),
            body: body.as_bytes().to_vec(),
        }
    }

    #[test]
    fn test_read_request_with_body() {
        let raw = "POST /query?x=1 HTTP/1.1\r\nHost: localhost\r\ncontent-length: 2\r\n\r\n{}";
        let req = read_request(&mut Cursor::new(raw)).unwrap();

        assert_eq!(req, request("POST", "/query", "{}"));
    }

    #[test]
    fn test_read_request_without_body() {
        let raw = "get / HTTP/1.1\r\nHost: localhost\r\n\r\n";
        let req = read_request(&mut Cursor::new(raw)).unwrap();

        assert_eq!(req.method, "GET");
        assert_eq!(req.path, "/");
        assert!(req.body.is_empty());
    }

    #[test]
    fn test_read_request_rejects_garbage() {
        assert!(matches!(
            read_request(&mut Cursor::new("\r\n")),
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(
            read_request(&mut Cursor::new("POST /query HTTP/1.1\r\nContent-Length: lots\r\n\r\n")),
            Err(ApiError::BadRequest { .. })
        ));
        assert!(matches!(
            read_request(&mut Cursor::new("POST /query HTTP/1.1\r\nContent-Length: 99999999\r\n\r\n")),
            Err(ApiError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_read_request_truncated_body() {
        let raw = "POST /query HTTP/1.1\r\nContent-Length: 10\r\n\r\n{}";
        assert!(matches!(read_request(&mut Cursor::new(raw)), Err(ApiError::Io(_))));
    }

    #[test]
    fn test_route_root_and_annotations() {
        let ds = datasource();

        assert_eq!(route(&ds, &request("GET", "/", "")), Response::ok(String::new()));
        assert_eq!(route(&ds, &request("POST", "/annotations", "{}")).body, "[]");
    }

    #[test]
    fn test_route_search() {
        let resp = route(&datasource(), &request("POST", "/search", r#"{"target": ""}"#));

        assert_eq!(resp.status, 200);
        assert_eq!(resp.body, r#"["cpu","mem"]"#);
    }

    #[test]
    fn test_route_query_errors() {
        let ds = datasource();

        let bad_json = route(&ds, &request("POST", "/query", "not json"));
        assert_eq!(bad_json.status, 400);
        assert!(bad_json.body.contains("cannot parse request body"));

        let unknown = route(
            &ds,
            &request(
                "POST",
                "/query",
                r#"{"range": {"from": "2017-10-25T11:15:54Z", "to": "2017-10-25T11:20:54Z"},
                    "targets": [{"target": "disk"}]}"#,
            ),
        );
        assert_eq!(unknown.status, 400);
        assert!(unknown.body.contains("disk"));
    }

    #[test]
    fn test_route_not_found() {
        let resp = route(&datasource(), &request("DELETE", "/query", ""));

        assert_eq!(resp.status, 404);
        assert_eq!(resp.body, r#"{"error":"not found: DELETE /query"}"#);
    }

    #[test]
    fn test_read_request_caps_headers() {
        let padding = "x".repeat(200);
        let mut raw = String::from("POST /query HTTP/1.1\r\n");
        for i in 0..100 {
            raw.push_str(&format!("X-Pad-{i}: {padding}\r\n"));
        }
        raw.push_str("Content-Length: 2\r\n\r\n{}");

        assert!(matches!(
            read_request(&mut Cursor::new(raw)),
            Err(ApiError::BadRequest { .. })
        ));

        let long_line = format!("GET /{} HTTP/1.1\r\n\r\n", "a".repeat(16 << 10));
        assert!(matches!(
            read_request(&mut Cursor::new(long_line)),
            Err(ApiError::BadRequest { .. })
        ));
    }

    #[test]
    fn test_write_response() {
        let mut out = Vec::new();
        write_response(&mut out, &Response::ok("[]".to_string())).unwrap();

        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("HTTP/1.1 200 OK\r\n"));
        assert!(text.contains("Content-Length: 2\r\n"));
        assert!(text.ends_with("\r\n\r\n[]"));
    }
}
