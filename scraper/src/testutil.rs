//! Test utilities: a loopback HTTP server answering with scripted statuses.

use std::io::{BufRead, BufReader, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::{Arc, Mutex};
use std::thread;
use std::time::Duration;

use reqwest::StatusCode;

use crate::client::RetryPolicy;

/// Retry policy with the default statuses and count but a 1 ms backoff.
pub fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        backoff_factor: Duration::from_millis(1),
        ..RetryPolicy::default()
    }
}

/// Serves one response per connection. Statuses are used in order; the last
/// one repeats once the script runs out.
pub struct ScriptedServer {
    pub url: String,
    /// Request lines received so far, e.g. `GET /search?text=Rust HTTP/1.1`.
    requests: Arc<Mutex<Vec<String>>>,
}

impl ScriptedServer {
    pub fn start(statuses: &[u16], body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let url = format!("http://{}/", listener.local_addr().unwrap());
        let requests = Arc::new(Mutex::new(Vec::new()));

        let script = statuses.to_vec();
        let body = body.to_string();
        let recorded = Arc::clone(&requests);
        thread::spawn(move || {
            for (index, stream) in listener.incoming().enumerate() {
                let Ok(stream) = stream else { continue };
                let status = script[index.min(script.len() - 1)];
                respond(stream, status, &body, &recorded);
            }
        });

        Self { url, requests }
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

fn respond(stream: TcpStream, status: u16, body: &str, recorded: &Mutex<Vec<String>>) {
    let mut reader = BufReader::new(stream);
    let mut request_line = String::new();
    if reader.read_line(&mut request_line).is_err() {
        return;
    }
    let mut header = String::new();
    while reader.read_line(&mut header).is_ok_and(|n| n > 0) && header != "\r\n" {
        header.clear();
    }
    recorded.lock().unwrap().push(request_line.trim_end().to_string());

    let reason = StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .unwrap_or("Unknown");
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\n\
         Content-Type: text/html; charset=utf-8\r\n\
         Content-Length: {}\r\n\
         Connection: close\r\n\r\n{body}",
        body.len()
    );
    let mut stream = reader.into_inner();
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}

/// A loopback URL nothing is listening on.
pub fn refused_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}/")
}
