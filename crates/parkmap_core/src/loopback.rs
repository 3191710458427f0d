//! One-shot HTTP server on the loopback, for testing the blocking clients against real sockets.

use std::io::{BufRead, BufReader, Read, Write};
use std::net::TcpListener;
use std::thread::JoinHandle;

/// What the server received.
#[derive(Debug, Clone, PartialEq)]
pub struct LoopbackRequest {
    /// `GET /path?query HTTP/1.1`
    pub request_line: String,
    pub body: String,
}

/// Binds an ephemeral loopback port and answers exactly one request with `status_line` and `body`.
/// Returns `http://127.0.0.1:{port}` and a handle yielding the request once it has been answered.
pub fn serve_once(status_line: &'static str, body: &'static str) -> (String, JoinHandle<LoopbackRequest>) {
    let listener = TcpListener::bind("127.0.0.1:0").expect("failed to bind loopback port");
    let origin = format!(
        "http://{}",
        listener.local_addr().expect("bound listener has an address")
    );
    let handle = std::thread::spawn(move || {
        let (stream, _) = listener.accept().expect("no client connected");
        let mut reader = BufReader::new(stream);
        let mut request_line = String::new();
        reader.read_line(&mut request_line).expect("unreadable request line");
        let mut content_length = 0;
        loop {
            let mut line = String::new();
            reader.read_line(&mut line).expect("unreadable header");
            if line.trim_end().is_empty() {
                break;
            }
            if let Some(value) = line.to_ascii_lowercase().strip_prefix("content-length:") {
                content_length = value.trim().parse().expect("bad content-length");
            }
        }
        let mut request_body = vec![0; content_length];
        reader.read_exact(&mut request_body).expect("truncated request body");

        let mut stream = reader.into_inner();
        write!(
            stream,
            "HTTP/1.1 {status_line}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        )
        .expect("failed to answer");
        LoopbackRequest {
            request_line: request_line.trim_end().to_string(),
            body: String::from_utf8_lossy(&request_body).into_owned(),
        }
    });
    (origin, handle)
}
