//! Minimal HTTP/1.1 server for integration tests.
//!
//! Serves a single static body at every path. HEAD answers with or without
//! `Content-Length`; GET always answers 200 with a connection-delimited body
//! (no `Content-Length`, closed after the last byte).

use std::io::{Read, Write};
use std::net::TcpListener;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;

#[derive(Debug, Clone, Copy, Default)]
pub struct HeadServerOptions {
    /// If true, HEAD responses carry `Content-Length` (the fetch is skipped).
    pub advertise_length: bool,
}

/// Handle to a running server. Runs until the process exits.
pub struct HeadServer {
    base: String,
    heads: Arc<AtomicUsize>,
    gets: Arc<AtomicUsize>,
}

impl HeadServer {
    /// URL for `path` on this server, e.g. `url("repo")`.
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base, path)
    }

    pub fn heads(&self) -> usize {
        self.heads.load(Ordering::SeqCst)
    }

    pub fn gets(&self) -> usize {
        self.gets.load(Ordering::SeqCst)
    }
}

pub fn start(body: Vec<u8>) -> HeadServer {
    start_with_options(body, HeadServerOptions::default())
}

pub fn start_with_options(body: Vec<u8>, opts: HeadServerOptions) -> HeadServer {
    let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
    let port = listener.local_addr().unwrap().port();
    let body = Arc::new(body);
    let heads = Arc::new(AtomicUsize::new(0));
    let gets = Arc::new(AtomicUsize::new(0));
    let (h, g) = (Arc::clone(&heads), Arc::clone(&gets));
    thread::spawn(move || {
        for stream in listener.incoming().flatten() {
            let body = Arc::clone(&body);
            let (h, g) = (Arc::clone(&h), Arc::clone(&g));
            thread::spawn(move || handle(stream, &body, opts, &h, &g));
        }
    });
    HeadServer {
        base: format!("http://127.0.0.1:{}/", port),
        heads,
        gets,
    }
}

fn handle(
    mut stream: std::net::TcpStream,
    body: &[u8],
    opts: HeadServerOptions,
    heads: &AtomicUsize,
    gets: &AtomicUsize,
) {
    let _ = stream.set_read_timeout(Some(std::time::Duration::from_secs(2)));
    let _ = stream.set_write_timeout(Some(std::time::Duration::from_secs(2)));
    let mut buf = [0u8; 8192];
    let n = match stream.read(&mut buf) {
        Ok(0) => return,
        Ok(n) => n,
        Err(_) => return,
    };
    let request = match std::str::from_utf8(&buf[..n]) {
        Ok(s) => s,
        Err(_) => return,
    };
    let method = request.split_whitespace().next().unwrap_or("");

    if method.eq_ignore_ascii_case("HEAD") {
        heads.fetch_add(1, Ordering::SeqCst);
        let length = if opts.advertise_length {
            format!("Content-Length: {}\r\n", body.len())
        } else {
            String::new()
        };
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\n{}Connection: close\r\n\r\n",
            length
        );
        let _ = stream.write_all(response.as_bytes());
        return;
    }
    if method.eq_ignore_ascii_case("GET") {
        gets.fetch_add(1, Ordering::SeqCst);
        let _ = stream.write_all(
            b"HTTP/1.1 200 OK\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
        );
        // Several writes so the client sees the body arrive in pieces.
        for piece in body.chunks(4096) {
            if stream.write_all(piece).is_err() {
                return;
            }
        }
        let _ = stream.flush();
        let _ = stream.shutdown(std::net::Shutdown::Write);
        return;
    }
    let _ = stream.write_all(b"HTTP/1.1 405 Method Not Allowed\r\nContent-Length: 0\r\n\r\n");
}
