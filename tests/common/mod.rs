//! Shared utilities for integration tests: local backends and polling helpers.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use futures_util::StreamExt;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::{JoinHandle, JoinSet};
use tokio_tungstenite::accept_async;

/// Local websocket server that reads (and so answers pings) until stopped.
pub struct WsServer {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

impl WsServer {
    pub async fn start() -> Self {
        Self::bind("127.0.0.1:0".parse().unwrap()).await
    }

    /// Bind on a specific address, e.g. to restart on a previous port.
    pub async fn bind(addr: SocketAddr) -> Self {
        let listener = TcpListener::bind(addr).await.unwrap();
        let addr = listener.local_addr().unwrap();

        let task = tokio::spawn(async move {
            let mut connections = JoinSet::new();
            while let Ok((stream, _)) = listener.accept().await {
                connections.spawn(async move {
                    if let Ok(mut ws) = accept_async(stream).await {
                        while let Some(Ok(msg)) = ws.next().await {
                            if msg.is_close() {
                                break;
                            }
                        }
                    }
                });
            }
        });

        Self { addr, task }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn url(&self) -> String {
        format!("ws://{}", self.addr)
    }

    /// Drop the listener and every open connection; returns the freed address.
    pub async fn stop(self) -> SocketAddr {
        self.task.abort();
        let _ = self.task.await;
        self.addr
    }
}

/// Minimal in-memory RESP server.
///
/// Supports PING, GET, SET, SETEX, PSETEX, DEL, LPUSH, LTRIM, LRANGE and
/// `KEYS prefix*`; any other command answers `+OK`.
pub struct FakeRedis {
    addr: SocketAddr,
    task: JoinHandle<()>,
}

#[derive(Debug, Clone)]
enum Entry {
    Text(Vec<u8>, Option<Instant>),
    List(VecDeque<Vec<u8>>),
}

type Db = Arc<Mutex<HashMap<Vec<u8>, Entry>>>;

impl FakeRedis {
    pub async fn start() -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let db: Db = Arc::default();

        let task = tokio::spawn(async move {
            let mut connections = JoinSet::new();
            while let Ok((stream, _)) = listener.accept().await {
                connections.spawn(serve_resp(stream, db.clone()));
            }
        });

        Self { addr, task }
    }

    pub fn url(&self) -> String {
        format!("redis://{}", self.addr)
    }

    pub async fn stop(self) {
        self.task.abort();
        let _ = self.task.await;
    }
}

async fn serve_resp(mut stream: TcpStream, db: Db) {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => return,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        while let Some((args, consumed)) = parse_command(&buf) {
            buf.drain(..consumed);
            let reply = execute(&db, &args);
            if stream.write_all(&reply).await.is_err() {
                return;
            }
        }
    }
}

fn execute(db: &Db, args: &[Vec<u8>]) -> Vec<u8> {
    let Some(name) = args.first() else {
        return b"-ERR empty command\r\n".to_vec();
    };
    let name = String::from_utf8_lossy(name).to_ascii_uppercase();
    let mut db = db.lock().unwrap();

    match (name.as_str(), args.len()) {
        ("PING", _) => b"+PONG\r\n".to_vec(),
        ("GET", 2) => match db.get(&args[1]) {
            Some(Entry::Text(value, expiry)) if expiry.map_or(true, |at| Instant::now() < at) => {
                bulk(value)
            }
            _ => b"$-1\r\n".to_vec(),
        },
        ("SET", 3) => {
            db.insert(args[1].clone(), Entry::Text(args[2].clone(), None));
            b"+OK\r\n".to_vec()
        }
        ("SETEX", 4) | ("PSETEX", 4) => {
            let amount: u64 = String::from_utf8_lossy(&args[2]).parse().unwrap();
            let ttl = if name == "SETEX" {
                Duration::from_secs(amount)
            } else {
                Duration::from_millis(amount)
            };
            db.insert(args[1].clone(), Entry::Text(args[3].clone(), Some(Instant::now() + ttl)));
            b"+OK\r\n".to_vec()
        }
        ("DEL", _) => {
            let removed = args[1..].iter().filter(|k| db.remove(*k).is_some()).count();
            format!(":{}\r\n", removed).into_bytes()
        }
        ("LPUSH", n) if n >= 3 => {
            let entry = db
                .entry(args[1].clone())
                .or_insert_with(|| Entry::List(VecDeque::new()));
            match entry {
                Entry::List(list) => {
                    for value in &args[2..] {
                        list.push_front(value.clone());
                    }
                    format!(":{}\r\n", list.len()).into_bytes()
                }
                Entry::Text(..) => b"-WRONGTYPE\r\n".to_vec(),
            }
        }
        ("LRANGE", 4) => {
            let list: Vec<Vec<u8>> = match db.get(&args[1]) {
                Some(Entry::List(list)) => list.iter().cloned().collect(),
                _ => Vec::new(),
            };
            let (start, stop) = range(list.len(), &args[2], &args[3]);
            let items: Vec<_> = list.get(start..stop).unwrap_or(&[]).to_vec();
            array(&items)
        }
        ("LTRIM", 4) => {
            if let Some(Entry::List(list)) = db.get_mut(&args[1]) {
                let (start, stop) = range(list.len(), &args[2], &args[3]);
                *list = list
                    .iter()
                    .skip(start)
                    .take(stop - start)
                    .cloned()
                    .collect();
            }
            b"+OK\r\n".to_vec()
        }
        ("KEYS", 2) => {
            let pattern = &args[1];
            let prefix = pattern.strip_suffix(b"*").unwrap_or(pattern.as_slice());
            let keys: Vec<_> = db.keys().filter(|k| k.starts_with(prefix)).cloned().collect();
            array(&keys)
        }
        _ => b"+OK\r\n".to_vec(),
    }
}

/// Redis inclusive `start..=stop` with negative indexes, as a half-open range.
fn range(len: usize, start: &[u8], stop: &[u8]) -> (usize, usize) {
    let resolve = |raw: &[u8]| -> i64 {
        let i: i64 = String::from_utf8_lossy(raw).parse().unwrap();
        if i < 0 {
            len as i64 + i
        } else {
            i
        }
    };
    let start = resolve(start).max(0) as usize;
    let stop = (resolve(stop) + 1).clamp(0, len as i64) as usize;
    (start.min(stop), stop)
}

fn bulk(value: &[u8]) -> Vec<u8> {
    let mut out = format!("${}\r\n", value.len()).into_bytes();
    out.extend_from_slice(value);
    out.extend_from_slice(b"\r\n");
    out
}

fn array(items: &[Vec<u8>]) -> Vec<u8> {
    let mut out = format!("*{}\r\n", items.len()).into_bytes();
    for item in items {
        out.extend(bulk(item));
    }
    out
}

/// Parse one RESP array of bulk strings; returns its elements and the bytes used.
fn parse_command(buf: &[u8]) -> Option<(Vec<Vec<u8>>, usize)> {
    let (count, mut pos) = read_header(buf, 0, b'*')?;
    let mut args = Vec::with_capacity(count);

    for _ in 0..count {
        let (len, start) = read_header(buf, pos, b'$')?;
        let end = start + len;
        if buf.len() < end + 2 {
            return None;
        }
        args.push(buf[start..end].to_vec());
        pos = end + 2;
    }

    Some((args, pos))
}

fn read_header(buf: &[u8], pos: usize, marker: u8) -> Option<(usize, usize)> {
    if buf.get(pos) != Some(&marker) {
        return None;
    }
    let rest = &buf[pos + 1..];
    let line_end = rest.windows(2).position(|w| w == b"\r\n")?;
    let value = std::str::from_utf8(&rest[..line_end]).ok()?.parse().ok()?;
    Some((value, pos + 1 + line_end + 2))
}

/// An address nothing is listening on.
pub async fn closed_addr() -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    addr
}

/// Poll `condition` every 10ms until it holds or `timeout` elapses.
pub async fn wait_for<F: Fn() -> bool>(condition: F, timeout: Duration) -> bool {
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    condition()
}
