//! Minimal HTTP/1.1 server for the check-in service.
//!
//! One request per connection (`Connection: close`), one thread per
//! connection, at most `server.max_connections` live at once. The listener is
//! non-blocking so the shutdown flag is polled between accepts.

use std::io::{self, BufRead, BufReader, Read, Write};
use std::net::{SocketAddr, TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crate::handler::{reason_phrase, Handler, Request, Response};

/// Longest accepted request line or header line.
const MAX_HEADER_LINE: usize = 8 * 1024;
/// Maximum number of header lines.
const MAX_HEADERS: usize = 100;

const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(10);
const REFUSE_WRITE_TIMEOUT: Duration = Duration::from_millis(500);
const ACCEPT_POLL: Duration = Duration::from_millis(50);

#[derive(Debug)]
pub enum RequestError {
    /// Malformed request line or headers.
    BadRequest(String),
    /// Declared body exceeds the configured limit.
    TooLarge { declared: usize, limit: usize },
    Io(io::Error),
}

impl std::fmt::Display for RequestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::BadRequest(msg) => write!(f, "bad request: {msg}"),
            Self::TooLarge { declared, limit } => {
                write!(f, "request body of {declared} bytes exceeds limit of {limit} bytes")
            }
            Self::Io(e) => write!(f, "{e}"),
        }
    }
}

impl std::error::Error for RequestError {}

impl From<io::Error> for RequestError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

fn read_line_limited<R: BufRead>(reader: &mut R) -> Result<String, RequestError> {
    let mut buf = Vec::new();
    let n = reader
        .by_ref()
        .take(MAX_HEADER_LINE as u64 + 1)
        .read_until(b'\n', &mut buf)?;
    if n == 0 {
        return Err(RequestError::BadRequest("connection closed before request".into()));
    }
    if buf.len() > MAX_HEADER_LINE {
        return Err(RequestError::BadRequest("header line too long".into()));
    }
    let line = String::from_utf8(buf)
        .map_err(|_| RequestError::BadRequest("header is not valid UTF-8".into()))?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

/// Read one request. The body is only read when its declared length fits
/// within `max_body`.
pub fn read_request<R: BufRead>(
    reader: &mut R,
    max_body: usize,
) -> Result<Request, RequestError> {
    let request_line = read_line_limited(reader)?;
    let mut parts = request_line.split_whitespace();
    let (Some(method), Some(target), Some(version)) = (parts.next(), parts.next(), parts.next())
    else {
        return Err(RequestError::BadRequest(format!(
            "malformed request line {request_line:?}"
        )));
    };
    if !version.starts_with("HTTP/1.") {
        return Err(RequestError::BadRequest(format!("unsupported version {version}")));
    }
    let path = target.split('?').next().unwrap_or(target);

    let mut content_length = 0usize;
    let mut header_count = 0;
    loop {
        let line = read_line_limited(reader)?;
        if line.is_empty() {
            break;
        }
        header_count += 1;
        if header_count > MAX_HEADERS {
            return Err(RequestError::BadRequest("too many headers".into()));
        }
        let Some((name, value)) = line.split_once(':') else {
            return Err(RequestError::BadRequest(format!("malformed header {line:?}")));
        };
        let name = name.trim().to_ascii_lowercase();
        let value = value.trim();
        match name.as_str() {
            "content-length" => {
                content_length = value.parse().map_err(|_| {
                    RequestError::BadRequest(format!("invalid Content-Length {value:?}"))
                })?;
            }
            "transfer-encoding" if !value.eq_ignore_ascii_case("identity") => {
                return Err(RequestError::BadRequest("chunked bodies are not supported".into()));
            }
            _ => {}
        }
    }

    if content_length > max_body {
        return Err(RequestError::TooLarge { declared: content_length, limit: max_body });
    }

    let mut body = vec![0u8; content_length];
    reader.read_exact(&mut body)?;

    Ok(Request { method: method.to_string(), path: path.to_string(), body })
}

pub fn write_response<W: Write>(writer: &mut W, resp: &Response) -> io::Result<()> {
    let mut head = format!("HTTP/1.1 {} {}\r\n", resp.status, reason_phrase(resp.status));
    for (name, value) in &resp.headers {
        head.push_str(&format!("{name}: {value}\r\n"));
    }
    head.push_str(&format!(
        "Content-Length: {}\r\nConnection: close\r\n\r\n",
        resp.body.len()
    ));
    writer.write_all(head.as_bytes())?;
    writer.write_all(&resp.body)?;
    writer.flush()
}

/// Running check-in server. Stops on `stop()` or drop.
pub struct CheckInServer {
    listener_handle: Option<JoinHandle<()>>,
    shutdown: Arc<AtomicBool>,
    bound_addr: SocketAddr,
}

impl CheckInServer {
    /// Bind `bind` and start accepting on a background thread.
    pub fn start(bind: &str, handler: Handler) -> io::Result<Self> {
        let listener = TcpListener::bind(bind)?;
        let addr = listener.local_addr()?;
        listener.set_nonblocking(true)?;

        let shutdown = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&shutdown);
        let handler = Arc::new(handler);
        let listener_handle = thread::spawn(move || run_listener(listener, flag, handler));

        log::info!("Check-in service listening on http://{}", addr);
        Ok(Self { listener_handle: Some(listener_handle), shutdown, bound_addr: addr })
    }

    pub fn addr(&self) -> SocketAddr {
        self.bound_addr
    }

    pub fn is_running(&self) -> bool {
        self.listener_handle.is_some() && !self.shutdown.load(Ordering::SeqCst)
    }

    /// Block until the listener exits.
    pub fn wait(mut self) {
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
        }
    }

    pub fn stop(&mut self) {
        self.shutdown.store(true, Ordering::SeqCst);
        if let Some(handle) = self.listener_handle.take() {
            let _ = handle.join();
            log::info!("Check-in service stopped");
        }
    }
}

impl Drop for CheckInServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Holds one slot of the live-connection count; releases it on drop.
struct ConnectionSlot {
    live: Arc<AtomicUsize>,
}

impl ConnectionSlot {
    /// Take a slot, or `None` when `max` connections are already live.
    fn acquire(live: &Arc<AtomicUsize>, max: usize) -> Option<Self> {
        live.fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| (n < max).then_some(n + 1))
            .ok()
            .map(|_| Self { live: Arc::clone(live) })
    }
}

impl Drop for ConnectionSlot {
    fn drop(&mut self) {
        self.live.fetch_sub(1, Ordering::SeqCst);
    }
}

fn run_listener(listener: TcpListener, shutdown: Arc<AtomicBool>, handler: Arc<Handler>) {
    let max_connections = handler.settings().server.max_connections;
    let live = Arc::new(AtomicUsize::new(0));

    while !shutdown.load(Ordering::SeqCst) {
        match listener.accept() {
            Ok((stream, addr)) => {
                let Some(slot) = ConnectionSlot::acquire(&live, max_connections) else {
                    log::warn!(
                        "Connection refused from {}: limit of {} reached",
                        addr,
                        max_connections
                    );
                    if let Err(e) = refuse_connection(stream) {
                        log::debug!("Refusal to {} not delivered: {}", addr, e);
                    }
                    continue;
                };

                log::debug!("Accepted connection from {}", addr);
                let handler = Arc::clone(&handler);
                thread::spawn(move || {
                    let _slot = slot;
                    if let Err(e) = handle_connection(stream, &handler) {
                        log::warn!("Connection error from {}: {}", addr, e);
                    }
                });
            }
            Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                thread::sleep(ACCEPT_POLL);
            }
            Err(e) => {
                log::error!("Accept error: {}", e);
                break;
            }
        }
    }
}

/// Answer 503 without reading the request, then close.
fn refuse_connection(mut stream: TcpStream) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_write_timeout(Some(REFUSE_WRITE_TIMEOUT))?;
    write_response(&mut stream, &Response::error(503, "too many connections, retry later"))
}

fn handle_connection(stream: TcpStream, handler: &Handler) -> io::Result<()> {
    stream.set_nonblocking(false)?;
    stream.set_read_timeout(Some(READ_TIMEOUT))?;
    stream.set_write_timeout(Some(WRITE_TIMEOUT))?;

    let mut writer = stream.try_clone()?;
    let mut reader = BufReader::new(stream);
    let max_body = handler.settings().server.max_body_bytes;

    let resp = match read_request(&mut reader, max_body) {
        Ok(req) => {
            let resp = handler.handle(&req);
            log::info!("{} {} -> {}", req.method, req.path, resp.status);
            resp
        }
        Err(RequestError::Io(e)) => return Err(e),
        Err(e @ RequestError::TooLarge { .. }) => {
            log::warn!("{}", e);
            Response::error(413, e.to_string())
        }
        Err(e @ RequestError::BadRequest(_)) => {
            log::debug!("{}", e);
            Response::error(400, e.to_string())
        }
    };
    write_response(&mut writer, &resp)
}
