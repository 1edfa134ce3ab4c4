//! Minimal HTTP control surface: `GET /led/<n>` queues raw byte `n` for the
//! panel.

use buttonbox_link::{push, ByteSender, CancelToken};
use log::{debug, info, warn};
use std::net::SocketAddr;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tiny_http::{Request, Response, Server};

const HOME_PAGE: &str = "Buttonbox host processor\n";

#[derive(Debug, thiserror::Error)]
pub enum ControlError {
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: String,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
}

#[derive(Debug, PartialEq, Eq)]
enum Route {
    Home,
    Led(u8),
    BadLed(String),
    MethodNotAllowed,
    NotFound,
}

fn route(method: &str, path: &str) -> Route {
    let path = path.split('?').next().unwrap_or(path);
    if let Some(led) = path.strip_prefix("/led/") {
        if method != "GET" && method != "POST" {
            return Route::MethodNotAllowed;
        }
        return match led.parse::<u8>() {
            Ok(byte) => Route::Led(byte),
            Err(_) => Route::BadLed(led.to_string()),
        };
    }
    match (method, path) {
        ("GET", "/") => Route::Home,
        (_, "/") => Route::MethodNotAllowed,
        _ => Route::NotFound,
    }
}

/// HTTP server pushing LED command bytes onto the outbound queue
pub struct ControlApi {
    server: Server,
    outbound: ByteSender,
    poll: Duration,
}

impl ControlApi {
    pub fn bind(addr: &str, outbound: ByteSender, poll: Duration) -> Result<Self, ControlError> {
        let server = Server::http(addr).map_err(|source| ControlError::Bind {
            addr: addr.to_string(),
            source,
        })?;
        Ok(ControlApi {
            server,
            outbound,
            poll,
        })
    }

    pub fn local_addr(&self) -> Option<SocketAddr> {
        self.server.server_addr().to_ip()
    }

    /// Serve requests until `shutdown` is cancelled. Each request runs on
    /// its own thread, so a push waiting on a full queue holds up nobody else.
    pub fn run(&self, shutdown: &CancelToken) {
        if let Some(addr) = self.local_addr() {
            info!("Control API listening on http://{}", addr);
        }

        let mut handlers: Vec<JoinHandle<()>> = Vec::new();
        while !shutdown.is_cancelled() {
            match self.server.recv_timeout(self.poll) {
                Ok(Some(request)) => {
                    let outbound = self.outbound.clone();
                    let token = shutdown.clone();
                    let poll = self.poll;
                    let spawned = thread::Builder::new()
                        .name("control-request".to_string())
                        .spawn(move || handle_request(request, &outbound, &token, poll));
                    match spawned {
                        Ok(handle) => handlers.push(handle),
                        Err(e) => warn!("Control API: failed to start request thread: {}", e),
                    }
                }
                Ok(None) => {}
                Err(e) => {
                    warn!("Control API: receive error: {}", e);
                    shutdown.wait_timeout(self.poll);
                }
            }
            handlers.retain(|h| !h.is_finished());
        }

        for handler in handlers {
            if handler.join().is_err() {
                warn!("Control API: request thread panicked");
            }
        }
        info!("Control API done");
    }
}

fn handle_request(
    request: Request,
    outbound: &ByteSender,
    shutdown: &CancelToken,
    poll: Duration,
) {
    debug!(
        "Control API: {} {} from {:?}",
        request.method(),
        request.url(),
        request.remote_addr()
    );

    let (status, body) = match route(request.method().as_str(), request.url()) {
        Route::Home => (200, HOME_PAGE.to_string()),
        Route::Led(byte) => {
            debug!("Control API: LED command {:#04x}", byte);
            match push(outbound, byte, shutdown, poll) {
                Ok(()) => (200, "accepted\n".to_string()),
                Err(e) => (503, format!("rejected: {}\n", e)),
            }
        }
        Route::BadLed(value) => (
            400,
            format!("rejected: '{}' is not a byte value (0-255)\n", value),
        ),
        Route::MethodNotAllowed => (405, "method not allowed\n".to_string()),
        Route::NotFound => (404, "not found\n".to_string()),
    };

    if let Err(e) = request.respond(Response::from_string(body).with_status_code(status)) {
        debug!("Control API: failed to send response: {}", e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use buttonbox_link::{byte_queue, ByteReceiver};
    use std::io::{Read, Write};
    use std::net::TcpStream;
    use std::time::Instant;

    const POLL: Duration = Duration::from_millis(5);

    fn start(capacity: usize) -> (SocketAddr, CancelToken, JoinHandle<()>, ByteReceiver) {
        let (tx, rx) = byte_queue(capacity);
        let api = ControlApi::bind("127.0.0.1:0", tx, POLL).unwrap();
        let addr = api.local_addr().unwrap();
        let shutdown = CancelToken::new();
        let token = shutdown.clone();
        let handle = thread::spawn(move || api.run(&token));
        (addr, shutdown, handle, rx)
    }

    fn request(addr: SocketAddr, method: &str, path: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_secs(2)))
            .unwrap();
        write!(
            stream,
            "{} {} HTTP/1.1\r\nHost: test\r\nConnection: close\r\n\r\n",
            method, path
        )
        .unwrap();
        let mut response = String::new();
        stream.read_to_string(&mut response).unwrap();
        response
    }

    #[test]
    fn test_route() {
        assert_eq!(route("GET", "/"), Route::Home);
        assert_eq!(route("GET", "/led/13"), Route::Led(13));
        assert_eq!(route("POST", "/led/141?x=1"), Route::Led(141));
        assert_eq!(route("GET", "/led/256"), Route::BadLed("256".to_string()));
        assert_eq!(route("GET", "/led/-1"), Route::BadLed("-1".to_string()));
        assert_eq!(route("GET", "/led/abc"), Route::BadLed("abc".to_string()));
        assert_eq!(route("DELETE", "/led/1"), Route::MethodNotAllowed);
        assert_eq!(route("POST", "/"), Route::MethodNotAllowed);
        assert_eq!(route("GET", "/other"), Route::NotFound);
    }

    #[test]
    fn test_led_request_queues_raw_byte() {
        let (addr, shutdown, handle, rx) = start(10);

        let response = request(addr, "GET", "/led/13");
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        let response = request(addr, "POST", "/led/255");
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);

        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![13, 255]);
        shutdown.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn test_bad_requests_queue_nothing() {
        let (addr, shutdown, handle, rx) = start(10);

        assert!(request(addr, "GET", "/led/300").starts_with("HTTP/1.1 400"));
        assert!(request(addr, "GET", "/led/red").starts_with("HTTP/1.1 400"));
        assert!(request(addr, "PUT", "/led/1").starts_with("HTTP/1.1 405"));
        assert!(request(addr, "GET", "/nope").starts_with("HTTP/1.1 404"));
        let home = request(addr, "GET", "/");
        assert!(home.starts_with("HTTP/1.1 200"));
        assert!(home.ends_with(HOME_PAGE));

        assert!(rx.try_recv().is_err());
        shutdown.cancel();
        handle.join().unwrap();
    }

    #[test]
    fn test_full_queue_rejected_on_shutdown() {
        let (addr, shutdown, handle, _rx) = start(1);
        assert!(request(addr, "GET", "/led/1").starts_with("HTTP/1.1 200"));

        let client = thread::spawn(move || request(addr, "GET", "/led/2"));
        thread::sleep(Duration::from_millis(50));
        shutdown.cancel();
        assert!(client.join().unwrap().starts_with("HTTP/1.1 503"));
        handle.join().unwrap();
    }

    #[test]
    fn test_idle_client_does_not_block_requests() {
        let (addr, shutdown, handle, rx) = start(10);

        // Connects and never sends a request line
        let _idle = TcpStream::connect(addr).unwrap();
        thread::sleep(Duration::from_millis(20));

        let response = request(addr, "GET", "/led/13");
        assert!(response.starts_with("HTTP/1.1 200"), "{}", response);
        assert_eq!(rx.try_iter().collect::<Vec<_>>(), vec![13]);

        let stop = Instant::now();
        shutdown.cancel();
        handle.join().unwrap();
        assert!(stop.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_busy_request_does_not_block_others() {
        let (addr, shutdown, handle, rx) = start(1);
        assert!(request(addr, "GET", "/led/1").starts_with("HTTP/1.1 200"));

        // Waits on the full queue until shutdown
        let blocked = thread::spawn(move || request(addr, "GET", "/led/2"));
        thread::sleep(Duration::from_millis(30));

        let home = request(addr, "GET", "/");
        assert!(home.starts_with("HTTP/1.1 200"), "{}", home);
        assert_eq!(rx.try_recv().unwrap(), 1);

        shutdown.cancel();
        let response = blocked.join().unwrap();
        assert!(
            response.starts_with("HTTP/1.1 200") || response.starts_with("HTTP/1.1 503"),
            "{}",
            response
        );
        handle.join().unwrap();
    }
}
