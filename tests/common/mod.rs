//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::future::Future;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use cache_proxy::config::ProxyConfig;
use cache_proxy::net::listener::Listener;
use cache_proxy::{ObjectCache, ProxyServer, Shutdown};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// A mock origin that records what it receives.
pub struct MockOrigin {
    pub addr: SocketAddr,
    hits: Arc<AtomicUsize>,
    requests: Arc<Mutex<Vec<String>>>,
}

impl MockOrigin {
    /// Number of connections that sent a request.
    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    /// Request heads received so far, in arrival order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    /// Absolute-form URL for `path` on this origin.
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }
}

/// Read until the end of a request head or EOF.
pub async fn read_request_head(socket: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        match socket.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
        }
    }
    String::from_utf8_lossy(&buf).into_owned()
}

/// Start an origin that answers every connection with the same bytes.
pub async fn start_mock_origin(response: impl Into<Vec<u8>>) -> MockOrigin {
    let response: Arc<[u8]> = response.into().into();
    start_programmable_origin(move |_path| {
        let response = Arc::clone(&response);
        async move { (Duration::ZERO, response.to_vec()) }
    })
    .await
}

/// Start an origin whose reply is computed per request path.
///
/// The closure returns a delay to wait before replying, and the raw bytes.
pub async fn start_programmable_origin<F, Fut>(f: F) -> MockOrigin
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (Duration, Vec<u8>)> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let hits = Arc::new(AtomicUsize::new(0));
    let requests = Arc::new(Mutex::new(Vec::new()));
    let f = Arc::new(f);

    let origin = MockOrigin {
        addr,
        hits: Arc::clone(&hits),
        requests: Arc::clone(&requests),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let f = Arc::clone(&f);
            let hits = Arc::clone(&hits);
            let requests = Arc::clone(&requests);
            tokio::spawn(async move {
                let head = read_request_head(&mut socket).await;
                if head.is_empty() {
                    return;
                }
                hits.fetch_add(1, Ordering::SeqCst);
                let path = head.split_whitespace().nth(1).unwrap_or("/").to_string();
                requests.lock().unwrap().push(head);

                let (delay, body) = f(path).await;
                tokio::time::sleep(delay).await;
                let _ = socket.write_all(&body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    origin
}

/// Build an HTTP/1.1 response with a body of `len` bytes.
pub fn http_response(body: &[u8]) -> Vec<u8> {
    let mut out = format!(
        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        body.len()
    )
    .into_bytes();
    out.extend_from_slice(body);
    out
}

/// A running proxy bound to an ephemeral port.
pub struct TestProxy {
    pub addr: SocketAddr,
    pub cache: Arc<ObjectCache>,
    pub shutdown: Shutdown,
    pub task: JoinHandle<Result<(), std::io::Error>>,
}

/// Config with short timeouts suitable for tests.
pub fn test_config() -> ProxyConfig {
    let mut config = ProxyConfig::default();
    config.listener.bind_address = "127.0.0.1:0".into();
    config.timeouts.connect_secs = 2;
    config.timeouts.client_read_secs = 2;
    config.timeouts.origin_read_secs = 2;
    config.timeouts.shutdown_grace_secs = 2;
    config
}

/// Start the proxy with `config` and return once it is accepting.
pub async fn start_proxy(config: ProxyConfig) -> TestProxy {
    let listener = Listener::bind(&config.listener).await.unwrap();
    let addr = listener.local_addr().unwrap();
    let server = ProxyServer::new(config);
    let cache = server.cache();
    let shutdown = Shutdown::new();
    let task = tokio::spawn(server.run(listener, shutdown.subscribe()));

    TestProxy {
        addr,
        cache,
        shutdown,
        task,
    }
}

/// Send raw bytes to the proxy and read until it closes the connection.
pub async fn send_raw(proxy: SocketAddr, request: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(proxy).await.unwrap();
    stream.write_all(request).await.unwrap();
    let mut response = Vec::new();
    let _ = tokio::time::timeout(Duration::from_secs(10), stream.read_to_end(&mut response)).await;
    response
}

/// Issue an absolute-form GET through the proxy.
pub async fn proxy_get(proxy: SocketAddr, url: &str) -> Vec<u8> {
    let request = format!("GET {} HTTP/1.1\r\nAccept: */*\r\n\r\n", url);
    send_raw(proxy, request.as_bytes()).await
}
