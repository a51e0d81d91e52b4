#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::{Mutex, mpsc, oneshot};

use waystone::config::Config;
use waystone::http::request::{Method, Request, RequestBuilder};
use waystone::http::response::Response;
use waystone::server::transport::{RequestContext, Transport};

pub const PNG_BYTES: &[u8] = &[0x89, b'P', b'N', b'G', 0x0d, 0x0a, 0x1a, 0x0a, 0x00, 0xff];

/// Website layout used across the tests.
pub fn website() -> TempDir {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    write(root, "Pages/index.html", "<h1>Home</h1>");
    write(root, "Pages/about.html", "<p>About</p>");
    write(
        root,
        "Pages/form.html",
        "<form method=\"post\">@AntiForgeryToken@</form>",
    );
    write(root, "Pages/ErrorPages/pageNotFound.html", "<p>No such page</p>");
    write(root, "css/site.css", "body { margin: 0 }");
    write(root, "js/app.js", "console.log('@AntiForgeryToken@');");
    std::fs::create_dir_all(root.join("img")).unwrap();
    std::fs::write(root.join("img/logo.png"), PNG_BYTES).unwrap();

    dir
}

fn write(root: &Path, rel: &str, contents: &str) {
    let path = root.join(rel);
    std::fs::create_dir_all(path.parent().unwrap()).unwrap();
    std::fs::write(path, contents).unwrap();
}

pub fn config(root: &Path) -> Config {
    Config {
        website_path: root.to_path_buf(),
        ..Config::default()
    }
}

pub fn peer(last_octet: u8) -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::new(10, 0, 0, last_octet)), 50_000)
}

pub fn request(method: Method, target: &str, body: &str) -> Request {
    RequestBuilder::new()
        .method(method)
        .path(target)
        .body(body)
        .build()
        .unwrap()
}

pub fn get(target: &str) -> Request {
    request(Method::GET, target, "")
}

pub fn post(target: &str, body: &str) -> Request {
    request(Method::POST, target, body)
}

/// In-memory transport fed through a channel.
#[derive(Debug)]
pub struct MockTransport {
    rx: Mutex<mpsc::Receiver<MockExchange>>,
    accepts: AtomicUsize,
    waiting: AtomicUsize,
    max_waiting: AtomicUsize,
}

impl MockTransport {
    pub fn new() -> (Arc<Self>, mpsc::Sender<MockExchange>) {
        let (tx, rx) = mpsc::channel(64);
        let transport = Arc::new(Self {
            rx: Mutex::new(rx),
            accepts: AtomicUsize::new(0),
            waiting: AtomicUsize::new(0),
            max_waiting: AtomicUsize::new(0),
        });
        (transport, tx)
    }

    /// Number of `accept` calls started so far.
    pub fn accepts(&self) -> usize {
        self.accepts.load(Ordering::SeqCst)
    }

    /// Highest number of `accept` calls pending at the same time.
    pub fn max_waiting(&self) -> usize {
        self.max_waiting.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Transport for MockTransport {
    type Context = MockExchange;

    async fn accept(&self) -> anyhow::Result<Option<MockExchange>> {
        self.accepts.fetch_add(1, Ordering::SeqCst);
        let waiting = self.waiting.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_waiting.fetch_max(waiting, Ordering::SeqCst);

        let next = self.rx.lock().await.recv().await;

        self.waiting.fetch_sub(1, Ordering::SeqCst);
        Ok(next)
    }
}

#[derive(Debug)]
pub struct MockExchange {
    peer: SocketAddr,
    request: Request,
    reply: Option<oneshot::Sender<Response>>,
}

pub fn exchange(peer: SocketAddr, request: Request) -> (MockExchange, oneshot::Receiver<Response>) {
    let (reply, rx) = oneshot::channel();
    (
        MockExchange {
            peer,
            request,
            reply: Some(reply),
        },
        rx,
    )
}

#[async_trait]
impl RequestContext for MockExchange {
    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }

    fn request(&self) -> &Request {
        &self.request
    }

    async fn send(&mut self, response: Response) -> anyhow::Result<()> {
        self.reply
            .take()
            .ok_or_else(|| anyhow::anyhow!("response already sent"))?
            .send(response)
            .map_err(|_| anyhow::anyhow!("client went away"))
    }
}
