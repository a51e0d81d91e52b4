//! Transport abstraction and the TCP implementation.

use std::net::SocketAddr;
use std::time::Duration;

use async_trait::async_trait;
use tokio::net::{TcpListener, TcpStream, ToSocketAddrs};
use tokio::time::timeout;
use tracing::{debug, warn};

use crate::http::connection::Connection;
use crate::http::parser::ParseError;
use crate::http::request::Request;
use crate::http::response::Response;

/// How long a client gets to deliver its full request.
const READ_TIMEOUT: Duration = Duration::from_secs(30);

/// Source of incoming requests.
#[async_trait]
pub trait Transport: Send + Sync + 'static {
    type Context: RequestContext;

    /// Waits for the next request.
    ///
    /// `Ok(None)` means the transport is closed and no request will follow.
    async fn accept(&self) -> anyhow::Result<Option<Self::Context>>;
}

/// One received request and the channel to answer it.
#[async_trait]
pub trait RequestContext: Send + Sync + 'static {
    fn remote_addr(&self) -> SocketAddr;

    fn request(&self) -> &Request;

    async fn send(&mut self, response: Response) -> anyhow::Result<()>;
}

#[derive(Debug)]
pub struct TcpTransport {
    listener: TcpListener,
}

impl TcpTransport {
    pub async fn bind(addr: impl ToSocketAddrs) -> anyhow::Result<Self> {
        let listener = TcpListener::bind(addr).await?;
        Ok(Self { listener })
    }

    pub fn local_addr(&self) -> anyhow::Result<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }
}

#[async_trait]
impl Transport for TcpTransport {
    type Context = TcpExchange;

    async fn accept(&self) -> anyhow::Result<Option<TcpExchange>> {
        loop {
            let (socket, peer) = self.listener.accept().await?;
            debug!(peer = %peer, "Accepted connection");

            let mut conn = Connection::new(socket);
            match timeout(READ_TIMEOUT, conn.read_request()).await {
                Ok(Ok(Some(request))) => {
                    return Ok(Some(TcpExchange {
                        conn,
                        peer,
                        request,
                    }));
                }
                Ok(Ok(None)) => {
                    debug!(peer = %peer, "Client closed before sending a request");
                }
                Ok(Err(e)) => {
                    warn!(peer = %peer, error = %e, "Rejecting request");
                    let response = rejection(&e);
                    if let Err(e) = conn.respond(&response).await {
                        debug!(
                            peer = %peer,
                            status = ?response.status,
                            error = %e,
                            "Failed to send rejection"
                        );
                    }
                }
                Err(_) => {
                    warn!(peer = %peer, "Timed out reading request");
                }
            }
        }
    }
}

/// Status sent for a request the connection refused to read.
fn rejection(error: &anyhow::Error) -> Response {
    match error.downcast_ref::<ParseError>() {
        Some(ParseError::HeadTooLarge | ParseError::BodyTooLarge { .. }) => {
            Response::payload_too_large()
        }
        _ => Response::bad_request(),
    }
}

/// A request read from a TCP connection.
#[derive(Debug)]
pub struct TcpExchange {
    conn: Connection<TcpStream>,
    peer: SocketAddr,
    request: Request,
}

#[async_trait]
impl RequestContext for TcpExchange {
    fn remote_addr(&self) -> SocketAddr {
        self.peer
    }

    fn request(&self) -> &Request {
        &self.request
    }

    async fn send(&mut self, mut response: Response) -> anyhow::Result<()> {
        response
            .headers
            .insert("Connection".to_string(), "close".to_string());
        self.conn.respond(&response).await
    }
}
