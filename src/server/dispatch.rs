//! Per-request pipeline.
//!
//! session lookup → on-request hook → parameter decoding → CSRF check
//! (non-GET) → routing → session touch → error page translation → response.

use std::borrow::Cow;
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;

use futures::FutureExt;
use tracing::{error, info, warn};

use super::Server;
use super::transport::RequestContext;
use crate::csrf::{self, CsrfCheck};
use crate::http::request::Request;
use crate::http::response::Response;
use crate::routing::{ErrorKind, ResponsePacket};
use crate::session::Session;

impl Server {
    /// Processes the request held by `ctx` and writes the response.
    ///
    /// Write failures are logged and swallowed.
    pub async fn serve<C: RequestContext>(&self, mut ctx: C) {
        let peer = ctx.remote_addr();
        let response = self.process(peer, ctx.request()).await;

        if let Err(e) = ctx.send(response).await {
            warn!(peer = %peer, error = %e, "Failed to write response");
        }
    }

    /// Runs the pipeline for one request and builds the HTTP response.
    ///
    /// This never fails: an error or panic anywhere below becomes a
    /// `ServerError` redirect.
    pub async fn process(&self, peer: SocketAddr, request: &Request) -> Response {
        info!(peer = %peer, method = ?request.method, path = %request.path, "Request");

        let outcome = AssertUnwindSafe(self.pipeline(peer, request))
            .catch_unwind()
            .await;

        let packet = match outcome {
            Ok(Ok(packet)) => packet,
            Ok(Err(e)) => {
                error!(peer = %peer, path = %request.path, error = ?e, "Request failed");
                ResponsePacket::error(ErrorKind::ServerError)
            }
            Err(_) => {
                error!(peer = %peer, path = %request.path, "Request pipeline panicked");
                ResponsePacket::error(ErrorKind::ServerError)
            }
        };

        self.respond(packet)
    }

    async fn pipeline(
        &self,
        peer: SocketAddr,
        request: &Request,
    ) -> anyhow::Result<ResponsePacket> {
        let handle = self.sessions.get_or_create(peer.ip()).await;
        let mut session = handle.lock().await;

        if let Some(hook) = &self.on_request {
            hook(&mut *session, request);
        }

        let routed = std::panic::catch_unwind(AssertUnwindSafe(|| {
            self.route_request(peer, &mut session, request)
        }))
        .unwrap_or_else(|_| Err(anyhow::anyhow!("route handler panicked")));

        // after routing, so guards saw the previous activity time
        session.touch();
        routed
    }

    fn route_request(
        &self,
        peer: SocketAddr,
        session: &mut Session,
        request: &Request,
    ) -> anyhow::Result<ResponsePacket> {
        let url = request.target_url()?;
        let params = request.params()?;
        let path = decode_path(url.path());
        let token_key = self.config.csrf_token_key.as_str();

        match csrf::verify(session, request.method, &params, token_key) {
            Ok(check) => {
                if check == CsrfCheck::Missing {
                    warn!(
                        peer = %peer,
                        method = ?request.method,
                        path = %path,
                        "Request carries no CSRF token"
                    );
                }
                self.router
                    .route(session, request.method.as_str(), &path, &params)
            }
            Err(kind) => {
                warn!(
                    peer = %peer,
                    method = ?request.method,
                    path = %path,
                    "CSRF token mismatch"
                );
                Ok(ResponsePacket::error(kind))
            }
        }
    }

    /// Turns a packet into the HTTP response, redirecting errors to their
    /// error page.
    fn respond(&self, packet: ResponsePacket) -> Response {
        if let Some(kind) = packet.error {
            let page = (self.error_pages)(kind);
            info!(error = %kind, redirect = %page, "Redirecting to error page");
            return Response::redirect(&page);
        }

        if let Some(target) = &packet.redirect {
            return Response::redirect(target);
        }

        let content_type = packet
            .content_type
            .as_deref()
            .unwrap_or("application/octet-stream");
        let content_type = match packet.encoding {
            Some(encoding) => format!("{content_type}; charset={encoding}"),
            None => content_type.to_string(),
        };

        Response::content(&content_type, packet.data.unwrap_or_default())
    }
}

/// Percent-decodes a normalized path so routes are registered in plain form.
///
/// A path that does not decode to UTF-8 is routed as sent.
fn decode_path(path: &str) -> Cow<'_, str> {
    urlencoding::decode(path).unwrap_or(Cow::Borrowed(path))
}
