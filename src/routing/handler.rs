//! Route handlers.
//!
//! A handler is an application callback behind an ordered list of guards.
//! Guards run first; the first one that fails short-circuits with its error
//! kind and the callback is not invoked.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::http::request::Params;
use crate::routing::packet::{ErrorKind, ResponsePacket};
use crate::session::Session;

/// Application callback invoked for a matched route.
pub type Callback = Arc<dyn Fn(&mut Session, &Params) -> ResponsePacket + Send + Sync>;

/// Access policy chosen when registering a route.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandlerKind {
    /// Always visible.
    Anonymous,
    /// Visible to authorized sessions only.
    Authenticated,
    /// Visible to authorized sessions that have not expired.
    AuthenticatedExpirable,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Guard {
    Authorized,
    NotExpired(Duration),
}

impl Guard {
    fn check(&self, session: &mut Session) -> Result<(), ErrorKind> {
        match *self {
            Guard::Authorized if !session.authorized => Err(ErrorKind::NotAuthorized),
            Guard::NotExpired(expiration) if session.is_expired(expiration) => {
                session.authorized = false;
                Err(ErrorKind::ExpiredSession)
            }
            _ => Ok(()),
        }
    }
}

#[derive(Clone)]
pub struct RouteHandler {
    kind: HandlerKind,
    guards: Vec<Guard>,
    callback: Callback,
}

impl fmt::Debug for RouteHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteHandler")
            .field("kind", &self.kind)
            .field("guards", &self.guards)
            .finish_non_exhaustive()
    }
}

impl RouteHandler {
    /// Builds a handler of `kind`. `expiration` is only consulted by
    /// [`HandlerKind::AuthenticatedExpirable`].
    pub fn new<F>(kind: HandlerKind, expiration: Duration, callback: F) -> Self
    where
        F: Fn(&mut Session, &Params) -> ResponsePacket + Send + Sync + 'static,
    {
        let guards = match kind {
            HandlerKind::Anonymous => vec![],
            HandlerKind::Authenticated => vec![Guard::Authorized],
            // expiry is checked first so it can revoke authorization
            HandlerKind::AuthenticatedExpirable => {
                vec![Guard::NotExpired(expiration), Guard::Authorized]
            }
        };

        Self {
            kind,
            guards,
            callback: Arc::new(callback),
        }
    }

    pub fn kind(&self) -> HandlerKind {
        self.kind
    }

    pub fn handle(&self, session: &mut Session, params: &Params) -> ResponsePacket {
        for guard in &self.guards {
            if let Err(kind) = guard.check(session) {
                tracing::debug!(error = %kind, "Route guard rejected request");
                return ResponsePacket::error(kind);
            }
        }

        (self.callback)(session, params)
    }
}
