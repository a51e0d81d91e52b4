//! The server instance and its registration API.
//!
//! A [`Server`] owns its configuration, router, and session store. Routes and
//! hooks are registered through [`ServerBuilder`]; after `build` the route
//! table is read-only and the server is shared behind an `Arc`.

pub mod dispatch;
pub mod listener;
pub mod transport;

use std::fmt;
use std::sync::Arc;

use crate::config::Config;
use crate::csrf;
use crate::fs::FileSystem;
use crate::http::request::{Params, Request};
use crate::routing::{
    ErrorKind, HandlerKind, Loader, PostProcessor, ResponsePacket, RouteHandler, Router,
};
use crate::session::{Session, SessionStore};

/// Maps an error kind to the path of the page explaining it.
pub type ErrorPageResolver = Arc<dyn Fn(ErrorKind) -> String + Send + Sync>;

/// Called once per request, after the session is resolved and before the
/// request is parsed further.
pub type OnRequest = Arc<dyn Fn(&mut Session, &Request) + Send + Sync>;

/// `/ErrorPages/<kind>.html`, e.g. `/ErrorPages/pageNotFound.html`.
pub fn default_error_page(kind: ErrorKind) -> String {
    format!("/ErrorPages/{}.html", kind.as_str())
}

pub struct Server {
    config: Config,
    router: Router,
    sessions: SessionStore,
    error_pages: ErrorPageResolver,
    on_request: Option<OnRequest>,
}

impl fmt::Debug for Server {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Server")
            .field("config", &self.config)
            .field("router", &self.router)
            .field("sessions", &self.sessions)
            .finish_non_exhaustive()
    }
}

impl Server {
    pub fn builder(config: Config) -> ServerBuilder {
        ServerBuilder::new(config)
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }
}

pub struct ServerBuilder {
    config: Config,
    router: Router,
    error_pages: ErrorPageResolver,
    on_request: Option<OnRequest>,
    post_processor: Option<PostProcessor>,
}

impl fmt::Debug for ServerBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ServerBuilder")
            .field("config", &self.config)
            .field("router", &self.router)
            .finish_non_exhaustive()
    }
}

impl ServerBuilder {
    pub fn new(config: Config) -> Self {
        let router = Router::new(config.website_path.clone());
        Self {
            config,
            router,
            error_pages: Arc::new(default_error_page),
            on_request: None,
            post_processor: None,
        }
    }

    /// Binds `callback` to `verb` and `path` behind the guards of `kind`.
    pub fn route<F>(
        mut self,
        verb: &str,
        path: &str,
        kind: HandlerKind,
        callback: F,
    ) -> anyhow::Result<Self>
    where
        F: Fn(&mut Session, &Params) -> ResponsePacket + Send + Sync + 'static,
    {
        let handler = RouteHandler::new(kind, self.config.session_expiration(), callback);
        self.router.add_route(verb, path, handler)?;
        Ok(self)
    }

    pub fn error_pages<F>(mut self, resolver: F) -> Self
    where
        F: Fn(ErrorKind) -> String + Send + Sync + 'static,
    {
        self.error_pages = Arc::new(resolver);
        self
    }

    /// Replaces the default post-processor, which injects the CSRF token.
    pub fn post_processor<F>(mut self, post_processor: F) -> Self
    where
        F: Fn(&Session, &str) -> String + Send + Sync + 'static,
    {
        self.post_processor = Some(Arc::new(post_processor));
        self
    }

    pub fn on_request<F>(mut self, hook: F) -> Self
    where
        F: Fn(&mut Session, &Request) + Send + Sync + 'static,
    {
        self.on_request = Some(Arc::new(hook));
        self
    }

    pub fn file_system(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.router.set_file_system(fs);
        self
    }

    pub fn extension(mut self, ext: &str, content_type: &str, loader: Loader) -> Self {
        self.router.extensions_mut().register(ext, content_type, loader);
        self
    }

    pub fn build(mut self) -> anyhow::Result<Arc<Server>> {
        self.config.validate()?;

        let post_processor = match self.post_processor {
            Some(post_processor) => post_processor,
            None => {
                let key = self.config.csrf_token_key.clone();
                let inject: PostProcessor = Arc::new(move |session: &Session, text: &str| {
                    csrf::inject_token(session, text, &key)
                });
                inject
            }
        };
        self.router.set_post_processor(post_processor);

        let sessions = SessionStore::new(self.config.csrf_token_key.as_str());

        Ok(Arc::new(Server {
            config: self.config,
            router: self.router,
            sessions,
            error_pages: self.error_pages,
            on_request: self.on_request,
        }))
    }
}
