use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;

use crate::fs::{FileSystem, LocalFileSystem};
use crate::http::request::Params;
use crate::routing::extension::{ExtensionInfo, ExtensionRegistry, Loader, extension_of};
use crate::routing::handler::RouteHandler;
use crate::routing::packet::{ErrorKind, ResponsePacket};
use crate::session::Session;

/// Sub-directory of the website root holding HTML pages.
pub const PAGES_DIR: &str = "Pages";

/// Rewrites text content before it is sent, e.g. to inject a CSRF token.
pub type PostProcessor = Arc<dyn Fn(&Session, &str) -> String + Send + Sync>;

/// A registered (verb, path) binding.
#[derive(Debug, Clone)]
pub struct Route {
    /// Lower-cased HTTP verb.
    pub verb: String,
    /// Exact, case-sensitive request path.
    pub path: String,
    pub handler: RouteHandler,
}

impl Route {
    pub fn matches(&self, verb: &str, path: &str) -> bool {
        self.verb.eq_ignore_ascii_case(verb) && self.path == path
    }
}

/// Resolves a verb and path to a route handler or a static loader.
pub struct Router {
    website_path: PathBuf,
    extensions: ExtensionRegistry,
    routes: Vec<Route>,
    post_processor: PostProcessor,
    fs: Arc<dyn FileSystem>,
}

impl fmt::Debug for Router {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Router")
            .field("website_path", &self.website_path)
            .field("extensions", &self.extensions)
            .field("routes", &self.routes)
            .field("fs", &self.fs)
            .finish_non_exhaustive()
    }
}

impl Router {
    pub fn new(website_path: impl Into<PathBuf>) -> Self {
        Self {
            website_path: website_path.into(),
            extensions: ExtensionRegistry::default(),
            routes: Vec::new(),
            post_processor: Arc::new(|_: &Session, text: &str| text.to_string()),
            fs: Arc::new(LocalFileSystem),
        }
    }

    pub fn website_path(&self) -> &Path {
        &self.website_path
    }

    pub fn extensions_mut(&mut self) -> &mut ExtensionRegistry {
        &mut self.extensions
    }

    pub fn set_file_system(&mut self, fs: Arc<dyn FileSystem>) {
        self.fs = fs;
    }

    pub fn set_post_processor(&mut self, post_processor: PostProcessor) {
        self.post_processor = post_processor;
    }

    /// Registers a handler for `verb` and `path`.
    ///
    /// Fails if the same verb (ignoring case) and path are already bound.
    pub fn add_route(
        &mut self,
        verb: &str,
        path: &str,
        handler: RouteHandler,
    ) -> anyhow::Result<()> {
        if self.find_route(verb, path).is_some() {
            anyhow::bail!("route {} {} is already registered", verb.to_uppercase(), path);
        }

        self.routes.push(Route {
            verb: verb.to_ascii_lowercase(),
            path: path.to_string(),
            handler,
        });
        Ok(())
    }

    pub fn find_route(&self, verb: &str, path: &str) -> Option<&Route> {
        self.routes.iter().find(|r| r.matches(verb, path))
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Routes one request.
    ///
    /// A matching handler runs first; if it returns an empty packet the
    /// extension's loader serves the path instead. Missing files come back
    /// as error kinds, not as `Err`. `Err` is reserved for I/O failures.
    pub fn route(
        &self,
        session: &mut Session,
        verb: &str,
        path: &str,
        params: &Params,
    ) -> anyhow::Result<ResponsePacket> {
        let ext = extension_of(path);

        let Some(info) = self.extensions.resolve(ext) else {
            tracing::debug!(path, ext, "No loader for extension");
            return Ok(ResponsePacket::error(ErrorKind::UnknownType));
        };

        if let Some(route) = self.find_route(verb, path) {
            let response = route.handler.handle(session, params);
            if !response.is_empty() {
                return Ok(response);
            }
        }

        self.load(session, path, ext, info)
    }

    fn load(
        &self,
        session: &mut Session,
        path: &str,
        ext: &str,
        info: &ExtensionInfo,
    ) -> anyhow::Result<ResponsePacket> {
        match info.loader {
            Loader::Image => self.load_image(&self.resolve(path), info),
            Loader::Text => self.load_text(session, &self.resolve(path), info),
            Loader::Page => self.load_page(session, path, ext, info),
        }
    }

    /// Filesystem path of a request path below the website root.
    fn resolve(&self, path: &str) -> PathBuf {
        path.split('/')
            .filter(|segment| !segment.is_empty() && *segment != "..")
            .fold(self.website_path.clone(), |full, segment| full.join(segment))
    }

    fn load_image(
        &self,
        full_path: &Path,
        info: &ExtensionInfo,
    ) -> anyhow::Result<ResponsePacket> {
        if !self.fs.exists(full_path) {
            tracing::warn!(path = %full_path.display(), "File not found");
            return Ok(ResponsePacket::error(ErrorKind::FileNotFound));
        }

        let data = self
            .fs
            .read_bytes(full_path)
            .with_context(|| format!("reading {}", full_path.display()))?;
        Ok(ResponsePacket::binary(data, info.content_type.clone()))
    }

    fn load_text(
        &self,
        session: &Session,
        full_path: &Path,
        info: &ExtensionInfo,
    ) -> anyhow::Result<ResponsePacket> {
        if !self.fs.exists(full_path) {
            tracing::warn!(path = %full_path.display(), "File not found");
            return Ok(ResponsePacket::error(ErrorKind::FileNotFound));
        }

        let text = self
            .fs
            .read_text(full_path)
            .with_context(|| format!("reading {}", full_path.display()))?;
        let text = (self.post_processor)(session, &text);
        Ok(ResponsePacket::text(text, info.content_type.clone()))
    }

    fn load_page(
        &self,
        session: &mut Session,
        path: &str,
        ext: &str,
        info: &ExtensionInfo,
    ) -> anyhow::Result<ResponsePacket> {
        if path.trim_matches('/').is_empty() {
            return self.route(session, "get", "/index.html", &Params::new());
        }

        let path = path.trim_end_matches('/');
        let page = if ext.is_empty() {
            format!("/{PAGES_DIR}{path}.html")
        } else {
            format!("/{PAGES_DIR}{path}")
        };
        let full_path = self.resolve(&page);

        if !self.fs.exists(&full_path) {
            tracing::warn!(path = %full_path.display(), "Page not found");
            return Ok(ResponsePacket::error(ErrorKind::PageNotFound));
        }

        self.load_text(session, &full_path, info)
    }
}
