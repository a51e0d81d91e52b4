//! File extension registry.
//!
//! Maps a bare extension (`"png"`, not `".png"`) to the content type served
//! for it and the loader that reads it. The empty key covers extensionless
//! requests, which are treated as pages.

use std::collections::HashMap;

/// How a resolved file is turned into a response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Loader {
    /// Raw bytes, no post-processing.
    Image,
    /// UTF-8 text passed through the post-processor.
    Text,
    /// HTML page under the `Pages` sub-root. Adds `.html` when the request
    /// has no extension and maps the site root to `index.html`.
    Page,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtensionInfo {
    pub content_type: String,
    pub loader: Loader,
}

#[derive(Debug, Clone)]
pub struct ExtensionRegistry {
    map: HashMap<String, ExtensionInfo>,
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register("ico", "image/x-icon", Loader::Image);
        registry.register("png", "image/png", Loader::Image);
        registry.register("jpg", "image/jpeg", Loader::Image);
        registry.register("gif", "image/gif", Loader::Image);
        registry.register("bmp", "image/bmp", Loader::Image);
        registry.register("html", "text/html", Loader::Page);
        registry.register("css", "text/css", Loader::Text);
        registry.register("js", "text/javascript", Loader::Text);
        registry.register("", "text/html", Loader::Page);
        registry
    }
}

impl ExtensionRegistry {
    pub fn empty() -> Self {
        Self {
            map: HashMap::new(),
        }
    }

    /// Adds or replaces the entry for `ext`.
    pub fn register(
        &mut self,
        ext: impl Into<String>,
        content_type: impl Into<String>,
        loader: Loader,
    ) {
        self.map.insert(
            ext.into(),
            ExtensionInfo {
                content_type: content_type.into(),
                loader,
            },
        );
    }

    /// Case-sensitive lookup of a bare extension.
    pub fn resolve(&self, ext: &str) -> Option<&ExtensionInfo> {
        self.map.get(ext)
    }
}

/// Extension of the last path segment, without the dot.
///
/// ```
/// # use waystone::routing::extension::extension_of;
/// assert_eq!(extension_of("/img/logo.png"), "png");
/// assert_eq!(extension_of("/v1.2/about"), "");
/// assert_eq!(extension_of("/"), "");
/// ```
pub fn extension_of(path: &str) -> &str {
    let segment = path.rsplit('/').next().unwrap_or(path);
    match segment.rfind('.') {
        Some(idx) if idx > 0 => &segment[idx + 1..],
        _ => "",
    }
}
