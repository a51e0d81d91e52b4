use std::fmt;

use bytes::Bytes;

/// Why a request could not be served normally.
///
/// The "OK" case is the absence of an error: `ResponsePacket::error` is `None`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    ExpiredSession,
    NotAuthorized,
    FileNotFound,
    PageNotFound,
    ServerError,
    UnknownType,
    ValidationError,
}

impl ErrorKind {
    pub const ALL: [ErrorKind; 7] = [
        ErrorKind::ExpiredSession,
        ErrorKind::NotAuthorized,
        ErrorKind::FileNotFound,
        ErrorKind::PageNotFound,
        ErrorKind::ServerError,
        ErrorKind::UnknownType,
        ErrorKind::ValidationError,
    ];

    /// Lower camel case name, as used in error page file names.
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorKind::ExpiredSession => "expiredSession",
            ErrorKind::NotAuthorized => "notAuthorized",
            ErrorKind::FileNotFound => "fileNotFound",
            ErrorKind::PageNotFound => "pageNotFound",
            ErrorKind::ServerError => "serverError",
            ErrorKind::UnknownType => "unknownType",
            ErrorKind::ValidationError => "validationError",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of handling one request.
///
/// Only one of `redirect`, `data` and `error` is meaningful at a time. A
/// redirect wins over data; an error is turned into a redirect by the
/// dispatcher. A packet with none of them set is *empty*, which tells the
/// router to fall back to the static loader.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResponsePacket {
    pub redirect: Option<String>,
    pub data: Option<Bytes>,
    pub content_type: Option<String>,
    /// Text encoding of `data`, if it is text.
    pub encoding: Option<&'static str>,
    pub error: Option<ErrorKind>,
}

impl ResponsePacket {
    /// Defers to the static loader for the requested path.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn redirect(path: impl Into<String>) -> Self {
        Self {
            redirect: Some(path.into()),
            ..Self::default()
        }
    }

    pub fn error(kind: ErrorKind) -> Self {
        Self {
            error: Some(kind),
            ..Self::default()
        }
    }

    /// Binary content, served as is.
    pub fn binary(data: impl Into<Bytes>, content_type: impl Into<String>) -> Self {
        Self {
            data: Some(data.into()),
            content_type: Some(content_type.into()),
            ..Self::default()
        }
    }

    /// UTF-8 text content.
    pub fn text(text: impl Into<String>, content_type: impl Into<String>) -> Self {
        Self {
            data: Some(Bytes::from(text.into())),
            content_type: Some(content_type.into()),
            encoding: Some("utf-8"),
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.redirect.is_none() && self.data.is_none() && self.error.is_none()
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}
