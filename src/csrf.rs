//! Cross-site request forgery protection.
//!
//! Each session holds a random token. Pages embed it as a hidden form field
//! through the `@AntiForgeryToken@` marker, and every non-GET request must
//! echo it back.

use crate::http::request::{Method, Params};
use crate::routing::packet::ErrorKind;
use crate::session::Session;

/// Marker replaced by the hidden token field in text responses.
pub const TOKEN_MARKER: &str = "@AntiForgeryToken@";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CsrfCheck {
    /// GET requests are not checked.
    Skipped,
    Verified,
    /// The request carried no token. Let through with a warning.
    Missing,
}

/// Checks the token of a state-changing request against the session.
///
/// A request without the token field passes as [`CsrfCheck::Missing`];
/// callers log it. This leaves forms that omit the field unprotected.
pub fn verify(
    session: &Session,
    method: Method,
    params: &Params,
    token_key: &str,
) -> Result<CsrfCheck, ErrorKind> {
    if method == Method::GET {
        return Ok(CsrfCheck::Skipped);
    }

    let Some(sent) = params.get(token_key) else {
        return Ok(CsrfCheck::Missing);
    };

    match session.get(token_key) {
        Some(expected) if expected == sent => Ok(CsrfCheck::Verified),
        _ => Err(ErrorKind::ValidationError),
    }
}

/// Replaces every [`TOKEN_MARKER`] in `text` with a hidden input carrying
/// the session's token.
pub fn inject_token(session: &Session, text: &str, token_key: &str) -> String {
    if !text.contains(TOKEN_MARKER) {
        return text.to_string();
    }

    let token = session.get(token_key).unwrap_or_default();
    let field = format!(
        "<input name=\"{token_key}\" type=\"hidden\" value=\"{token}\" id=\"__csrf__\"/>"
    );
    text.replace(TOKEN_MARKER, &field)
}
