//! HTTP wire model.
//!
//! - **`request`**: request representation and parameter decoding
//! - **`parser`**: parses incoming HTTP requests from byte buffers
//! - **`response`**: response representation with builder pattern
//! - **`writer`**: serializes and writes responses to the client
//! - **`connection`**: reads one request from a stream and writes its response
//!
//! The server answers exactly one request per connection:
//!
//! ```text
//!        ┌─────────────┐
//!        │   Reading   │ ← buffer until a full request parses
//!        └──────┬──────┘
//!               │ Request received
//!               ▼
//!        ┌──────────────────┐
//!        │   Dispatching    │ ← session, CSRF, routing
//!        └──────┬───────────┘
//!               │ Response ready
//!               ▼
//!        ┌──────────────────┐
//!        │    Writing       │ ← send response, then close
//!        └──────────────────┘
//! ```

pub mod connection;
pub mod parser;
pub mod request;
pub mod response;
pub mod writer;
