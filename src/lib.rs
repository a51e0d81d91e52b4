//! Waystone - Embedded Web Server
//!
//! Serves a website directory and application routes with per-client
//! sessions, CSRF checks on state-changing requests, and error pages.

pub mod config;
pub mod csrf;
pub mod fs;
pub mod http;
pub mod routing;
pub mod server;
pub mod session;
