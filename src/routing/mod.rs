//! Request routing
//!
//! Resolves a verb and path to either an application route handler or one
//! of the static loaders picked by file extension.

pub mod extension;
pub mod handler;
pub mod packet;
pub mod router;

pub use extension::{ExtensionInfo, ExtensionRegistry, Loader};
pub use handler::{Callback, HandlerKind, RouteHandler};
pub use packet::{ErrorKind, ResponsePacket};
pub use router::{PostProcessor, Route, Router};
