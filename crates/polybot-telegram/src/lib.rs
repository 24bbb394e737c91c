pub mod adapter;
pub mod convert;
pub mod error;
pub mod guard;
pub mod handler;
pub mod router;
pub mod send;
pub mod transport;

#[cfg(test)]
mod testing;

pub use adapter::TelegramAdapter;
pub use convert::incoming_from;
pub use error::{ErrorKind, HandlerError, TelegramError, TransportError};
pub use guard::{SessionGuard, SessionPermit};
pub use handler::{build_handler, DetectionServices, MessageHandler, Outcome};
pub use transport::{DownloadedPhoto, TelegramTransport, Transport};
