//! Webmention sending and receiving
//!
//! Outbound: fetch target → discover endpoint → resolve → POST notification.
//! Inbound: verify → find target post → extract source entry → reconcile
//! author → store interaction.

pub mod discover;
pub mod error;
pub mod extract;
pub mod fetch;
pub mod html;
pub mod receive;
pub mod reconcile;
pub mod resolve;
pub mod send;
pub mod store;
pub mod verify;

pub use error::{FetchError, ResolveError, SendError, WebmentionError};
pub use fetch::{FetchRequest, FetchResponse, Fetcher, HttpMethod, ReqwestFetcher};
pub use receive::Receiver;
pub use send::{should_send, SendOutcome, Sender};
pub use store::StoreOutcome;
pub use verify::InboundRequest;
