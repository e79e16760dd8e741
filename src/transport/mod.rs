//! Transport ports
//!
//! The core never talks to a concrete message bus. It is driven through two
//! ports: a source of raw entity-update payloads and a request/response
//! channel for queries. Adapters here cover in-process channels and
//! JSON-lines streams; the HTTP front end lives in [`crate::server`].

pub mod channel;
pub mod lines;

use crate::query::QueryResponse;
use crate::Result;
use async_trait::async_trait;

pub use channel::{ChannelIngest, ChannelQueries, IngestSender, QueryClient};
pub use lines::{LineIngest, LineQueries};

/// Delivers raw entity-update payloads, at least once, in per-entity order.
#[async_trait]
pub trait IngestSource: Send {
    /// Next payload, or `None` once the source is exhausted
    async fn recv(&mut self) -> Option<Vec<u8>>;
}

/// Delivers raw query payloads and carries responses back, correlated by request ID.
#[async_trait]
pub trait QueryChannel: Send {
    /// Next request payload, or `None` once the channel is closed
    async fn recv(&mut self) -> Option<Vec<u8>>;

    /// Send a response for a previously received request
    async fn send(&mut self, response: QueryResponse) -> Result<()>;
}
