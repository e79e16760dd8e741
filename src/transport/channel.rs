//! In-process transport over tokio mpsc channels

use super::{IngestSource, QueryChannel};
use crate::ingest::EntityUpdate;
use crate::query::{QueryRequest, QueryResponse};
use crate::{Error, Result};
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Receiving half of an in-process ingestion channel
pub struct ChannelIngest {
    rx: mpsc::Receiver<Vec<u8>>,
}

/// Sending half of an in-process ingestion channel
#[derive(Clone)]
pub struct IngestSender {
    tx: mpsc::Sender<Vec<u8>>,
}

impl ChannelIngest {
    pub fn new(capacity: usize) -> (IngestSender, Self) {
        let (tx, rx) = mpsc::channel(capacity);
        (IngestSender { tx }, Self { rx })
    }
}

impl IngestSender {
    /// Send an already-encoded payload
    pub async fn send_raw(&self, payload: Vec<u8>) -> Result<()> {
        self.tx
            .send(payload)
            .await
            .map_err(|_| Error::Transport("ingestion channel closed".to_string()))
    }

    pub async fn send(&self, update: &EntityUpdate) -> Result<()> {
        self.send_raw(serde_json::to_vec(update)?).await
    }
}

#[async_trait]
impl IngestSource for ChannelIngest {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.rx.recv().await
    }
}

/// Service side of an in-process query channel
pub struct ChannelQueries {
    requests: mpsc::Receiver<Vec<u8>>,
    responses: mpsc::Sender<QueryResponse>,
}

/// Client side of an in-process query channel
pub struct QueryClient {
    requests: mpsc::Sender<Vec<u8>>,
    responses: mpsc::Receiver<QueryResponse>,
}

impl ChannelQueries {
    pub fn new(capacity: usize) -> (QueryClient, Self) {
        let (req_tx, req_rx) = mpsc::channel(capacity);
        let (resp_tx, resp_rx) = mpsc::channel(capacity);
        (
            QueryClient {
                requests: req_tx,
                responses: resp_rx,
            },
            Self {
                requests: req_rx,
                responses: resp_tx,
            },
        )
    }
}

#[async_trait]
impl QueryChannel for ChannelQueries {
    async fn recv(&mut self) -> Option<Vec<u8>> {
        self.requests.recv().await
    }

    async fn send(&mut self, response: QueryResponse) -> Result<()> {
        self.responses
            .send(response)
            .await
            .map_err(|_| Error::Transport("query response channel closed".to_string()))
    }
}

impl QueryClient {
    pub async fn send_raw(&self, payload: Vec<u8>) -> Result<()> {
        self.requests
            .send(payload)
            .await
            .map_err(|_| Error::Transport("query request channel closed".to_string()))
    }

    pub async fn send(&self, request: &QueryRequest) -> Result<()> {
        self.send_raw(serde_json::to_vec(request)?).await
    }

    /// Next response, or `None` once the service side is gone
    pub async fn recv(&mut self) -> Option<QueryResponse> {
        self.responses.recv().await
    }

    /// Send a request and wait for the response with the same request ID.
    ///
    /// Responses for other requests arriving in between are discarded.
    pub async fn call(&mut self, request: &QueryRequest) -> Result<QueryResponse> {
        self.send(request).await?;
        while let Some(resp) = self.responses.recv().await {
            if resp.request_id == request.request_id {
                return Ok(resp);
            }
        }
        Err(Error::Transport("query response channel closed".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fact::{predicates, Fact};

    #[tokio::test]
    async fn test_ingest_channel_delivers_payloads() {
        let (sender, mut source) = ChannelIngest::new(4);
        let update = EntityUpdate::new("a", vec![Fact::new("a", predicates::TITLE, "A")]);

        sender.send(&update).await.unwrap();
        drop(sender);

        let payload = source.recv().await.unwrap();
        assert_eq!(EntityUpdate::decode(&payload).unwrap(), update);
        assert!(source.recv().await.is_none());
    }

    #[tokio::test]
    async fn test_query_channel_round_trip() {
        let (mut client, mut service) = ChannelQueries::new(4);

        client.send(&QueryRequest::search("r1", "x")).await.unwrap();
        let payload = service.recv().await.unwrap();
        let req = QueryRequest::decode(&payload).unwrap();
        service.send(QueryResponse::ok(req.request_id, Vec::new(), 0)).await.unwrap();

        let resp = client.recv().await.unwrap();
        assert_eq!(resp.request_id, "r1");
    }
}
