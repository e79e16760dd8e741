//! JSON-lines transport: one payload per line over any async byte stream.
//!
//! Used to replay recorded entity updates from a file and to serve queries
//! over stdin/stdout.

use super::{IngestSource, QueryChannel};
use crate::query::QueryResponse;
use crate::Result;
use async_trait::async_trait;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt, Lines};

async fn next_payload<R>(lines: &mut Lines<R>) -> Option<Vec<u8>>
where
    R: AsyncBufRead + Unpin,
{
    loop {
        match lines.next_line().await {
            Ok(Some(line)) => {
                if line.trim().is_empty() {
                    continue;
                }
                return Some(line.into_bytes());
            }
            Ok(None) => return None,
            Err(e) => {
                tracing::warn!(error = %e, "line transport read failed");
                return None;
            }
        }
    }
}

/// Entity updates read line by line
pub struct LineIngest<R> {
    lines: Lines<R>,
}

impl<R> LineIngest<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    pub fn new(reader: R) -> Self {
        Self { lines: reader.lines() }
    }
}

#[async_trait]
impl<R> IngestSource for LineIngest<R>
where
    R: AsyncBufRead + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Vec<u8>> {
        next_payload(&mut self.lines).await
    }
}

/// Query requests read line by line, responses written one per line
pub struct LineQueries<R, W> {
    lines: Lines<R>,
    writer: W,
}

impl<R, W> LineQueries<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    pub fn new(reader: R, writer: W) -> Self {
        Self {
            lines: reader.lines(),
            writer,
        }
    }

    pub fn into_writer(self) -> W {
        self.writer
    }
}

#[async_trait]
impl<R, W> QueryChannel for LineQueries<R, W>
where
    R: AsyncBufRead + Unpin + Send,
    W: AsyncWrite + Unpin + Send,
{
    async fn recv(&mut self) -> Option<Vec<u8>> {
        next_payload(&mut self.lines).await
    }

    async fn send(&mut self, response: QueryResponse) -> Result<()> {
        let mut line = serde_json::to_vec(&response)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        self.writer.flush().await?;
        Ok(())
    }
}
