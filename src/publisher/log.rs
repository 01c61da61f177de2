use async_trait::async_trait;
use tokio::io::{AsyncWrite, AsyncWriteExt, Stdout};

use super::Publisher;
use crate::encoder::Payload;
use crate::error::PublishError;

/// Writes payloads to a local sink, stdout by default
#[derive(Debug)]
pub struct LogPublisher<W = Stdout> {
    out: W,
}

impl LogPublisher<Stdout> {
    pub fn stdout() -> Self {
        Self {
            out: tokio::io::stdout(),
        }
    }
}

impl<W: AsyncWrite + Unpin + Send> LogPublisher<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    pub fn into_inner(self) -> W {
        self.out
    }
}

#[async_trait]
impl<W: AsyncWrite + Unpin + Send> Publisher for LogPublisher<W> {
    async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError> {
        let mut body = payload.to_bytes().to_vec();
        if !body.ends_with(b"\n") {
            body.push(b'\n');
        }
        self.out.write_all(&body).await?;
        self.out.flush().await?;
        Ok(())
    }
}
