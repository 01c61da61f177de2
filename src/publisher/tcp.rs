use async_trait::async_trait;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

use super::Publisher;
use crate::encoder::Payload;
use crate::error::PublishError;

const DIAL_TIMEOUT: Duration = Duration::from_millis(200);
const WRITE_TIMEOUT: Duration = Duration::from_millis(400);

/// One persistent connection, dialed lazily and dropped on the first error
#[derive(Debug)]
pub struct TcpPublisher {
    endpoint: String,
    conn: Option<TcpStream>,
}

impl TcpPublisher {
    pub fn new(endpoint: &str) -> Self {
        Self {
            endpoint: endpoint.to_string(),
            conn: None,
        }
    }

    pub fn is_connected(&self) -> bool {
        self.conn.is_some()
    }

    async fn dial(&self) -> Result<TcpStream, PublishError> {
        let stream = timeout(DIAL_TIMEOUT, TcpStream::connect(&self.endpoint))
            .await
            .map_err(|_| PublishError::Timeout(DIAL_TIMEOUT))
            .and_then(|res| res.map_err(PublishError::from))
            .map_err(|e| {
                debug!("Error establishing tcp connection to {}: {}", self.endpoint, e);
                e
            })?;

        stream.set_nodelay(true)?;
        debug!(endpoint = %self.endpoint, "TCP connection established");
        Ok(stream)
    }
}

async fn write_segments(stream: &mut TcpStream, segments: &[bytes::Bytes]) -> std::io::Result<()> {
    for segment in segments {
        stream.write_all(segment).await?;
    }
    Ok(())
}

#[async_trait]
impl Publisher for TcpPublisher {
    async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError> {
        let Payload::Segments(segments) = payload else {
            return Err(PublishError::Unsupported(
                "TCP publisher only sends encoded payloads",
            ));
        };

        let mut stream = match self.conn.take() {
            Some(stream) => stream,
            None => self.dial().await?,
        };

        match timeout(WRITE_TIMEOUT, write_segments(&mut stream, segments)).await {
            Ok(Ok(())) => {
                self.conn = Some(stream);
                Ok(())
            }
            Ok(Err(e)) => Err(e.into()),
            Err(_) => Err(PublishError::Timeout(WRITE_TIMEOUT)),
        }
    }
}
