use async_trait::async_trait;
use std::time::Duration;
use tracing::trace;

use super::Publisher;
use crate::encoder::Payload;
use crate::error::PublishError;

const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);
const IDLE_TIMEOUT: Duration = Duration::from_millis(200);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(1);

/// POSTs each payload as one JSON body
#[derive(Debug, Clone)]
pub struct HttpPublisher {
    client: reqwest::Client,
    endpoint: String,
}

impl HttpPublisher {
    pub fn new(endpoint: &str) -> Result<Self, PublishError> {
        let client = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .pool_idle_timeout(IDLE_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(Self {
            client,
            endpoint: endpoint.to_string(),
        })
    }
}

#[async_trait]
impl Publisher for HttpPublisher {
    async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError> {
        if let Payload::Samples(_) = payload {
            return Err(PublishError::Unsupported(
                "HTTP publisher only sends encoded payloads",
            ));
        }

        let response = self
            .client
            .post(&self.endpoint)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(payload.to_bytes())
            .send()
            .await?;

        let status = response.status();
        trace!(endpoint = %self.endpoint, %status, "Payload posted");
        if status.is_success() {
            Ok(())
        } else {
            Err(PublishError::Status(status.as_u16()))
        }
    }
}
