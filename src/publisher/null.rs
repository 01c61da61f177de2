use async_trait::async_trait;

use super::Publisher;
use crate::encoder::Payload;
use crate::error::PublishError;

/// Discards every payload
#[derive(Debug, Default, Clone, Copy)]
pub struct NullPublisher;

#[async_trait]
impl Publisher for NullPublisher {
    async fn publish(&mut self, _payload: &Payload) -> Result<(), PublishError> {
        Ok(())
    }
}
