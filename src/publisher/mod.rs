//! Publishers transmit one encoded payload per tick.
//!
//! Every worker owns its publisher. Failures are reported to the caller and
//! never retried; the next tick is independent.

pub mod http;
pub mod log;
pub mod null;
pub mod tcp;
pub mod timescale;

use async_trait::async_trait;
use tracing::info;

use crate::config::{Config, Transport};
use crate::encoder::Payload;
use crate::error::PublishError;

pub use self::http::HttpPublisher;
pub use self::log::LogPublisher;
pub use self::null::NullPublisher;
pub use self::tcp::TcpPublisher;
pub use self::timescale::TimescalePublisher;

#[async_trait]
pub trait Publisher: Send {
    async fn publish(&mut self, payload: &Payload) -> Result<(), PublishError>;
}

/// Builds one publisher per worker. Resources shared between workers, such
/// as the Postgres pool, are set up once in [`PublisherFactory::connect`].
#[derive(Debug, Clone)]
pub enum PublisherFactory {
    Http { endpoint: String },
    Tcp { endpoint: String },
    Timescale(TimescalePublisher),
    Log,
    Null,
}

impl PublisherFactory {
    pub async fn connect(config: &Config) -> anyhow::Result<Self> {
        let endpoint = config.endpoint().to_string();
        let factory = match config.transport()? {
            Transport::Http => PublisherFactory::Http { endpoint },
            Transport::Tcp => PublisherFactory::Tcp { endpoint },
            Transport::Timescale => {
                PublisherFactory::Timescale(TimescalePublisher::connect(&endpoint).await?)
            }
            Transport::Log => PublisherFactory::Log,
            Transport::Null => PublisherFactory::Null,
        };

        info!("Publishing with the {} transport", factory.transport());
        Ok(factory)
    }

    pub fn transport(&self) -> Transport {
        match self {
            PublisherFactory::Http { .. } => Transport::Http,
            PublisherFactory::Tcp { .. } => Transport::Tcp,
            PublisherFactory::Timescale(_) => Transport::Timescale,
            PublisherFactory::Log => Transport::Log,
            PublisherFactory::Null => Transport::Null,
        }
    }

    pub fn create(&self) -> Result<Box<dyn Publisher>, PublishError> {
        Ok(match self {
            PublisherFactory::Http { endpoint } => Box::new(HttpPublisher::new(endpoint)?),
            PublisherFactory::Tcp { endpoint } => Box::new(TcpPublisher::new(endpoint)),
            PublisherFactory::Timescale(publisher) => Box::new(publisher.clone()),
            PublisherFactory::Log => Box::new(LogPublisher::stdout()),
            PublisherFactory::Null => Box::new(NullPublisher),
        })
    }
}
