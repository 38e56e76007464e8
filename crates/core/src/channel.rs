//! Outbound messaging port. The provider wire format is deliberately opaque:
//! the rest of the system only knows "send text (and maybe media) to a
//! customer id".

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::session::CustomerId;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: CustomerId,
    pub body: String,
    pub media_url: Option<String>,
}

impl OutboundMessage {
    pub fn text(to: CustomerId, body: impl Into<String>) -> Self {
        Self { to, body: body.into(), media_url: None }
    }

    pub fn with_media(to: CustomerId, body: impl Into<String>, media_url: impl Into<String>) -> Self {
        Self { to, body: body.into(), media_url: Some(media_url.into()) }
    }
}

#[derive(Debug, Error)]
pub enum ChannelError {
    #[error("provider rejected send: {0}")]
    Rejected(String),
    #[error("provider unreachable: {0}")]
    Unreachable(String),
}

#[async_trait]
pub trait MessageChannel: Send + Sync {
    async fn send(&self, message: &OutboundMessage) -> Result<(), ChannelError>;
}

/// Drops every message; used when no provider credentials are configured.
#[derive(Default)]
pub struct NoopMessageChannel;

#[async_trait]
impl MessageChannel for NoopMessageChannel {
    async fn send(&self, _message: &OutboundMessage) -> Result<(), ChannelError> {
        Ok(())
    }
}
