//! ChannelManager — owns every active channel and routes replies back to
//! the channel a message arrived on.

use std::path::Path;

use futures::stream;

use crate::error::ChannelError;

use super::channel::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};

#[derive(Default)]
pub struct ChannelManager {
    channels: Vec<Box<dyn Channel>>,
}

impl ChannelManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, channel: Box<dyn Channel>) {
        tracing::debug!(channel = channel.name(), "Channel registered");
        self.channels.push(channel);
    }

    pub fn names(&self) -> Vec<&str> {
        self.channels.iter().map(|c| c.name()).collect()
    }

    fn get(&self, name: &str) -> Result<&dyn Channel, ChannelError> {
        self.channels
            .iter()
            .find(|c| c.name() == name)
            .map(|c| c.as_ref())
            .ok_or_else(|| ChannelError::UnknownChannel {
                name: name.to_string(),
            })
    }

    /// Start every channel and merge their streams.
    pub async fn start_all(&self) -> Result<MessageStream, ChannelError> {
        let mut streams = Vec::with_capacity(self.channels.len());
        for channel in &self.channels {
            let stream = channel.start().await?;
            tracing::info!(channel = channel.name(), "Channel started");
            streams.push(stream);
        }
        Ok(Box::pin(stream::select_all(streams)))
    }

    pub async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.get(&msg.channel)?.respond(msg, response).await
    }

    pub async fn send_document(
        &self,
        msg: &IncomingMessage,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        self.get(&msg.channel)?
            .send_document(msg, path, caption)
            .await
    }

    pub async fn send_status(
        &self,
        msg: &IncomingMessage,
        status: StatusUpdate,
    ) -> Result<(), ChannelError> {
        self.get(&msg.channel)?
            .send_status(status, &msg.metadata)
            .await
    }

    /// Health-check every channel, returning the names that failed.
    pub async fn health_check_all(&self) -> Vec<String> {
        let mut failed = Vec::new();
        for channel in &self.channels {
            if let Err(e) = channel.health_check().await {
                tracing::warn!(channel = channel.name(), "Health check failed: {e}");
                failed.push(channel.name().to_string());
            }
        }
        failed
    }

    pub async fn shutdown_all(&self) -> Result<(), ChannelError> {
        for channel in &self.channels {
            if let Err(e) = channel.shutdown().await {
                tracing::warn!(channel = channel.name(), "Shutdown failed: {e}");
            }
        }
        Ok(())
    }
}
