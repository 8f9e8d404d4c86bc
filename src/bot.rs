//! Bot main loop — reads messages from every channel, runs them through the
//! order controller, and delivers replies and invoices.

use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;

use crate::channels::{ChannelManager, IncomingMessage, OutgoingResponse, StatusUpdate};
use crate::config::BotConfig;
use crate::error::{ChannelError, Error};
use crate::invoice::{InvoiceDocument, StagedDocument};
use crate::order::session::spawn_pruning_task;
use crate::order::{OrderController, Reply, SessionKey};

pub struct Bot {
    controller: Arc<OrderController>,
    channels: Arc<ChannelManager>,
    session_idle_timeout: Duration,
    prune_interval: Duration,
}

impl Bot {
    pub fn new(config: &BotConfig, controller: OrderController, channels: ChannelManager) -> Self {
        Self {
            controller: Arc::new(controller),
            channels: Arc::new(channels),
            session_idle_timeout: config.session_idle_timeout,
            prune_interval: config.prune_interval,
        }
    }

    pub fn controller(&self) -> &Arc<OrderController> {
        &self.controller
    }

    /// Run until Ctrl+C or until every channel stream ends.
    pub async fn run(self) -> Result<(), Error> {
        let mut message_stream = self.channels.start_all().await?;

        let pruning_handle = spawn_pruning_task(
            Arc::clone(self.controller.sessions()),
            self.session_idle_timeout,
            self.prune_interval,
        );

        tracing::info!(channels = ?self.channels.names(), "Bot ready and listening");

        loop {
            let message = tokio::select! {
                biased;
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Ctrl+C received, shutting down...");
                    break;
                }
                msg = message_stream.next() => {
                    match msg {
                        Some(m) => m,
                        None => {
                            tracing::info!("All channel streams ended, shutting down...");
                            break;
                        }
                    }
                }
            };

            if let Err(e) = self.handle_message(&message).await {
                tracing::error!(
                    channel = %message.channel,
                    user = %message.user_id,
                    "Error handling message: {}",
                    e
                );
            }
        }

        tracing::info!("Bot shutting down...");
        pruning_handle.abort();
        self.channels.shutdown_all().await?;

        Ok(())
    }

    /// Process one message end to end.
    pub async fn handle_message(&self, message: &IncomingMessage) -> Result<(), Error> {
        let key = SessionKey::new(&message.channel, &message.user_id);

        tracing::debug!(
            session = %key,
            chars = message.content.len(),
            "Received message"
        );

        match self.controller.handle(&key, &message.content).await {
            Reply::Text(text) => {
                self.channels
                    .respond(message, OutgoingResponse::text(text))
                    .await?;
            }
            Reply::Invoice { document, caption } => {
                self.deliver(message, &key, &document, &caption).await?;
            }
        }
        Ok(())
    }

    /// Stage the invoice on disk, send it, and report the outcome to the
    /// controller. The staged file is removed whatever the outcome.
    async fn deliver(
        &self,
        message: &IncomingMessage,
        key: &SessionKey,
        document: &InvoiceDocument,
        caption: &str,
    ) -> Result<(), Error> {
        if let Err(e) = self
            .channels
            .send_status(message, StatusUpdate::UploadingDocument)
            .await
        {
            tracing::debug!(session = %key, "Status update failed: {e}");
        }

        let sent = match StagedDocument::stage(document).await {
            Ok(staged) => {
                self.channels
                    .send_document(message, &staged.path(), Some(caption))
                    .await
            }
            Err(e) => Err(ChannelError::DeliveryFailed {
                name: message.channel.clone(),
                reason: format!("could not stage {}: {e}", document.file_name),
            }),
        };

        match sent {
            Ok(()) => {
                tracing::info!(
                    session = %key,
                    file = %document.file_name,
                    pages = document.page_count,
                    "Invoice delivered"
                );
                self.controller.delivery_succeeded(key).await;
            }
            Err(e) => {
                tracing::warn!(session = %key, "Invoice delivery failed: {e}");
                let text = self.controller.delivery_failed(key).await;
                self.channels
                    .respond(message, OutgoingResponse::text(text))
                    .await?;
            }
        }
        Ok(())
    }
}
