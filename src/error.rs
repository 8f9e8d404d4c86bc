//! Error types for the invoice bot.

/// Top-level error type for the bot.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Channel error: {0}")]
    Channel(#[from] ChannelError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Channel-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("Channel {name} failed to start: {reason}")]
    StartupFailed { name: String, reason: String },

    #[error("Failed to send response on channel {name}: {reason}")]
    SendFailed { name: String, reason: String },

    #[error("Failed to deliver document on channel {name}: {reason}")]
    DeliveryFailed { name: String, reason: String },

    #[error("No channel registered under {name}")]
    UnknownChannel { name: String },

    #[error("Channel health check failed: {name}")]
    HealthCheckFailed { name: String },
}

/// Recoverable input errors raised while collecting an order.
///
/// Every variant maps to a re-prompt of the current step.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum OrderError {
    #[error("Invalid product count {input:?}: expected a whole number from 1 to {max}")]
    InvalidCount { input: String, max: usize },

    #[error("Invalid amount {input:?}")]
    InvalidAmount { input: String },

    #[error("Invalid shipping fee {input:?}")]
    InvalidShipping { input: String },

    #[error("Product name is empty")]
    EmptyProductName,

    #[error("Delivery address is empty")]
    EmptyAddress,

    #[error("Order already in phase {from}, cannot transition to {to}")]
    InvalidTransition { from: String, to: String },
}

/// Invoice rendering errors.
#[derive(Debug, thiserror::Error)]
pub enum RenderError {
    #[error("PDF encoding failed: {0}")]
    Pdf(String),
}
