use invoice_bot::bot::Bot;
use invoice_bot::channels::{ChannelManager, CliChannel, TelegramChannel};
use invoice_bot::config::BotConfig;
use invoice_bot::error::ConfigError;
use invoice_bot::invoice::InvoiceRenderer;
use invoice_bot::order::{OrderController, SessionStore};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = BotConfig::from_env().unwrap_or_else(|e| {
        eprintln!("Error: {e}");
        eprintln!("  export TELEGRAM_BOT_TOKEN=123456:ABC-...   (or INVOICE_BOT_CLI=1)");
        std::process::exit(1);
    });

    // Keep the guard alive so buffered file logs are flushed on exit
    let _log_guard = init_tracing(&config)?;

    eprintln!("🧾 Invoice Bot v{}", env!("CARGO_PKG_VERSION"));
    eprintln!("   Business: {}", config.business.name);
    eprintln!("   Logo: {}", config.logo_path.display());
    eprintln!("   Max products per order: {}", config.max_products);
    eprintln!(
        "   Idle sessions expire after {}s",
        config.session_idle_timeout.as_secs()
    );
    if let Some(ref dir) = config.log_dir {
        eprintln!("   Log dir: {}", dir.display());
    }

    // ── Channels ────────────────────────────────────────────────────────
    let mut channels = ChannelManager::new();

    if let Some(ref token) = config.telegram_token {
        let allowed = &config.telegram_allowed_users;
        eprintln!(
            "   Telegram: enabled (allowed: {})",
            if allowed.iter().any(|u| u == "*") {
                "everyone".to_string()
            } else if allowed.is_empty() {
                "none (deny all)".to_string()
            } else {
                allowed.join(", ")
            }
        );
        channels.add(Box::new(TelegramChannel::new(
            token.clone(),
            allowed.clone(),
        )));
    }

    if config.cli_enabled {
        eprintln!(
            "   CLI: enabled (bills saved to {}; type \\n for a line break)",
            config.output_dir.display()
        );
        channels.add(Box::new(CliChannel::new(config.output_dir.clone())));
    }

    for failed in channels.health_check_all().await {
        eprintln!("   Warning: {failed} health check failed");
    }

    eprintln!("   Channels: {}", channels.names().join(", "));
    eprintln!("   Send /start to begin an order.\n");

    // ── Orders ──────────────────────────────────────────────────────────
    let renderer = InvoiceRenderer::new(config.business.clone(), config.logo_path.clone());
    let controller = OrderController::new(SessionStore::new(), renderer, config.max_products);

    let bot = Bot::new(&config, controller, channels);
    bot.run().await?;

    Ok(())
}

/// Console logging always; a daily rolling file too when a log dir is set.
fn init_tracing(
    config: &BotConfig,
) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>, ConfigError> {
    let filter = || EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    match config.log_dir {
        Some(ref dir) => {
            std::fs::create_dir_all(dir)?;
            let appender = tracing_appender::rolling::daily(dir, "invoice-bot.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let file = tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_ansi(false)
                .with_writer(writer);
            tracing_subscriber::registry()
                .with(filter())
                .with(console)
                .with(file)
                .init();
            Ok(Some(guard))
        }
        None => {
            tracing_subscriber::registry()
                .with(filter())
                .with(console)
                .init();
            Ok(None)
        }
    }
}
