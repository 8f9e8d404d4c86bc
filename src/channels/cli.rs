//! CLI channel — stdin/stdout REPL for taking orders locally.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::stream;
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::channels::{Channel, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate};
use crate::error::ChannelError;

/// Identity used for every message typed on the terminal.
pub const CLI_USER: &str = "local-user";

/// A typed `\n` becomes a line break, so one terminal line can carry a
/// multi-line address.
fn unescape_line(line: &str) -> String {
    line.replace("\\n", "\n")
}

/// Reads lines from stdin and prints replies to stdout. Documents are copied
/// into `output_dir` and their path is printed.
pub struct CliChannel {
    output_dir: PathBuf,
}

impl CliChannel {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    /// Copy `path` into the output directory, keeping its file name.
    async fn save_document(&self, path: &Path) -> Result<PathBuf, ChannelError> {
        let file_name = path.file_name().ok_or_else(|| ChannelError::DeliveryFailed {
            name: "cli".into(),
            reason: format!("{} has no file name", path.display()),
        })?;
        let target = self.output_dir.join(file_name);

        let delivery_failed = |e: std::io::Error| ChannelError::DeliveryFailed {
            name: "cli".into(),
            reason: e.to_string(),
        };
        tokio::fs::create_dir_all(&self.output_dir)
            .await
            .map_err(delivery_failed)?;
        tokio::fs::copy(path, &target)
            .await
            .map_err(delivery_failed)?;
        Ok(target)
    }
}

#[async_trait]
impl Channel for CliChannel {
    fn name(&self) -> &str {
        "cli"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let stdin = tokio::io::stdin();
            let reader = BufReader::new(stdin);
            let mut lines = reader.lines();

            eprint!("> ");

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        let msg = IncomingMessage::new("cli", CLI_USER, unescape_line(&line));
                        if tx.send(msg).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break, // EOF
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        let stream = stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|msg| (msg, rx))
        });

        Ok(Box::pin(stream))
    }

    async fn respond(
        &self,
        _msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        println!("\n{}\n", response.content);
        eprint!("> ");
        Ok(())
    }

    async fn send_document(
        &self,
        _msg: &IncomingMessage,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        let saved = self.save_document(path).await?;
        tracing::info!(path = %saved.display(), "Document saved");
        println!("\n📄 {}", saved.display());
        if let Some(caption) = caption {
            println!("{caption}");
        }
        println!();
        eprint!("> ");
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        match status {
            StatusUpdate::UploadingDocument => eprintln!("⏳ Preparing document..."),
        }
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[tokio::test]
    async fn send_document_copies_into_output_dir() {
        let src_dir = TempDir::new().unwrap();
        let out_dir = TempDir::new().unwrap();
        let src = src_dir.path().join("bill_local-user.pdf");
        std::fs::write(&src, b"%PDF-1.3").unwrap();

        let out = out_dir.path().join("bills");
        let ch = CliChannel::new(&out);
        let msg = IncomingMessage::new("cli", CLI_USER, "25");
        ch.send_document(&msg, &src, Some("Here is your bill."))
            .await
            .unwrap();

        let saved = out.join("bill_local-user.pdf");
        assert_eq!(std::fs::read(saved).unwrap(), b"%PDF-1.3");
    }

    #[tokio::test]
    async fn send_document_missing_source_fails() {
        let out_dir = TempDir::new().unwrap();
        let ch = CliChannel::new(out_dir.path());
        let msg = IncomingMessage::new("cli", CLI_USER, "25");
        let err = ch
            .send_document(&msg, Path::new("/nonexistent/bill.pdf"), None)
            .await
            .unwrap_err();
        assert!(matches!(err, ChannelError::DeliveryFailed { .. }));
    }

    #[test]
    fn escaped_newlines_split_address_lines() {
        assert_eq!(
            unescape_line(r"12 Lake Road\nChennai 600001"),
            "12 Lake Road\nChennai 600001"
        );
        assert_eq!(unescape_line("Saree"), "Saree");
    }

    #[test]
    fn cli_channel_name() {
        assert_eq!(CliChannel::new("out").name(), "cli");
    }
}
