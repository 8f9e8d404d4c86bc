//! End-to-end order conversations through the bot loop with an in-memory
//! channel that records everything the bot sends.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::stream;

use invoice_bot::bot::Bot;
use invoice_bot::channels::{
    Channel, ChannelManager, IncomingMessage, MessageStream, OutgoingResponse, StatusUpdate,
};
use invoice_bot::config::BotConfig;
use invoice_bot::error::ChannelError;
use invoice_bot::invoice::{BusinessProfile, InvoiceRenderer};
use invoice_bot::order::{OrderController, OrderPhase, SessionKey, SessionStore};

#[derive(Debug, Clone)]
enum Sent {
    Text {
        user: String,
        content: String,
    },
    Document {
        user: String,
        path: PathBuf,
        bytes: Vec<u8>,
        caption: Option<String>,
    },
}

impl Sent {
    fn user(&self) -> &str {
        match self {
            Sent::Text { user, .. } | Sent::Document { user, .. } => user,
        }
    }
}

#[derive(Default)]
struct Recorder {
    sent: Mutex<Vec<Sent>>,
    statuses: Mutex<Vec<StatusUpdate>>,
    /// Number of upcoming document sends to fail.
    fail_documents: AtomicUsize,
    /// Staged paths handed to a failing send.
    failed_paths: Mutex<Vec<PathBuf>>,
}

impl Recorder {
    fn sent(&self) -> Vec<Sent> {
        self.sent.lock().unwrap().clone()
    }

    fn texts_for(&self, user: &str) -> Vec<String> {
        self.sent()
            .into_iter()
            .filter_map(|s| match s {
                Sent::Text { user: u, content } if u == user => Some(content),
                _ => None,
            })
            .collect()
    }

    fn documents(&self) -> Vec<Sent> {
        self.sent()
            .into_iter()
            .filter(|s| matches!(s, Sent::Document { .. }))
            .collect()
    }
}

struct ScriptedChannel {
    script: Vec<(&'static str, &'static str)>,
    recorder: Arc<Recorder>,
}

#[async_trait]
impl Channel for ScriptedChannel {
    fn name(&self) -> &str {
        "test"
    }

    async fn start(&self) -> Result<MessageStream, ChannelError> {
        let msgs: Vec<_> = self
            .script
            .iter()
            .map(|(user, text)| IncomingMessage::new("test", *user, *text))
            .collect();
        Ok(Box::pin(stream::iter(msgs)))
    }

    async fn respond(
        &self,
        msg: &IncomingMessage,
        response: OutgoingResponse,
    ) -> Result<(), ChannelError> {
        self.recorder.sent.lock().unwrap().push(Sent::Text {
            user: msg.user_id.clone(),
            content: response.content,
        });
        Ok(())
    }

    async fn send_document(
        &self,
        msg: &IncomingMessage,
        path: &Path,
        caption: Option<&str>,
    ) -> Result<(), ChannelError> {
        let failing = self
            .recorder
            .fail_documents
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok();
        if failing {
            assert!(path.exists(), "staged invoice missing before upload");
            self.recorder
                .failed_paths
                .lock()
                .unwrap()
                .push(path.to_path_buf());
            return Err(ChannelError::DeliveryFailed {
                name: "test".into(),
                reason: "simulated upload failure".into(),
            });
        }

        let bytes = std::fs::read(path).map_err(|e| ChannelError::DeliveryFailed {
            name: "test".into(),
            reason: e.to_string(),
        })?;
        self.recorder.sent.lock().unwrap().push(Sent::Document {
            user: msg.user_id.clone(),
            path: path.to_path_buf(),
            bytes,
            caption: caption.map(String::from),
        });
        Ok(())
    }

    async fn send_status(
        &self,
        status: StatusUpdate,
        _metadata: &serde_json::Value,
    ) -> Result<(), ChannelError> {
        self.recorder.statuses.lock().unwrap().push(status);
        Ok(())
    }

    async fn health_check(&self) -> Result<(), ChannelError> {
        Ok(())
    }
}

fn build_bot(script: Vec<(&'static str, &'static str)>, recorder: &Arc<Recorder>) -> Bot {
    let config = BotConfig::default();
    let mut channels = ChannelManager::new();
    channels.add(Box::new(ScriptedChannel {
        script,
        recorder: Arc::clone(recorder),
    }));
    let controller = OrderController::new(
        SessionStore::new(),
        InvoiceRenderer::without_logo(BusinessProfile::default()),
        config.max_products,
    );
    Bot::new(&config, controller, channels)
}

fn key(user: &str) -> SessionKey {
    SessionKey::new("test", user)
}

#[tokio::test]
async fn full_order_delivers_named_pdf_and_ends_session() {
    let recorder = Arc::new(Recorder::default());
    let bot = build_bot(
        vec![
            ("555", "/start"),
            ("555", "2"),
            ("555", "Silk Saree"),
            ("555", "Handbag"),
            ("555", "12 Lake Road, Chennai"),
            ("555", "100.50"),
            ("555", "25"),
        ],
        &recorder,
    );
    let controller = Arc::clone(bot.controller());

    bot.run().await.unwrap();

    let texts = recorder.texts_for("555");
    assert_eq!(
        texts,
        vec![
            "Vanakkam! Welcome to Princess Collection Bot.\nHow many products are you ordering?",
            "Enter name for Product 1:",
            "Enter name for Product 2:",
            "Please enter your delivery address:",
            "Enter the product total amount (in Rs.):",
            "Enter the shipping fee (in Rs.):",
        ]
    );

    let docs = recorder.documents();
    assert_eq!(docs.len(), 1);
    let Sent::Document {
        path,
        bytes,
        caption,
        ..
    } = &docs[0]
    else {
        unreachable!()
    };
    assert_eq!(path.file_name().unwrap(), "bill_555.pdf");
    assert!(bytes.starts_with(b"%PDF"));
    assert!(caption.as_deref().unwrap().contains("/start"));

    // Staged file is gone once the send completes
    assert!(!path.exists());

    assert!(
        recorder
            .statuses
            .lock()
            .unwrap()
            .contains(&StatusUpdate::UploadingDocument)
    );
    assert!(controller.sessions().get(&key("555")).await.is_none());
}

#[tokio::test]
async fn interleaved_customers_get_their_own_bills() {
    let recorder = Arc::new(Recorder::default());
    let bot = build_bot(
        vec![
            ("alice", "/start"),
            ("bob", "/start"),
            ("alice", "1"),
            ("bob", "1"),
            ("bob", "Kurti"),
            ("alice", "Saree"),
            ("alice", "Alice Street"),
            ("bob", "Bob Street"),
            ("bob", "300"),
            ("alice", "1000"),
            ("alice", "50"),
            ("bob", "40"),
        ],
        &recorder,
    );

    bot.run().await.unwrap();

    let docs = recorder.documents();
    assert_eq!(docs.len(), 2);
    let names: Vec<(String, String)> = docs
        .iter()
        .map(|d| match d {
            Sent::Document { user, path, .. } => (
                user.clone(),
                path.file_name().unwrap().to_string_lossy().into_owned(),
            ),
            Sent::Text { .. } => unreachable!(),
        })
        .collect();
    assert_eq!(
        names,
        vec![
            ("alice".to_string(), "bill_alice.pdf".to_string()),
            ("bob".to_string(), "bill_bob.pdf".to_string()),
        ]
    );

    // Every reply went to the user who asked
    let bob_texts = recorder.texts_for("bob");
    assert!(bob_texts.contains(&"Enter name for Product 1:".to_string()));
    assert_eq!(
        recorder.sent().iter().filter(|s| s.user() == "bob").count(),
        6
    );
}

#[tokio::test]
async fn cancel_then_start_begins_a_fresh_order() {
    let recorder = Arc::new(Recorder::default());
    let bot = build_bot(vec![], &recorder);
    let controller = Arc::clone(bot.controller());

    for text in ["/start", "3", "Saree", "/cancel", "/start", "1"] {
        bot.handle_message(&IncomingMessage::new("test", "7", text))
            .await
            .unwrap();
    }

    let texts = recorder.texts_for("7");
    assert_eq!(texts[3], "Order cancelled. Start again anytime.");
    assert_eq!(texts[5], "Enter name for Product 1:");

    let session = controller.sessions().get(&key("7")).await.unwrap();
    assert_eq!(session.phase, OrderPhase::AwaitingProductName);
    assert_eq!(session.order.product_count, 1);
    assert!(session.order.products.is_empty());
}

#[tokio::test]
async fn invalid_answers_reprompt_the_same_step() {
    let recorder = Arc::new(Recorder::default());
    let bot = build_bot(vec![], &recorder);
    let controller = Arc::clone(bot.controller());

    for text in ["/start", "zero", "0", "2"] {
        bot.handle_message(&IncomingMessage::new("test", "8", text))
            .await
            .unwrap();
    }

    let texts = recorder.texts_for("8");
    assert!(texts[1].contains("valid number greater than 0"));
    assert!(texts[2].contains("valid number greater than 0"));
    assert_eq!(texts[3], "Enter name for Product 1:");

    for text in ["A", "B", "Addr", "lots"] {
        bot.handle_message(&IncomingMessage::new("test", "8", text))
            .await
            .unwrap();
    }
    let session = controller.sessions().get(&key("8")).await.unwrap();
    assert_eq!(session.phase, OrderPhase::AwaitingAmount);
    assert!(
        recorder
            .texts_for("8")
            .last()
            .unwrap()
            .ends_with("Enter the product total amount (in Rs.):")
    );
}

#[tokio::test]
async fn text_before_start_is_redirected() {
    let recorder = Arc::new(Recorder::default());
    let bot = build_bot(vec![], &recorder);
    bot.handle_message(&IncomingMessage::new("test", "9", "hello"))
        .await
        .unwrap();
    assert_eq!(
        recorder.texts_for("9"),
        vec!["No order in progress. Send /start to begin a new order."]
    );
}

#[tokio::test]
async fn failed_upload_keeps_order_and_retry_succeeds() {
    let recorder = Arc::new(Recorder::default());
    recorder.fail_documents.store(1, Ordering::SeqCst);
    let bot = build_bot(vec![], &recorder);
    let controller = Arc::clone(bot.controller());

    for text in ["/start", "1", "Saree", "Addr", "100", "25"] {
        bot.handle_message(&IncomingMessage::new("test", "10", text))
            .await
            .unwrap();
    }

    assert!(recorder.documents().is_empty());
    let failed = recorder.failed_paths.lock().unwrap().clone();
    assert_eq!(failed.len(), 1);
    assert!(!failed[0].exists(), "staged invoice left behind after failure");
    let last = recorder.texts_for("10").pop().unwrap();
    assert!(last.contains("could not send your bill"));
    assert!(last.contains("Enter the shipping fee (in Rs.):"));

    let session = controller.sessions().get(&key("10")).await.unwrap();
    assert_eq!(session.phase, OrderPhase::AwaitingShipping);
    assert_eq!(session.order.products, vec!["Saree"]);

    bot.handle_message(&IncomingMessage::new("test", "10", "25"))
        .await
        .unwrap();
    assert_eq!(recorder.documents().len(), 1);
    assert!(controller.sessions().get(&key("10")).await.is_none());
}
