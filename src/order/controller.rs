//! OrderController — drives the order conversation for every identity.
//!
//! One inbound message produces one [`Reply`]. Answers are validated at the
//! step that collects them; a rejected answer re-prompts without changing
//! phase. When the shipping fee arrives the order is rendered and the
//! session waits in `Completed` until the caller reports whether delivery
//! worked.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::error::OrderError;
use crate::invoice::{BusinessProfile, InvoiceDocument, InvoiceRenderer, invoice_file_name};

use super::command::{CommandParser, Input};
use super::model::{CompletedOrder, Order, parse_count};
use super::prompts;
use super::session::{Session, SessionKey, SessionStore};
use super::state::OrderPhase;

/// What the caller should send back.
#[derive(Debug, Clone)]
pub enum Reply {
    /// A plain text message.
    Text(String),
    /// The finished invoice. Report the send result through
    /// [`OrderController::delivery_succeeded`] or
    /// [`OrderController::delivery_failed`].
    Invoice {
        document: InvoiceDocument,
        caption: String,
    },
}

impl Reply {
    /// Text of a `Reply::Text`, or the caption of an invoice.
    pub fn text(&self) -> &str {
        match self {
            Self::Text(text) => text,
            Self::Invoice { caption, .. } => caption,
        }
    }
}

/// Result of applying one answer to a session.
enum Step {
    Prompt(String),
    Rejected(String),
    Finished(CompletedOrder),
}

/// Coordinates sessions, validation, and invoice rendering.
pub struct OrderController {
    sessions: Arc<SessionStore>,
    renderer: InvoiceRenderer,
    max_products: usize,
}

impl OrderController {
    pub fn new(sessions: Arc<SessionStore>, renderer: InvoiceRenderer, max_products: usize) -> Self {
        Self {
            sessions,
            renderer,
            max_products: max_products.max(1),
        }
    }

    pub fn sessions(&self) -> &Arc<SessionStore> {
        &self.sessions
    }

    /// Handle one inbound message from `key`.
    pub async fn handle(&self, key: &SessionKey, content: &str) -> Reply {
        match CommandParser::parse(content) {
            Input::Start => self.start(key).await,
            Input::Cancel => self.cancel(key).await,
            Input::Help => Reply::Text(prompts::help()),
            Input::Unknown { command } => {
                debug!(session = %key, command = %command, "Unknown command");
                Reply::Text(prompts::unknown_command(&command))
            }
            Input::Reply { text } => self.answer(key, &text).await,
        }
    }

    async fn start(&self, key: &SessionKey) -> Reply {
        self.sessions.begin(key).await;
        info!(session = %key, "Order started");
        Reply::Text(prompts::greeting(self.renderer.business()))
    }

    async fn cancel(&self, key: &SessionKey) -> Reply {
        if let Some(session) = self.sessions.remove(key).await {
            info!(session = %key, phase = %session.phase, "Order cancelled");
        }
        Reply::Text(prompts::CANCELLED.to_string())
    }

    async fn answer(&self, key: &SessionKey, text: &str) -> Reply {
        let business = self.renderer.business();
        let max_products = self.max_products;

        let step = self
            .sessions
            .update(key, |session| apply_answer(session, text, max_products, business))
            .await;

        match step {
            None => Reply::Text(prompts::NOT_STARTED.to_string()),
            Some(Step::Prompt(prompt)) => Reply::Text(prompt),
            Some(Step::Rejected(prompt)) => Reply::Text(prompt),
            Some(Step::Finished(order)) => self.render(key, &order).await,
        }
    }

    async fn render(&self, key: &SessionKey, order: &CompletedOrder) -> Reply {
        match self.renderer.render(order, invoice_file_name(key)) {
            Ok(document) => Reply::Invoice {
                document,
                caption: prompts::DELIVERED.to_string(),
            },
            Err(e) => {
                warn!(session = %key, "Invoice rendering failed: {e}");
                Reply::Text(self.delivery_failed(key).await)
            }
        }
    }

    /// The invoice reached the user: the order is done.
    pub async fn delivery_succeeded(&self, key: &SessionKey) {
        if let Some(session) = self.sessions.remove(key).await {
            let elapsed = Utc::now().signed_duration_since(session.started_at);
            info!(
                session = %key,
                products = session.order.products.len(),
                elapsed_secs = elapsed.num_seconds(),
                "Order delivered"
            );
        }
    }

    /// The invoice could not be produced or sent. Rewinds the session to the
    /// shipping step with everything else intact and returns the message to
    /// show the user.
    pub async fn delivery_failed(&self, key: &SessionKey) -> String {
        let rewound = self
            .sessions
            .update(key, |session| {
                session.order.shipping = None;
                session.transition_to(OrderPhase::AwaitingShipping)
            })
            .await;
        match rewound {
            Some(Ok(_)) => {
                warn!(session = %key, "Delivery failed, waiting for retry");
                prompts::delivery_failed(self.renderer.business())
            }
            Some(Err(e)) => {
                warn!(session = %key, "Could not rewind session after failed delivery: {e}");
                prompts::delivery_failed(self.renderer.business())
            }
            None => prompts::NOT_STARTED.to_string(),
        }
    }
}

/// Apply one free-text answer to `session` according to its phase.
fn apply_answer(
    session: &mut Session,
    text: &str,
    max_products: usize,
    business: &BusinessProfile,
) -> Step {
    let phase = session.phase;
    let result: Result<Step, OrderError> = match phase {
        OrderPhase::AwaitingCount => parse_count(text, max_products).and_then(|count| {
            session.order = Order::with_count(count);
            session.advance()?;
            Ok(Step::Prompt(prompts::ask_product_name(1)))
        }),
        OrderPhase::AwaitingProductName => session.order.push_product(text).and_then(|done| {
            if done {
                session.advance()?;
                Ok(Step::Prompt(prompts::ASK_ADDRESS.to_string()))
            } else {
                Ok(Step::Prompt(prompts::ask_product_name(
                    session.order.next_product_index(),
                )))
            }
        }),
        OrderPhase::AwaitingAddress => session.order.set_address(text).and_then(|()| {
            session.advance()?;
            Ok(Step::Prompt(prompts::ask_amount(business)))
        }),
        OrderPhase::AwaitingAmount => session.order.set_amount(text).and_then(|_| {
            session.advance()?;
            Ok(Step::Prompt(prompts::ask_shipping(business)))
        }),
        OrderPhase::AwaitingShipping => session.order.set_shipping(text).and_then(|_| {
            let completed = session
                .order
                .complete(Utc::now())
                .ok_or_else(|| OrderError::InvalidTransition {
                    from: phase.to_string(),
                    to: OrderPhase::Completed.to_string(),
                })?;
            session.advance()?;
            Ok(Step::Finished(completed))
        }),
        OrderPhase::Completed => Ok(Step::Prompt(prompts::GENERATING.to_string())),
    };

    match result {
        Ok(step) => {
            if session.phase != phase {
                debug!(session = %session.key, from = %phase, to = %session.phase, "Phase advanced");
            }
            step
        }
        Err(e) => {
            debug!(session = %session.key, phase = %phase, "Rejected answer: {e}");
            Step::Rejected(prompts::invalid_input(&e, session.phase, &session.order, business))
        }
    }
}
