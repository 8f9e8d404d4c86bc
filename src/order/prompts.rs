//! User-facing prompt texts.

use crate::error::OrderError;
use crate::invoice::BusinessProfile;

use super::model::Order;
use super::state::OrderPhase;

pub const CANCELLED: &str = "Order cancelled. Start again anytime.";
pub const NOT_STARTED: &str = "No order in progress. Send /start to begin a new order.";
pub const ASK_ADDRESS: &str = "Please enter your delivery address:";
pub const GENERATING: &str = "Generating your bill...";
pub const DELIVERED: &str = "Here is your bill. Send /start to place another order.";

/// Greeting sent on `/start`, ending with the count question.
pub fn greeting(business: &BusinessProfile) -> String {
    format!(
        "Vanakkam! Welcome to {} Bot.\nHow many products are you ordering?",
        business.name
    )
}

/// Command list for `/help`.
pub fn help() -> String {
    [
        "Commands:",
        "/start - begin a new order",
        "/cancel - cancel the current order",
        "/help - show this message",
    ]
    .join("\n")
}

pub fn unknown_command(command: &str) -> String {
    format!("Unknown command {command}. Send /help to see what I understand.")
}

pub fn ask_product_name(index: usize) -> String {
    format!("Enter name for Product {index}:")
}

pub fn ask_amount(business: &BusinessProfile) -> String {
    format!("Enter the product total amount (in {}):", business.currency)
}

pub fn ask_shipping(business: &BusinessProfile) -> String {
    format!("Enter the shipping fee (in {}):", business.currency)
}

/// The question for `phase`, given what has been collected so far.
pub fn for_phase(phase: OrderPhase, order: &Order, business: &BusinessProfile) -> String {
    match phase {
        OrderPhase::AwaitingCount => "How many products are you ordering?".to_string(),
        OrderPhase::AwaitingProductName => ask_product_name(order.next_product_index()),
        OrderPhase::AwaitingAddress => ASK_ADDRESS.to_string(),
        OrderPhase::AwaitingAmount => ask_amount(business),
        OrderPhase::AwaitingShipping => ask_shipping(business),
        OrderPhase::Completed => GENERATING.to_string(),
    }
}

/// Guidance for a rejected answer, followed by the repeated question.
pub fn invalid_input(
    err: &OrderError,
    phase: OrderPhase,
    order: &Order,
    business: &BusinessProfile,
) -> String {
    let guidance = match err {
        OrderError::InvalidCount { max, .. } => {
            format!("Please enter a valid number greater than 0 (at most {max}).")
        }
        OrderError::InvalidAmount { .. } | OrderError::InvalidShipping { .. } => {
            "Please enter a valid amount, for example 450 or 450.50.".to_string()
        }
        OrderError::EmptyProductName => "Product name cannot be empty.".to_string(),
        OrderError::EmptyAddress => "Delivery address cannot be empty.".to_string(),
        OrderError::InvalidTransition { .. } => "Something went wrong with your order.".to_string(),
    };
    format!("{guidance}\n{}", for_phase(phase, order, business))
}

/// Sent when the bill could not be rendered or delivered.
pub fn delivery_failed(business: &BusinessProfile) -> String {
    format!(
        "Sorry, I could not send your bill. Your order is saved.\n{}\nOr send /cancel to discard it.",
        ask_shipping(business)
    )
}
