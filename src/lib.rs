//! Invoice Bot — conversational order taking with PDF bills.

pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod invoice;
pub mod order;
