//! Order collection — the guided conversation that gathers one order per
//! identity and hands the finished order to the invoice renderer.

pub mod command;
pub mod controller;
pub mod model;
pub mod prompts;
pub mod session;
pub mod state;

pub use command::{CommandParser, Input};
pub use controller::{OrderController, Reply};
pub use model::{CompletedOrder, Order};
pub use session::{Session, SessionKey, SessionStore};
pub use state::OrderPhase;
