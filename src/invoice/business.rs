//! Seller details printed on every invoice.

use serde::{Deserialize, Serialize};

const DEFAULT_NAME: &str = "Princess Collection";

const DEFAULT_FROM_ADDRESS: &str = "Princess Collection,
plot no :118,
sv nagar,perumalpattu,
thiruvallur-602024";

/// The shop issuing the invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusinessProfile {
    /// Shown in the header and the greeting.
    pub name: String,
    /// Multi-line "From:" block. Lines break on `\n` only.
    pub from_address: String,
    /// Label printed before every amount, e.g. `Rs.`.
    pub currency: String,
    /// Closing line at the bottom of the invoice.
    pub footer: String,
}

impl Default for BusinessProfile {
    fn default() -> Self {
        Self {
            name: DEFAULT_NAME.to_string(),
            from_address: DEFAULT_FROM_ADDRESS.to_string(),
            currency: "Rs.".to_string(),
            footer: format!("Thank you for shopping with {DEFAULT_NAME}!"),
        }
    }
}

impl BusinessProfile {
    /// Lines of the "From:" block.
    pub fn from_lines(&self) -> impl Iterator<Item = &str> {
        self.from_address.lines()
    }
}
