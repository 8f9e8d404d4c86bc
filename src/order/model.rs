//! Order data models and input parsing.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::OrderError;

/// Longest product name accepted, in characters.
pub const MAX_PRODUCT_NAME_CHARS: usize = 200;

/// Longest delivery address accepted, in characters.
pub const MAX_ADDRESS_CHARS: usize = 1000;

/// One customer's in-flight order.
///
/// Fields fill in step by step; `products.len()` never exceeds `product_count`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    pub product_count: usize,
    pub products: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shipping: Option<Decimal>,
}

impl Order {
    /// Start a fresh order for `product_count` items.
    pub fn with_count(product_count: usize) -> Self {
        Self {
            product_count,
            products: Vec::with_capacity(product_count),
            ..Self::default()
        }
    }

    /// 1-based index of the product name asked for next.
    pub fn next_product_index(&self) -> usize {
        self.products.len() + 1
    }

    /// Whether every product name has been collected.
    pub fn products_complete(&self) -> bool {
        self.products.len() >= self.product_count
    }

    /// Append a product name. Returns `true` once all names are in.
    pub fn push_product(&mut self, raw: &str) -> Result<bool, OrderError> {
        if self.products_complete() {
            return Ok(true);
        }
        let name = clean_text(raw, MAX_PRODUCT_NAME_CHARS).ok_or(OrderError::EmptyProductName)?;
        self.products.push(name);
        Ok(self.products_complete())
    }

    /// Store the delivery address.
    pub fn set_address(&mut self, raw: &str) -> Result<(), OrderError> {
        let address = clean_text(raw, MAX_ADDRESS_CHARS).ok_or(OrderError::EmptyAddress)?;
        self.address = Some(address);
        Ok(())
    }

    /// Parse and store the product subtotal.
    pub fn set_amount(&mut self, raw: &str) -> Result<Decimal, OrderError> {
        let amount = parse_money(raw).ok_or_else(|| OrderError::InvalidAmount {
            input: raw.trim().to_string(),
        })?;
        self.amount = Some(amount);
        Ok(amount)
    }

    /// Parse and store the shipping fee. Rejected when the grand total
    /// would not fit in a `Decimal`.
    pub fn set_shipping(&mut self, raw: &str) -> Result<Decimal, OrderError> {
        let invalid = || OrderError::InvalidShipping {
            input: raw.trim().to_string(),
        };
        let shipping = parse_money(raw).ok_or_else(invalid)?;
        if let Some(amount) = self.amount {
            amount.checked_add(shipping).ok_or_else(invalid)?;
        }
        self.shipping = Some(shipping);
        Ok(shipping)
    }

    /// Snapshot the order for rendering. `None` until every field is filled
    /// or when the grand total overflows.
    pub fn complete(&self, completed_at: DateTime<Utc>) -> Option<CompletedOrder> {
        if !self.products_complete() || self.product_count == 0 {
            return None;
        }
        let amount = self.amount?;
        let shipping = self.shipping?;
        Some(CompletedOrder {
            products: self.products.clone(),
            address: self.address.clone()?,
            amount,
            shipping,
            total: amount.checked_add(shipping)?,
            completed_at,
        })
    }
}

/// A fully collected order, ready for the renderer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletedOrder {
    pub products: Vec<String>,
    pub address: String,
    pub amount: Decimal,
    pub shipping: Decimal,
    /// `amount + shipping`, checked when the snapshot is taken.
    pub total: Decimal,
    pub completed_at: DateTime<Utc>,
}

/// Parse the product count step. Accepts whole numbers in `1..=max`.
pub fn parse_count(raw: &str, max: usize) -> Result<usize, OrderError> {
    let invalid = || OrderError::InvalidCount {
        input: raw.trim().to_string(),
        max,
    };
    let n: i64 = raw.trim().parse().map_err(|_| invalid())?;
    if n <= 0 || n as u64 > max as u64 {
        return Err(invalid());
    }
    Ok(n as usize)
}

/// Parse a non-negative money amount.
///
/// Tolerates a leading currency label (`Rs.`, `Rs`, `₹`) and thousands
/// separators. Scale is preserved, so `"100.50"` stays `100.50`.
pub fn parse_money(raw: &str) -> Option<Decimal> {
    let mut s = raw.trim();
    for prefix in ["Rs.", "rs.", "RS.", "Rs", "rs", "RS", "₹"] {
        if let Some(rest) = s.strip_prefix(prefix) {
            s = rest.trim_start();
            break;
        }
    }
    if s.is_empty() {
        return None;
    }
    let cleaned: String = s.chars().filter(|c| *c != ',').collect();
    let value = Decimal::from_str(&cleaned).ok()?;
    if value.is_zero() {
        // "-0" is plain zero
        return Some(value.abs());
    }
    if value.is_sign_negative() {
        return None;
    }
    Some(value)
}

/// Trim, drop control characters (other than newlines) and cap the length.
/// Returns `None` for input that is empty after cleaning.
fn clean_text(raw: &str, max_chars: usize) -> Option<String> {
    let cleaned: String = raw
        .trim()
        .chars()
        .filter(|c| *c == '\n' || !c.is_control())
        .take(max_chars)
        .collect();
    let cleaned = cleaned.trim().to_string();
    if cleaned.is_empty() { None } else { Some(cleaned) }
}
