//! Invoice rendering — fixed A4 layout encoded as PDF.
//!
//! Rendering is split in two: `layout` walks a cursor down the page and
//! produces positioned draw operations (pure, easy to inspect in tests), and
//! `pdf` encodes those operations with `printpdf`.

pub mod business;
pub mod delivery;
pub mod layout;
pub mod pdf;
pub mod renderer;

pub use business::BusinessProfile;
pub use delivery::StagedDocument;
pub use layout::{DrawOp, InvoiceLayout, LOGO_PLACEHOLDER, LogoImage};
pub use renderer::{InvoiceDocument, InvoiceRenderer, invoice_file_name};
