//! Invoice renderer — completed order in, PDF document out.

use std::path::PathBuf;

use crate::error::RenderError;
use crate::order::{CompletedOrder, SessionKey};

use super::business::BusinessProfile;
use super::layout::{InvoiceLayout, LogoImage, layout_invoice};
use super::pdf::encode_pdf;

/// A rendered invoice. Handed to delivery and then dropped.
#[derive(Debug, Clone)]
pub struct InvoiceDocument {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
}

/// Deterministic attachment name for an identity: `bill_<user>.pdf`.
pub fn invoice_file_name(key: &SessionKey) -> String {
    format!("bill_{}.pdf", key.file_stem())
}

/// Renders completed orders for one business.
#[derive(Debug, Clone)]
pub struct InvoiceRenderer {
    business: BusinessProfile,
    logo_path: Option<PathBuf>,
}

impl InvoiceRenderer {
    pub fn new(business: BusinessProfile, logo_path: impl Into<PathBuf>) -> Self {
        Self {
            business,
            logo_path: Some(logo_path.into()),
        }
    }

    /// A renderer that always draws the logo placeholder.
    pub fn without_logo(business: BusinessProfile) -> Self {
        Self {
            business,
            logo_path: None,
        }
    }

    pub fn business(&self) -> &BusinessProfile {
        &self.business
    }

    /// Read the logo from disk. Any failure means "no logo".
    fn load_logo(&self) -> Option<LogoImage> {
        let path = self.logo_path.as_ref()?;
        let bytes = match std::fs::read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::debug!(path = %path.display(), "Logo unavailable: {e}");
                return None;
            }
        };
        let logo = LogoImage::from_bytes(bytes);
        if logo.is_none() {
            tracing::warn!(path = %path.display(), "Logo is not a PNG or JPEG, using placeholder");
        }
        logo
    }

    /// Lay out the invoice without encoding it.
    pub fn layout(&self, order: &CompletedOrder) -> InvoiceLayout {
        layout_invoice(order, &self.business, self.load_logo())
    }

    /// Render `order` to a PDF attachment called `file_name`.
    pub fn render(
        &self,
        order: &CompletedOrder,
        file_name: impl Into<String>,
    ) -> Result<InvoiceDocument, RenderError> {
        let layout = self.layout(order);
        let bytes = encode_pdf(&layout)?;
        let file_name = file_name.into();

        tracing::info!(
            file = %file_name,
            pages = layout.page_count,
            products = order.products.len(),
            total = %order.total,
            "Invoice rendered"
        );

        Ok(InvoiceDocument {
            file_name,
            bytes,
            page_count: layout.page_count,
        })
    }
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;
    use tempfile::TempDir;

    use super::*;
    use crate::invoice::LOGO_PLACEHOLDER;

    fn order() -> CompletedOrder {
        CompletedOrder {
            products: vec!["Saree".into(), "Bag".into()],
            address: "12 Lake Road".into(),
            amount: dec!(100.50),
            shipping: dec!(25),
            total: dec!(125.50),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn file_name_derives_from_identity() {
        let key = SessionKey::new("telegram", "987654");
        assert_eq!(invoice_file_name(&key), "bill_987654.pdf");
    }

    #[test]
    fn missing_logo_file_still_renders() {
        let tmp = TempDir::new().unwrap();
        let renderer =
            InvoiceRenderer::new(BusinessProfile::default(), tmp.path().join("logo.png"));

        let layout = renderer.layout(&order());
        assert!(layout.has_text(LOGO_PLACEHOLDER));

        let doc = renderer.render(&order(), "bill_1.pdf").unwrap();
        assert_eq!(doc.file_name, "bill_1.pdf");
        assert_eq!(doc.page_count, 1);
        assert!(doc.bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn non_image_logo_uses_placeholder() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logo.png");
        std::fs::write(&path, b"definitely not a png").unwrap();

        let renderer = InvoiceRenderer::new(BusinessProfile::default(), &path);
        let layout = renderer.layout(&order());
        assert!(!layout.has_logo());
        assert!(layout.has_text(LOGO_PLACEHOLDER));
    }

    #[test]
    fn image_logo_is_placed() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("logo.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff, 0xe0, 0, 0x10]).unwrap();

        let renderer = InvoiceRenderer::new(BusinessProfile::default(), &path);
        let layout = renderer.layout(&order());
        assert!(layout.has_logo());
        assert!(!layout.has_text(LOGO_PLACEHOLDER));
    }

    #[test]
    fn renderer_without_logo() {
        let renderer = InvoiceRenderer::without_logo(BusinessProfile::default());
        assert!(renderer.layout(&order()).has_text(LOGO_PLACEHOLDER));
    }
}
