//! Invoice page layout.
//!
//! Turns a [`CompletedOrder`] into positioned draw operations. Positions are
//! absolute PDF points (origin bottom-left) produced by walking a vertical
//! cursor down from the top of an A4 page. Text only breaks on explicit
//! newlines; there is no word wrap. When the cursor would drop below the
//! bottom margin the layout continues on a fresh page instead of drawing
//! off-page.

use crate::order::CompletedOrder;

use super::business::BusinessProfile;

/// A4 width in points.
pub const PAGE_WIDTH: f32 = 595.28;
/// A4 height in points.
pub const PAGE_HEIGHT: f32 = 841.89;
/// Lowest baseline allowed on a page.
pub const BOTTOM_MARGIN: f32 = 50.0;
/// Baseline of the first line on a continuation page.
pub const CONTINUATION_TOP: f32 = PAGE_HEIGHT - 60.0;
/// Text drawn in place of the logo when the asset is unavailable.
pub const LOGO_PLACEHOLDER: &str = "[Logo Missing]";
/// Baseline origin of [`LOGO_PLACEHOLDER`].
pub const PLACEHOLDER_ORIGIN: (f32, f32) = (PAGE_WIDTH - 160.0, PAGE_HEIGHT - 100.0);

const LEFT: f32 = 50.0;
const INDENT: f32 = 70.0;
const RIGHT_EDGE: f32 = PAGE_WIDTH - 30.0;

const FROM_LINE: f32 = 15.0;
const ADDRESS_LINE: f32 = 15.0;
const PRODUCT_LINE: f32 = 18.0;
const AMOUNT_LINE: f32 = 25.0;

const LOGO_SIZE: f32 = 80.0;

/// Helvetica variant used for a run of text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FontStyle {
    Regular,
    Bold,
    Oblique,
}

/// RGB fill colour, components in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rgb {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Rgb {
    const fn hex(rgb: u32) -> Self {
        Self {
            r: ((rgb >> 16) & 0xff) as f32 / 255.0,
            g: ((rgb >> 8) & 0xff) as f32 / 255.0,
            b: (rgb & 0xff) as f32 / 255.0,
        }
    }

    pub const BLACK: Rgb = Rgb::hex(0x000000);
    pub const DARK_BLUE: Rgb = Rgb::hex(0x00008b);
    pub const DARK_GREEN: Rgb = Rgb::hex(0x006400);
    pub const BROWN: Rgb = Rgb::hex(0xa52a2a);
    pub const GREEN: Rgb = Rgb::hex(0x008000);
    pub const GREY: Rgb = Rgb::hex(0x808080);
    pub const RED: Rgb = Rgb::hex(0xff0000);
}

/// Font, size and colour of a text run.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStyle {
    pub font: FontStyle,
    pub size: f32,
    pub color: Rgb,
}

impl TextStyle {
    const fn new(font: FontStyle, size: f32, color: Rgb) -> Self {
        Self { font, size, color }
    }
}

const TITLE: TextStyle = TextStyle::new(FontStyle::Bold, 22.0, Rgb::DARK_BLUE);
const DATE: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, Rgb::GREY);
/// Style of [`LOGO_PLACEHOLDER`].
pub const PLACEHOLDER_STYLE: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, Rgb::RED);
const FROM: TextStyle = TextStyle::new(FontStyle::Regular, 10.0, Rgb::BLACK);
const TO_HEADING: TextStyle = TextStyle::new(FontStyle::Bold, 14.0, Rgb::DARK_GREEN);
const PRODUCT_HEADING: TextStyle = TextStyle::new(FontStyle::Bold, 14.0, Rgb::DARK_BLUE);
const BODY: TextStyle = TextStyle::new(FontStyle::Regular, 12.0, Rgb::BLACK);
const AMOUNT: TextStyle = TextStyle::new(FontStyle::Bold, 14.0, Rgb::BROWN);
const TOTAL: TextStyle = TextStyle::new(FontStyle::Bold, 16.0, Rgb::GREEN);
const FOOTER: TextStyle = TextStyle::new(FontStyle::Oblique, 11.0, Rgb::GREY);

/// Image formats the PDF writer can embed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
}

impl ImageFormat {
    /// Sniff the format from magic bytes.
    pub fn detect(bytes: &[u8]) -> Option<Self> {
        if bytes.starts_with(b"\x89PNG\r\n\x1a\n") {
            Some(Self::Png)
        } else if bytes.starts_with(&[0xff, 0xd8, 0xff]) {
            Some(Self::Jpeg)
        } else {
            None
        }
    }
}

/// Raw logo file contents with a recognised format.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogoImage {
    pub format: ImageFormat,
    pub bytes: Vec<u8>,
}

impl LogoImage {
    /// Wrap raw bytes, rejecting anything that is not PNG or JPEG.
    pub fn from_bytes(bytes: Vec<u8>) -> Option<Self> {
        let format = ImageFormat::detect(&bytes)?;
        Some(Self { format, bytes })
    }
}

/// One positioned drawing instruction.
#[derive(Debug, Clone, PartialEq)]
pub enum DrawOp {
    Text {
        page: usize,
        x: f32,
        y: f32,
        text: String,
        style: TextStyle,
    },
    Image {
        page: usize,
        x: f32,
        y: f32,
        width: f32,
        height: f32,
        logo: LogoImage,
    },
}

impl DrawOp {
    pub fn page(&self) -> usize {
        match self {
            Self::Text { page, .. } | Self::Image { page, .. } => *page,
        }
    }
}

/// The complete invoice, ready to be encoded.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLayout {
    pub title: String,
    pub page_count: usize,
    pub ops: Vec<DrawOp>,
}

impl InvoiceLayout {
    /// All text runs in drawing order.
    pub fn texts(&self) -> impl Iterator<Item = &str> {
        self.ops.iter().filter_map(|op| match op {
            DrawOp::Text { text, .. } => Some(text.as_str()),
            DrawOp::Image { .. } => None,
        })
    }

    /// Whether a text run equal to `needle` was laid out.
    pub fn has_text(&self, needle: &str) -> bool {
        self.texts().any(|t| t == needle)
    }

    /// Whether the logo image (rather than the placeholder) was placed.
    pub fn has_logo(&self) -> bool {
        self.ops.iter().any(|op| matches!(op, DrawOp::Image { .. }))
    }
}

/// Vertical cursor that rolls onto a new page at the bottom margin.
struct Cursor {
    page: usize,
    y: f32,
}

impl Cursor {
    fn advance(&mut self, dy: f32) {
        self.y -= dy;
        if self.y < BOTTOM_MARGIN {
            self.page += 1;
            self.y = CONTINUATION_TOP;
        }
    }
}

struct Builder {
    cursor: Cursor,
    ops: Vec<DrawOp>,
}

impl Builder {
    fn text_at(&mut self, x: f32, y: f32, text: &str, style: TextStyle) {
        if text.is_empty() {
            return;
        }
        self.ops.push(DrawOp::Text {
            page: self.cursor.page,
            x,
            y,
            text: fit_line(text, style.size, RIGHT_EDGE - x),
            style,
        });
    }

    fn text(&mut self, x: f32, text: &str, style: TextStyle) {
        let y = self.cursor.y;
        self.text_at(x, y, text, style);
    }
}

/// Lay out an invoice for `order`.
///
/// `logo` is `None` when the asset is missing or unreadable; the placeholder
/// notice is drawn instead.
pub fn layout_invoice(
    order: &CompletedOrder,
    business: &BusinessProfile,
    logo: Option<LogoImage>,
) -> InvoiceLayout {
    let mut b = Builder {
        cursor: Cursor {
            page: 0,
            y: PAGE_HEIGHT,
        },
        ops: Vec::new(),
    };

    // Header
    b.text_at(LEFT, PAGE_HEIGHT - 80.0, &business.name, TITLE);
    let date = format!("Date: {}", order.completed_at.format("%d %b %Y"));
    b.text_at(LEFT, PAGE_HEIGHT - 100.0, &date, DATE);

    match logo {
        Some(logo) => b.ops.push(DrawOp::Image {
            page: 0,
            x: PAGE_WIDTH - 150.0,
            y: PAGE_HEIGHT - 120.0,
            width: LOGO_SIZE,
            height: LOGO_SIZE,
            logo,
        }),
        None => {
            let (x, y) = PLACEHOLDER_ORIGIN;
            b.text_at(x, y, LOGO_PLACEHOLDER, PLACEHOLDER_STYLE);
        }
    }

    // From block, right column
    let from_x = PAGE_WIDTH - 180.0;
    b.cursor.y = PAGE_HEIGHT - 140.0;
    b.text(from_x, "From:", FROM);
    for line in business.from_lines() {
        b.cursor.advance(FROM_LINE);
        b.text(from_x, line, FROM);
    }

    // To block
    b.cursor.advance(50.0);
    b.text(LEFT, "To Address:", TO_HEADING);
    b.cursor.advance(20.0);
    for line in order.address.lines() {
        b.text(INDENT, line, BODY);
        b.cursor.advance(ADDRESS_LINE);
    }

    // Products
    b.cursor.advance(20.0);
    b.text(LEFT, "Product Names:", PRODUCT_HEADING);
    for (i, product) in order.products.iter().enumerate() {
        b.cursor.advance(PRODUCT_LINE);
        b.text(INDENT, &format!("{}. {}", i + 1, product), BODY);
    }

    // Amounts
    let currency = &business.currency;
    b.cursor.advance(30.0);
    b.text(LEFT, &format!("Product Amount: {currency} {}", order.amount), AMOUNT);
    b.cursor.advance(AMOUNT_LINE);
    b.text(LEFT, &format!("Shipping Fee: {currency} {}", order.shipping), AMOUNT);
    b.cursor.advance(AMOUNT_LINE);
    b.text(LEFT, &format!("Grand Total: {currency} {}", order.total), TOTAL);

    // Footer
    b.cursor.advance(50.0);
    b.text(LEFT, &business.footer, FOOTER);

    InvoiceLayout {
        title: format!("{} invoice", business.name),
        page_count: b.cursor.page + 1,
        ops: b.ops,
    }
}

/// Rough Helvetica advance width: half an em per character on average.
fn approx_width(chars: usize, size: f32) -> f32 {
    chars as f32 * size * 0.5
}

/// Cut `text` so it fits in `max_width`, marking the cut with `...`.
fn fit_line(text: &str, size: f32, max_width: f32) -> String {
    let count = text.chars().count();
    if approx_width(count, size) <= max_width {
        return text.to_string();
    }
    let keep = ((max_width / (size * 0.5)) as usize).saturating_sub(3);
    let mut cut: String = text.chars().take(keep).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use rust_decimal_macros::dec;

    use super::*;

    fn order(products: &[&str]) -> CompletedOrder {
        CompletedOrder {
            products: products.iter().map(|p| p.to_string()).collect(),
            address: "12 Lake Road\nAnna Nagar\nChennai 600040".into(),
            amount: dec!(100.50),
            shipping: dec!(25),
            total: dec!(125.50),
            completed_at: Utc.with_ymd_and_hms(2026, 3, 14, 10, 0, 0).unwrap(),
        }
    }

    fn png_logo() -> LogoImage {
        LogoImage::from_bytes(b"\x89PNG\r\n\x1a\nrest".to_vec()).unwrap()
    }

    fn assert_close(actual: f32, expected: f32) {
        assert!((actual - expected).abs() < 1e-3, "{actual} != {expected}");
    }

    fn text_op<'a>(layout: &'a InvoiceLayout, needle: &str) -> (usize, f32, f32, &'a TextStyle) {
        layout
            .ops
            .iter()
            .find_map(|op| match op {
                DrawOp::Text {
                    page,
                    x,
                    y,
                    text,
                    style,
                } if text == needle => Some((*page, *x, *y, style)),
                _ => None,
            })
            .unwrap_or_else(|| panic!("{needle:?} not laid out"))
    }

    #[test]
    fn products_are_numbered_in_order() {
        let layout = layout_invoice(&order(&["Saree", "Bag"]), &BusinessProfile::default(), None);
        let texts: Vec<&str> = layout.texts().collect();
        let saree = texts.iter().position(|t| *t == "1. Saree").unwrap();
        let bag = texts.iter().position(|t| *t == "2. Bag").unwrap();
        assert!(saree < bag);

        let (_, _, y1, _) = text_op(&layout, "1. Saree");
        let (_, _, y2, _) = text_op(&layout, "2. Bag");
        assert_close(y1 - y2, PRODUCT_LINE);
    }

    #[test]
    fn totals_use_exact_decimal_sum() {
        let layout = layout_invoice(&order(&["Saree"]), &BusinessProfile::default(), None);
        assert!(layout.has_text("Product Amount: Rs. 100.50"));
        assert!(layout.has_text("Shipping Fee: Rs. 25"));
        assert!(layout.has_text("Grand Total: Rs. 125.50"));

        let (_, _, _, style) = text_op(&layout, "Grand Total: Rs. 125.50");
        assert_eq!(*style, TOTAL);
        let (_, _, _, style) = text_op(&layout, "Shipping Fee: Rs. 25");
        assert_eq!(*style, AMOUNT);
    }

    #[test]
    fn missing_logo_draws_placeholder() {
        let layout = layout_invoice(&order(&["Saree"]), &BusinessProfile::default(), None);
        assert!(!layout.has_logo());
        let (page, x, y, style) = text_op(&layout, LOGO_PLACEHOLDER);
        assert_eq!(page, 0);
        assert_eq!((x, y), PLACEHOLDER_ORIGIN);
        assert_eq!((x, y), (PAGE_WIDTH - 160.0, PAGE_HEIGHT - 100.0));
        assert_eq!(*style, PLACEHOLDER_STYLE);
        assert_eq!(style.color, Rgb::RED);
    }

    #[test]
    fn present_logo_replaces_placeholder() {
        let layout = layout_invoice(
            &order(&["Saree"]),
            &BusinessProfile::default(),
            Some(png_logo()),
        );
        assert!(layout.has_logo());
        assert!(!layout.has_text(LOGO_PLACEHOLDER));
    }

    #[test]
    fn header_and_footer() {
        let layout = layout_invoice(&order(&["Saree"]), &BusinessProfile::default(), None);
        let (_, x, y, style) = text_op(&layout, "Princess Collection");
        assert_eq!((x, y), (LEFT, PAGE_HEIGHT - 80.0));
        assert_eq!(*style, TITLE);
        assert!(layout.has_text("Date: 14 Mar 2026"));
        assert!(layout.has_text("Thank you for shopping with Princess Collection!"));
    }

    #[test]
    fn address_splits_on_newlines_only() {
        let layout = layout_invoice(&order(&["Saree"]), &BusinessProfile::default(), None);
        let (_, x, y1, _) = text_op(&layout, "12 Lake Road");
        let (_, _, y2, _) = text_op(&layout, "Anna Nagar");
        let (_, _, y3, _) = text_op(&layout, "Chennai 600040");
        assert_eq!(x, INDENT);
        assert_close(y1 - y2, ADDRESS_LINE);
        assert_close(y2 - y3, ADDRESS_LINE);
    }

    #[test]
    fn from_block_follows_business_profile() {
        let layout = layout_invoice(&order(&["Saree"]), &BusinessProfile::default(), None);
        let (_, x, y, _) = text_op(&layout, "From:");
        assert_eq!((x, y), (PAGE_WIDTH - 180.0, PAGE_HEIGHT - 140.0));
        let (_, _, last_y, _) = text_op(&layout, "thiruvallur-602024");
        assert_close(last_y, PAGE_HEIGHT - 140.0 - 4.0 * FROM_LINE);
    }

    #[test]
    fn short_order_fits_on_one_page() {
        let layout = layout_invoice(&order(&["Saree", "Bag"]), &BusinessProfile::default(), None);
        assert_eq!(layout.page_count, 1);
        assert!(layout.ops.iter().all(|op| op.page() == 0));
    }

    #[test]
    fn long_order_paginates_instead_of_clipping() {
        let names: Vec<String> = (1..=60).map(|i| format!("Item {i}")).collect();
        let refs: Vec<&str> = names.iter().map(String::as_str).collect();
        let layout = layout_invoice(&order(&refs), &BusinessProfile::default(), None);

        assert!(layout.page_count >= 2);
        for op in &layout.ops {
            if let DrawOp::Text { y, .. } = op {
                assert!(*y >= BOTTOM_MARGIN, "text drawn below margin at {y}");
                assert!(*y <= PAGE_HEIGHT);
            }
        }
        let (last_page, ..) = text_op(&layout, "60. Item 60");
        assert!(last_page >= 1);
        let (footer_page, ..) = text_op(&layout, "Thank you for shopping with Princess Collection!");
        assert_eq!(footer_page, layout.page_count - 1);
    }

    #[test]
    fn overlong_lines_are_truncated_with_marker() {
        let long = "x".repeat(200);
        let layout = layout_invoice(&order(&[long.as_str()]), &BusinessProfile::default(), None);
        let line = layout
            .texts()
            .find(|t| t.starts_with("1. "))
            .unwrap()
            .to_string();
        assert!(line.ends_with("..."));
        assert!(approx_width(line.chars().count(), BODY.size) <= RIGHT_EDGE - INDENT);
    }

    #[test]
    fn detect_image_format() {
        assert_eq!(ImageFormat::detect(b"\x89PNG\r\n\x1a\n..."), Some(ImageFormat::Png));
        assert_eq!(ImageFormat::detect(&[0xff, 0xd8, 0xff, 0xe0]), Some(ImageFormat::Jpeg));
        assert_eq!(ImageFormat::detect(b"GIF89a"), None);
        assert!(LogoImage::from_bytes(b"not an image".to_vec()).is_none());
    }
}
