//! PDF encoding of an [`InvoiceLayout`] with `printpdf`.

use std::collections::HashMap;
use std::io::Cursor;

use printpdf::image_crate::ImageDecoder;
use printpdf::image_crate::codecs::jpeg::JpegDecoder;
use printpdf::image_crate::codecs::png::PngDecoder;
use printpdf::{
    BuiltinFont, Color, Image, ImageTransform, IndirectFontRef, Mm, PdfDocument,
    PdfDocumentReference, PdfLayerReference, Pt,
};

use crate::error::RenderError;

use super::layout::{
    DrawOp, FontStyle, ImageFormat, InvoiceLayout, LOGO_PLACEHOLDER, LogoImage, PAGE_HEIGHT,
    PAGE_WIDTH, PLACEHOLDER_ORIGIN, PLACEHOLDER_STYLE, Rgb, TextStyle,
};

/// Resolution at which one image pixel maps to one point.
const POINT_DPI: f32 = 72.0;

/// Encode `layout` as PDF bytes.
pub fn encode_pdf(layout: &InvoiceLayout) -> Result<Vec<u8>, RenderError> {
    let width = Mm::from(Pt(PAGE_WIDTH));
    let height = Mm::from(Pt(PAGE_HEIGHT));

    let (doc, first_page, first_layer) = PdfDocument::new(&layout.title, width, height, "Invoice");
    let mut layers = vec![doc.get_page(first_page).get_layer(first_layer)];
    for _ in 1..layout.page_count.max(1) {
        let (page, layer) = doc.add_page(width, height, "Invoice");
        layers.push(doc.get_page(page).get_layer(layer));
    }

    let fonts = Fonts::load(&doc)?;

    for op in &layout.ops {
        let Some(layer) = layers.get(op.page()) else {
            tracing::warn!(page = op.page(), "Draw op targets a page outside the layout");
            continue;
        };
        match op {
            DrawOp::Text {
                x, y, text, style, ..
            } => draw_text(layer, &fonts, *x, *y, text, style),
            DrawOp::Image {
                x,
                y,
                width,
                height,
                logo,
                ..
            } => {
                if let Err(e) = draw_image(layer, logo, *x, *y, *width, *height) {
                    // Decorative only: fall back to the placeholder notice
                    tracing::warn!("Could not embed logo, drawing placeholder: {e}");
                    let (px, py) = PLACEHOLDER_ORIGIN;
                    draw_text(layer, &fonts, px, py, LOGO_PLACEHOLDER, &PLACEHOLDER_STYLE);
                }
            }
        }
    }

    doc.save_to_bytes()
        .map_err(|e| RenderError::Pdf(e.to_string()))
}

/// The three Helvetica faces the layout uses.
struct Fonts {
    faces: HashMap<FontStyle, IndirectFontRef>,
}

impl Fonts {
    fn load(doc: &PdfDocumentReference) -> Result<Self, RenderError> {
        let mut faces = HashMap::new();
        for (style, builtin) in [
            (FontStyle::Regular, BuiltinFont::Helvetica),
            (FontStyle::Bold, BuiltinFont::HelveticaBold),
            (FontStyle::Oblique, BuiltinFont::HelveticaOblique),
        ] {
            let font = doc
                .add_builtin_font(builtin)
                .map_err(|e| RenderError::Pdf(e.to_string()))?;
            faces.insert(style, font);
        }
        Ok(Self { faces })
    }

    fn get(&self, style: FontStyle) -> &IndirectFontRef {
        // All three faces are inserted by load()
        &self.faces[&style]
    }
}

fn draw_text(
    layer: &PdfLayerReference,
    fonts: &Fonts,
    x: f32,
    y: f32,
    text: &str,
    style: &TextStyle,
) {
    layer.set_fill_color(pdf_color(style.color));
    layer.use_text(
        text,
        style.size,
        Mm::from(Pt(x)),
        Mm::from(Pt(y)),
        fonts.get(style.font),
    );
}

fn draw_image(
    layer: &PdfLayerReference,
    logo: &LogoImage,
    x: f32,
    y: f32,
    width: f32,
    height: f32,
) -> Result<(), printpdf::image_crate::ImageError> {
    let reader = Cursor::new(logo.bytes.as_slice());
    let ((px_w, px_h), image) = match logo.format {
        ImageFormat::Png => {
            let decoder = PngDecoder::new(reader)?;
            (decoder.dimensions(), Image::try_from(decoder)?)
        }
        ImageFormat::Jpeg => {
            let decoder = JpegDecoder::new(reader)?;
            (decoder.dimensions(), Image::try_from(decoder)?)
        }
    };

    image.add_to_layer(
        layer.clone(),
        ImageTransform {
            translate_x: Some(Mm::from(Pt(x))),
            translate_y: Some(Mm::from(Pt(y))),
            dpi: Some(POINT_DPI),
            scale_x: Some(width / px_w.max(1) as f32),
            scale_y: Some(height / px_h.max(1) as f32),
            ..Default::default()
        },
    );
    Ok(())
}

fn pdf_color(c: Rgb) -> Color {
    Color::Rgb(printpdf::Rgb::new(c.r, c.g, c.b, None))
}

#[cfg(test)]
mod tests {
    use chrono::Utc;
    use rust_decimal_macros::dec;

    use super::*;
    use crate::invoice::BusinessProfile;
    use crate::invoice::layout::layout_invoice;
    use crate::order::CompletedOrder;

    fn order(products: usize) -> CompletedOrder {
        CompletedOrder {
            products: (1..=products).map(|i| format!("Item {i}")).collect(),
            address: "12 Lake Road\nChennai".into(),
            amount: dec!(450),
            shipping: dec!(60),
            total: dec!(510),
            completed_at: Utc::now(),
        }
    }

    #[test]
    fn encodes_a_pdf() {
        let layout = layout_invoice(&order(2), &BusinessProfile::default(), None);
        let bytes = encode_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
        assert!(bytes.len() > 100);
    }

    #[test]
    fn encodes_multi_page_layouts() {
        let layout = layout_invoice(&order(80), &BusinessProfile::default(), None);
        assert!(layout.page_count > 1);
        let bytes = encode_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }

    #[test]
    fn corrupt_logo_falls_back_to_placeholder() {
        // Valid PNG signature, garbage body: sniffing passes, decoding fails
        let logo = LogoImage::from_bytes(b"\x89PNG\r\n\x1a\ngarbage".to_vec()).unwrap();
        let layout = layout_invoice(&order(1), &BusinessProfile::default(), Some(logo));
        let bytes = encode_pdf(&layout).unwrap();
        assert!(bytes.starts_with(b"%PDF"));
    }
}
