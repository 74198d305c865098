use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use printpdf::path::{PaintMode, WindingOrder};
use printpdf::{
    BuiltinFont, Color, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference,
    Point, Polygon, Rgb as PdfRgb,
};
use tracing::debug;

use super::layout::{CardLayout, Rgb, BLACK};
use super::render::{DocumentSink, PlacedCard};
use crate::error::{CampError, Result};

const LAYER_NAME: &str = "Cards";

/// Card border thickness in points
const OUTLINE_THICKNESS: f32 = 1.0;

fn pdf_color(color: Rgb) -> Color {
    let (r, g, b) = color.as_unit();
    Color::Rgb(PdfRgb::new(r, g, b, None))
}

fn pdf_error<E: std::fmt::Debug>(e: E) -> CampError {
    CampError::Pdf(format!("{:?}", e))
}

struct OpenDocument {
    doc: PdfDocumentReference,
    font: IndirectFontRef,
    layer: PdfLayerReference,
    page_width: Mm,
    page_height: Mm,
    /// `PdfDocument::new` creates the first page up front
    first_page_pending: bool,
    pages: usize,
}

/// Writes a card sheet as a PDF file.
pub struct PdfSink {
    path: PathBuf,
    open: Option<OpenDocument>,
}

impl PdfSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            open: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn document(&mut self) -> Result<&mut OpenDocument> {
        self.open
            .as_mut()
            .ok_or_else(|| CampError::Pdf("no document in progress".to_string()))
    }
}

impl DocumentSink for PdfSink {
    fn begin_document(&mut self, title: &str, layout: &CardLayout) -> Result<()> {
        let page_width = Mm(layout.page_width_mm);
        let page_height = Mm(layout.page_height_mm);
        let (doc, page, layer) = PdfDocument::new(title, page_width, page_height, LAYER_NAME);
        let font = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        let layer = doc.get_page(page).get_layer(layer);

        self.open = Some(OpenDocument {
            doc,
            font,
            layer,
            page_width,
            page_height,
            first_page_pending: true,
            pages: 0,
        });
        Ok(())
    }

    fn start_page(&mut self) -> Result<()> {
        let open = self.document()?;
        if open.first_page_pending {
            open.first_page_pending = false;
        } else {
            let (page, layer) = open.doc.add_page(open.page_width, open.page_height, LAYER_NAME);
            open.layer = open.doc.get_page(page).get_layer(layer);
        }
        open.pages += 1;
        Ok(())
    }

    fn draw_card(&mut self, card: &PlacedCard) -> Result<()> {
        let open = self.document()?;
        let layer = &open.layer;

        let (x0, y0) = (card.x_mm, card.y_mm);
        let (x1, y1) = (card.x_mm + card.width_mm, card.y_mm + card.height_mm);
        let corners = vec![
            (Point::new(Mm(x0), Mm(y0)), false),
            (Point::new(Mm(x1), Mm(y0)), false),
            (Point::new(Mm(x1), Mm(y1)), false),
            (Point::new(Mm(x0), Mm(y1)), false),
        ];

        layer.set_fill_color(pdf_color(card.fill));
        layer.set_outline_color(pdf_color(BLACK));
        layer.set_outline_thickness(OUTLINE_THICKNESS);
        layer.add_polygon(Polygon {
            rings: vec![corners],
            mode: PaintMode::FillStroke,
            winding_order: WindingOrder::NonZero,
        });

        layer.set_fill_color(pdf_color(BLACK));
        for line in &card.lines {
            layer.use_text(
                line.text.as_str(),
                line.font_size,
                Mm(line.x_mm),
                Mm(line.y_mm),
                &open.font,
            );
        }
        Ok(())
    }

    fn finish_page(&mut self) -> Result<()> {
        // Pages are self-contained in printpdf; nothing to flush
        self.document().map(|_| ())
    }

    fn finish_document(&mut self) -> Result<()> {
        let open = self
            .open
            .take()
            .ok_or_else(|| CampError::Pdf("no document in progress".to_string()))?;

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let mut writer = BufWriter::new(File::create(&self.path)?);
        open.doc.save(&mut writer).map_err(pdf_error)?;
        debug!(path = %self.path.display(), pages = open.pages, "Saved PDF");
        Ok(())
    }
}
