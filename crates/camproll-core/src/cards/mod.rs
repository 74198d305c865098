//! Printable ID cards.
//!
//! `CardRenderer` turns a group into pages of `PlacedCard`s using an
//! explicit `CardLayout`, then drives a `DocumentSink`. `PdfSink` is the
//! production sink; tests record sink calls instead.

pub mod layout;
pub mod pdf;
pub mod render;
pub mod text;

pub use layout::{CardLayout, Palette, Rgb};
pub use pdf::PdfSink;
pub use render::{
    page_count, Card, CardRenderer, DocumentSink, PlacedCard, RenderSummary, TextLine,
    NOT_AVAILABLE,
};
pub use text::{abbreviate_name, text_width_pt, wrap_text};
