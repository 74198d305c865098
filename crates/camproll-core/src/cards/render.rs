use serde::{Deserialize, Serialize};
use tracing::debug;

use super::layout::{CardLayout, Rgb};
use super::text::{abbreviate_name, text_width_pt, wrap_text, PT_PER_MM};
use crate::error::Result;
use crate::models::{Attendee, Cohort, Group, RoomMapping};
use crate::utils::format_optional;

/// Placeholder for any field with no value
pub const NOT_AVAILABLE: &str = "N/A";

/// What a single ID card says.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Card {
    pub name: String,
    pub origin: String,
    pub group: String,
    pub room: String,
}

impl Card {
    pub fn for_attendee(
        attendee: &Attendee,
        group_name: &str,
        rooms: &RoomMapping,
        name_max_chars: usize,
    ) -> Self {
        Self {
            name: abbreviate_name(attendee.display_name(), name_max_chars),
            origin: format_optional(attendee.origin_key(), NOT_AVAILABLE),
            group: group_name.to_string(),
            room: format_optional(rooms.room_for(&attendee.serial), NOT_AVAILABLE),
        }
    }
}

/// One line of text, positioned by its lower-left corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextLine {
    pub text: String,
    pub font_size: f32,
    pub x_mm: f32,
    pub y_mm: f32,
}

/// A card with its slot, rectangle, colour and laid-out text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlacedCard {
    pub card: Card,
    pub slot: usize,
    pub x_mm: f32,
    pub y_mm: f32,
    pub width_mm: f32,
    pub height_mm: f32,
    pub fill: Rgb,
    pub lines: Vec<TextLine>,
}

/// Back end that turns placed cards into a paginated document.
pub trait DocumentSink {
    fn begin_document(&mut self, title: &str, layout: &CardLayout) -> Result<()>;
    fn start_page(&mut self) -> Result<()>;
    fn draw_card(&mut self, card: &PlacedCard) -> Result<()>;
    fn finish_page(&mut self) -> Result<()>;
    fn finish_document(&mut self) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RenderSummary {
    pub cards: usize,
    pub pages: usize,
}

/// Pages needed for `cards` cards at `per_page` per page.
pub fn page_count(cards: usize, per_page: usize) -> usize {
    cards.div_ceil(per_page)
}

pub struct CardRenderer {
    layout: CardLayout,
}

impl CardRenderer {
    pub fn new(layout: CardLayout) -> Self {
        Self { layout }
    }

    pub fn layout(&self) -> &CardLayout {
        &self.layout
    }

    /// Centre `text` on the card at `baseline_mm`, wrapping onto lines below.
    fn field_lines(&self, text: &str, font_size: f32, center_x: f32, baseline_mm: f32) -> Vec<TextLine> {
        let max_width_pt = self.layout.text_width_mm() * PT_PER_MM;
        let line_height_mm = (font_size + self.layout.line_gap_pt) / PT_PER_MM;

        wrap_text(text, font_size, max_width_pt)
            .into_iter()
            .enumerate()
            .map(|(i, line)| {
                let width_mm = text_width_pt(&line, font_size) / PT_PER_MM;
                TextLine {
                    x_mm: center_x - width_mm / 2.0,
                    y_mm: baseline_mm - i as f32 * line_height_mm,
                    font_size,
                    text: line,
                }
            })
            .collect()
    }

    /// Position a card in `slot` (0-based within the page).
    pub fn place(&self, card: Card, slot: usize) -> PlacedCard {
        let layout = &self.layout;
        let (x, y) = layout.slot_origin(slot);
        let center_x = x + layout.card_width_mm / 2.0;

        let fields = [
            (format!("Name: {}", card.name), layout.name_font_size, layout.name_offset_mm),
            (format!("Group: {}", card.group), layout.body_font_size, layout.group_offset_mm),
            (
                format!("Church/Location: {}", card.origin),
                layout.body_font_size,
                layout.origin_offset_mm,
            ),
            (format!("Room: {}", card.room), layout.body_font_size, layout.room_offset_mm),
        ];

        let lines = fields
            .iter()
            .flat_map(|(text, size, offset)| self.field_lines(text, *size, center_x, y + offset))
            .collect();

        PlacedCard {
            fill: layout.palette.color_for(&card.group),
            card,
            slot,
            x_mm: x,
            y_mm: y,
            width_mm: layout.card_width_mm,
            height_mm: layout.card_height_mm,
            lines,
        }
    }

    /// Lay out a group's cards page by page, in member order.
    pub fn plan_group(&self, group: &Group, rooms: &RoomMapping) -> Vec<Vec<PlacedCard>> {
        let per_page = self.layout.cards_per_page();
        let cards: Vec<PlacedCard> = group
            .members()
            .iter()
            .enumerate()
            .map(|(i, member)| {
                let card = Card::for_attendee(member, &group.name, rooms, self.layout.name_max_chars);
                self.place(card, i % per_page)
            })
            .collect();

        let mut pages = Vec::with_capacity(page_count(cards.len(), per_page));
        pages.extend(cards.chunks(per_page).map(|page| page.to_vec()));
        pages
    }

    /// Render one group's cards into `sink`. A partly filled last page is
    /// still finished.
    pub fn render_group<S: DocumentSink + ?Sized>(
        &self,
        group: &Group,
        rooms: &RoomMapping,
        sink: &mut S,
    ) -> Result<RenderSummary> {
        let pages = self.plan_group(group, rooms);

        sink.begin_document(&group.name, &self.layout)?;
        for page in &pages {
            sink.start_page()?;
            for card in page {
                sink.draw_card(card)?;
            }
            sink.finish_page()?;
        }
        sink.finish_document()?;

        let summary = RenderSummary {
            cards: group.members.len(),
            pages: pages.len(),
        };
        debug!(group = %group.name, cards = summary.cards, pages = summary.pages, "Rendered group cards");
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cards::layout::{KHAKI, LIGHT_BLUE};
    use crate::models::{CellValue, Gender, Room};

    fn attendee(serial: usize, name: &str) -> Attendee {
        Attendee {
            serial: serial.to_string(),
            name: Some(name.to_string()),
            gender: Gender::Female,
            church: Some("Grace Chapel".to_string()),
            location: None,
            cells: vec![CellValue::Number(serial as f64)],
        }
    }

    fn group(name: &str, count: usize) -> Group {
        Group::new(name, (0..count).map(|i| attendee(i, "Ann Lee")).collect())
    }

    /// Records sink calls for assertions
    #[derive(Default)]
    struct RecordingSink {
        events: Vec<String>,
        cards: Vec<PlacedCard>,
    }

    impl DocumentSink for RecordingSink {
        fn begin_document(&mut self, title: &str, _layout: &CardLayout) -> Result<()> {
            self.events.push(format!("begin {}", title));
            Ok(())
        }
        fn start_page(&mut self) -> Result<()> {
            self.events.push("start".to_string());
            Ok(())
        }
        fn draw_card(&mut self, card: &PlacedCard) -> Result<()> {
            self.events.push(format!("card {}", card.slot));
            self.cards.push(card.clone());
            Ok(())
        }
        fn finish_page(&mut self) -> Result<()> {
            self.events.push("finish".to_string());
            Ok(())
        }
        fn finish_document(&mut self) -> Result<()> {
            self.events.push("end".to_string());
            Ok(())
        }
    }

    // -------------------------------------------------------------------------
    // Card Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_card_uses_room_mapping_and_placeholder() {
        let rooms = RoomMapping::from_rooms(&[Room {
            name: "Female Room 2".to_string(),
            sex: Gender::Female,
            capacity: 1,
            members: vec![attendee(1, "Ann")],
        }]);

        let card = Card::for_attendee(&attendee(1, "Ann"), "A", &rooms, 20);
        assert_eq!(card.room, "Female Room 2");
        assert_eq!(card.origin, "Grace Chapel");

        let card = Card::for_attendee(&attendee(2, "Bea"), "A", &rooms, 20);
        assert_eq!(card.room, NOT_AVAILABLE);
    }

    #[test]
    fn test_card_name_is_abbreviated() {
        let card = Card::for_attendee(
            &attendee(1, "Jonathan Michael Robert Smith"),
            "A",
            &RoomMapping::default(),
            20,
        );
        assert_eq!(card.name, "Jonathan M. R. Smith");
    }

    #[test]
    fn test_missing_name_and_origin_show_placeholder() {
        let mut a = attendee(1, "x");
        a.name = None;
        a.church = None;
        let card = Card::for_attendee(&a, "A", &RoomMapping::default(), 20);
        assert_eq!(card.name, NOT_AVAILABLE);
        assert_eq!(card.origin, NOT_AVAILABLE);
    }

    // -------------------------------------------------------------------------
    // Placement Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_placed_card_colour_follows_group() {
        let renderer = CardRenderer::new(CardLayout::default());
        let card = |group: &str| Card {
            name: "Ann".to_string(),
            origin: "X".to_string(),
            group: group.to_string(),
            room: "N/A".to_string(),
        };
        assert_eq!(renderer.place(card("O"), 0).fill, KHAKI);
        assert_eq!(renderer.place(card("Unlisted"), 0).fill, LIGHT_BLUE);
    }

    #[test]
    fn test_text_lines_are_centered_and_inside_card() {
        let renderer = CardRenderer::new(CardLayout::default());
        let placed = renderer.place(
            Card {
                name: "Ann Lee".to_string(),
                origin: "Saint Bartholomew of the Lakes Community Fellowship Church".to_string(),
                group: "A".to_string(),
                room: "Female Room 1".to_string(),
            },
            3,
        );

        let center = placed.x_mm + placed.width_mm / 2.0;
        for line in &placed.lines {
            let width = text_width_pt(&line.text, line.font_size) / PT_PER_MM;
            assert!((line.x_mm + width / 2.0 - center).abs() < 1e-3);
            assert!(line.x_mm >= placed.x_mm);
            assert!(line.x_mm + width <= placed.x_mm + placed.width_mm);
        }

        // The long origin wraps onto extra lines below its baseline
        let origin_lines: Vec<&TextLine> = placed
            .lines
            .iter()
            .filter(|l| l.font_size == 10.0 && !l.text.starts_with("Group") && !l.text.starts_with("Room"))
            .collect();
        assert!(origin_lines.len() > 1);
        assert!(origin_lines[1].y_mm < origin_lines[0].y_mm);
        assert!((origin_lines[0].y_mm - (placed.y_mm + 20.0)).abs() < 1e-3);
    }

    // -------------------------------------------------------------------------
    // Pagination Tests
    // -------------------------------------------------------------------------

    #[test]
    fn test_page_count() {
        assert_eq!(page_count(0, 6), 0);
        assert_eq!(page_count(6, 6), 1);
        assert_eq!(page_count(7, 6), 2);
        assert_eq!(page_count(13, 6), 3);
    }

    #[test]
    fn test_render_finishes_partial_last_page() {
        let renderer = CardRenderer::new(CardLayout::default());
        let mut sink = RecordingSink::default();
        let summary = renderer
            .render_group(&group("B", 8), &RoomMapping::default(), &mut sink)
            .unwrap();

        assert_eq!(summary, RenderSummary { cards: 8, pages: 2 });
        assert_eq!(sink.cards.len(), 8);
        assert_eq!(sink.events.first().map(String::as_str), Some("begin B"));
        assert_eq!(sink.events.last().map(String::as_str), Some("end"));
        assert_eq!(sink.events.iter().filter(|e| *e == "start").count(), 2);
        assert_eq!(sink.events.iter().filter(|e| *e == "finish").count(), 2);
        // Slots restart on the second page
        assert_eq!(sink.cards[6].slot, 0);
        assert_eq!(sink.cards[7].slot, 1);
    }

    #[test]
    fn test_card_and_page_counts_match_group_size() {
        let renderer = CardRenderer::new(CardLayout::default());
        for count in [0usize, 1, 5, 6, 12, 19] {
            let mut sink = RecordingSink::default();
            let summary = renderer
                .render_group(&group("C", count), &RoomMapping::default(), &mut sink)
                .unwrap();
            assert_eq!(summary.cards, count);
            assert_eq!(summary.pages, page_count(count, 6));
            assert_eq!(sink.cards.len(), count);
        }
    }
}
