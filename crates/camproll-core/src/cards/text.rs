//! Text measurement, wrapping and name abbreviation for cards.

use crate::utils::truncate_string;

/// Points per millimetre
pub const PT_PER_MM: f32 = 72.0 / 25.4;

/// Helvetica-Bold advance widths (1/1000 em) for ASCII 32..=126
const HELVETICA_BOLD_WIDTHS: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 278, 333, 333, 389, 584, 278, 333, 278, 278, // ' '..'/'
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // '0'..'?'
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // '@'..'O'
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 'P'..'_'
    278, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // '`'..'o'
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 'p'..'~'
];

/// Width used for characters outside the table
const DEFAULT_CHAR_WIDTH: u16 = 556;

fn char_width(c: char) -> u16 {
    let code = c as u32;
    if (32..=126).contains(&code) {
        HELVETICA_BOLD_WIDTHS[(code - 32) as usize]
    } else {
        DEFAULT_CHAR_WIDTH
    }
}

/// Rendered width of `text` in points at `font_size`.
pub fn text_width_pt(text: &str, font_size: f32) -> f32 {
    let units: u32 = text.chars().map(|c| u32::from(char_width(c))).sum();
    units as f32 * font_size / 1000.0
}

/// Greedy word wrap: words are added to the current line while it fits in
/// `max_width_pt`. A single word wider than the limit gets a line of its own.
pub fn wrap_text(text: &str, font_size: f32, max_width_pt: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{} {}", line, word)
        };

        if text_width_pt(&candidate, font_size) <= max_width_pt || line.is_empty() {
            line = candidate;
        } else {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        }
    }
    lines.push(line);
    lines
}

/// Shorten a display name to at most `max_len` characters.
///
/// Names with middle names keep first and last in full and reduce the
/// middles to initials (`Jonathan M. R. Smith`). Otherwise, or if that is
/// still too long, the name is cut and ends in `...`.
pub fn abbreviate_name(name: &str, max_len: usize) -> String {
    if name.chars().count() <= max_len {
        return name.to_string();
    }

    let parts: Vec<&str> = name.split_whitespace().collect();
    let abbreviated = match parts.as_slice() {
        [first, middles @ .., last] if !middles.is_empty() => {
            let initials: Vec<String> = middles
                .iter()
                .filter_map(|m| m.chars().next())
                .map(|c| format!("{}.", c))
                .collect();
            format!("{} {} {}", first, initials.join(" "), last)
        }
        _ => return truncate_string(name, max_len),
    };

    truncate_string(&abbreviated, max_len)
}
