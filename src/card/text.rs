//! Word wrapping and label/value fields.
//!
//! Layout state is a [`Cursor`] value: every call takes the cursor it starts
//! at and returns the cursor it ended at.

use super::canvas::Surface;
use super::fonts::{FontSet, TextStyle};
use super::LINE_HEIGHT;

/// Width of the bold label column in [`print_field`].
pub const LABEL_WIDTH: i32 = 250;

/// Fields sit closer together than wrapped lines.
const FIELD_TIGHTEN: i32 = 10;

const PLACEHOLDER: &str = "-";
const ELLIPSIS: &str = "...";

/// Column origin, maximum width and current vertical offset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cursor {
    pub x: i32,
    pub y: i32,
    pub width: i32,
}

impl Cursor {
    pub fn new(x: i32, y: i32, width: i32) -> Self {
        Self { x, y, width }
    }

    pub fn down(self, dy: i32) -> Self {
        Self { y: self.y + dy, ..self }
    }

    pub fn at(self, y: i32) -> Self {
        Self { y, ..self }
    }
}

/// Result of printing wrapped text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Wrapped {
    pub lines: usize,
    pub cursor: Cursor,
}

/// Greedy word wrap. A word that alone is wider than `max_width` gets a line
/// of its own; empty text yields a single empty line.
pub fn wrap_lines(fonts: &FontSet, style: TextStyle, text: &str, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut line = String::new();

    for word in text.split_whitespace() {
        let candidate = if line.is_empty() {
            word.to_string()
        } else {
            format!("{line} {word}")
        };
        if !line.is_empty() && fonts.measure(style, &candidate) > max_width {
            lines.push(std::mem::replace(&mut line, word.to_string()));
        } else {
            line = candidate;
        }
    }
    lines.push(line);
    lines
}

/// Print `text` wrapped to the cursor's width, one [`LINE_HEIGHT`] per line.
/// The returned cursor sits one line below the last printed line.
pub fn print_wrapped<S: Surface + ?Sized>(
    surface: &mut S,
    style: TextStyle,
    cursor: Cursor,
    text: &str,
) -> Wrapped {
    let lines = wrap_lines(surface.fonts(), style, text, cursor.width as f32);
    let mut y = cursor.y;
    for line in &lines {
        surface.text(style, cursor.x, y, line);
        y += LINE_HEIGHT;
    }
    Wrapped {
        lines: lines.len(),
        cursor: cursor.at(y),
    }
}

/// Print `label:` in bold and the wrapped value beside it.
///
/// The value column starts [`LABEL_WIDTH`] into the cursor's column and uses
/// the rest of its width. Missing or blank values print as `-`.
pub fn print_field<S: Surface + ?Sized>(
    surface: &mut S,
    cursor: Cursor,
    label: &str,
    value: Option<&str>,
) -> Cursor {
    surface.text(TextStyle::Label, cursor.x, cursor.y, &format!("{label}:"));

    let value = value.map(str::trim).filter(|v| !v.is_empty()).unwrap_or(PLACEHOLDER);
    let value_column = Cursor::new(cursor.x + LABEL_WIDTH, cursor.y, cursor.width - LABEL_WIDTH);
    let wrapped = print_wrapped(surface, TextStyle::Body, value_column, value);

    cursor.at(wrapped.cursor.y - FIELD_TIGHTEN)
}

/// Shorten `text` with a trailing `...` until it fits in `max_width`.
pub fn ellipsize(fonts: &FontSet, style: TextStyle, text: &str, max_width: f32) -> String {
    if fonts.measure(style, text) <= max_width {
        return text.to_string();
    }
    let mut chars: Vec<char> = text.chars().collect();
    while !chars.is_empty() {
        chars.pop();
        let candidate = format!("{}{ELLIPSIS}", chars.iter().collect::<String>().trim_end());
        if fonts.measure(style, &candidate) <= max_width {
            return candidate;
        }
    }
    ELLIPSIS.to_string()
}

/// First `max` characters of `text`.
pub fn truncate_chars(text: &str, max: usize) -> String {
    text.chars().take(max).collect()
}
