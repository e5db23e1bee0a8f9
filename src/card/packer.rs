//! Greedy packing of fixed-shape entry blocks into the space left on a page.
//!
//! Page 1 packs single-column and checks every block on a [`DryRun`] before
//! drawing it, so wrapped values never straddle the footer. Continuation pages
//! pack two columns of fixed-height, single-line blocks.

use super::canvas::{DryRun, Surface};
use super::fonts::TextStyle;
use super::record::CompanyEntry;
use super::text::{ellipsize, print_field, Cursor};
use super::{CardError, LINE_HEIGHT};

/// Blank space below every entry block.
pub const ENTRY_PADDING: i32 = 20;

/// Height of one block in a dual-column page.
pub const ENTRY_HEIGHT: i32 = 3 * LINE_HEIGHT + ENTRY_PADDING;

/// Where entries start on a continuation page, below its title.
pub const CONTINUATION_TOP: i32 = 220;

const COLUMN_GUTTER: i32 = 50;
const COMPACT_LABEL_WIDTH: i32 = 170;

/// An item drawn as three `label: value` lines.
pub trait PackItem {
    fn block(&self) -> [(&'static str, String); 3];
}

impl PackItem for CompanyEntry {
    fn block(&self) -> [(&'static str, String); 3] {
        let cargo = if self.desde.trim().is_empty() {
            self.cargo.clone()
        } else {
            format!("{} (desde {})", self.cargo, self.desde)
        };
        [
            ("Razón Social", self.razon_social.clone()),
            ("RUC", self.ruc.clone()),
            ("Cargo", cargo),
        ]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Columns {
    Single,
    Dual,
}

/// Outcome of one [`pack`] call.
#[derive(Debug)]
pub struct Packed<'a, T> {
    /// Cursor below the lowest drawn block.
    pub cursor: Cursor,
    pub placed: usize,
    /// Items that did not fit, in their original order.
    pub rest: &'a [T],
    /// Items per column, `(placed, 0)` in single-column mode.
    pub columns: (usize, usize),
}

/// Place as many leading `items` as fit between `start` and `limit`.
pub fn pack<'a, T, S>(
    surface: &mut S,
    items: &'a [T],
    start: Cursor,
    columns: Columns,
    limit: i32,
) -> Result<Packed<'a, T>, CardError>
where
    T: PackItem,
    S: Surface + ?Sized,
{
    if items.is_empty() {
        return Ok(Packed {
            cursor: start,
            placed: 0,
            rest: items,
            columns: (0, 0),
        });
    }
    match columns {
        Columns::Single => Ok(pack_single(surface, items, start, limit)),
        Columns::Dual => pack_dual(surface, items, start, limit),
    }
}

fn pack_single<'a, T, S>(surface: &mut S, items: &'a [T], start: Cursor, limit: i32) -> Packed<'a, T>
where
    T: PackItem,
    S: Surface + ?Sized,
{
    let mut cursor = start;
    let mut placed = 0;

    for item in items {
        let projected = draw_block(&mut DryRun::new(surface.fonts()), cursor, item);
        if projected.y > limit {
            break;
        }
        cursor = draw_block(surface, cursor, item);
        placed += 1;
    }

    log::debug!("Single-column pack placed {placed} of {} items", items.len());
    Packed {
        cursor,
        placed,
        rest: &items[placed..],
        columns: (placed, 0),
    }
}

fn pack_dual<'a, T, S>(
    surface: &mut S,
    items: &'a [T],
    start: Cursor,
    limit: i32,
) -> Result<Packed<'a, T>, CardError>
where
    T: PackItem,
    S: Surface + ?Sized,
{
    let available = limit - start.y;
    let per_column = (available / ENTRY_HEIGHT).max(0) as usize;
    if per_column == 0 {
        return Err(CardError::PageTooSmall { available });
    }

    let taken = items.len().min(2 * per_column);
    let left_count = taken.div_ceil(2);
    let (left_items, right_items) = items[..taken].split_at(left_count);

    let width = (start.width - COLUMN_GUTTER) / 2;
    let left = draw_column(surface, Cursor::new(start.x, start.y, width), left_items);
    let right = draw_column(
        surface,
        Cursor::new(start.x + width + COLUMN_GUTTER, start.y, width),
        right_items,
    );

    log::debug!(
        "Dual-column pack placed {taken} of {} items ({} + {})",
        items.len(),
        left_items.len(),
        right_items.len()
    );
    Ok(Packed {
        cursor: start.at(left.y.max(right.y)),
        placed: taken,
        rest: &items[taken..],
        columns: (left_items.len(), right_items.len()),
    })
}

/// Full block with wrapped values.
fn draw_block<T, S>(surface: &mut S, cursor: Cursor, item: &T) -> Cursor
where
    T: PackItem,
    S: Surface + ?Sized,
{
    let end = item
        .block()
        .iter()
        .fold(cursor, |c, (label, value)| print_field(surface, c, label, Some(value.as_str())));
    end.down(ENTRY_PADDING)
}

/// One-line-per-field blocks stacked top-down.
fn draw_column<T, S>(surface: &mut S, start: Cursor, items: &[T]) -> Cursor
where
    T: PackItem,
    S: Surface + ?Sized,
{
    let value_width = (start.width - COMPACT_LABEL_WIDTH) as f32;
    let mut y = start.y;
    for item in items {
        for (label, value) in item.block() {
            let value = ellipsize(surface.fonts(), TextStyle::Body, value.trim(), value_width);
            let value = if value.is_empty() { "-".to_string() } else { value };
            surface.text(TextStyle::Label, start.x, y, &format!("{label}:"));
            surface.text(TextStyle::Body, start.x + COMPACT_LABEL_WIDTH, y, &value);
            y += LINE_HEIGHT;
        }
        y += ENTRY_PADDING;
    }
    start.at(y)
}
