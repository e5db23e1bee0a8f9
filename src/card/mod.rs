//! Card module - turns an upstream lookup result into rendered PNG cards.
//!
//! This module is split by stage:
//! - `parser` - upstream text to typed [`Record`]
//! - `text` - word wrapping and label/value fields on a layout [`Cursor`]
//! - `canvas` - the raster surface and its drawing primitives
//! - `renderer` - fixed layouts for each [`CardKind`]
//! - `packer` - fits company entries into page budgets
//! - `card_set` - decides which cards a record needs and renders them in order

pub mod assets;
pub mod canvas;
pub mod card_set;
pub mod fonts;
pub mod packer;
pub mod parser;
pub mod record;
pub mod renderer;
pub mod text;

pub use assets::{AssetFetcher, CardAssets, FetchError, HttpAssetFetcher};
pub use canvas::{Canvas, DryRun, Surface};
pub use card_set::{build_card_set, Card, CardSet};
pub use fonts::{FontSet, GlyphSource, TextStyle, TrueTypeGlyphs};
pub use packer::{pack, Columns, PackItem, Packed};
pub use parser::{parse_record, ParseError};
pub use record::{CompanyEntry, EntryKind, PersonalRecord, PhoneEntry, Record, SalaryEntry};
pub use renderer::{render_card, CardKind, Rendered};
pub use text::Cursor;

use std::path::PathBuf;
use thiserror::Error;

pub const IMAGE_WIDTH: u32 = 1080;
pub const IMAGE_HEIGHT: u32 = 1920;
pub const MARGIN_H: i32 = 50;
pub const LINE_HEIGHT: i32 = 40;
pub const HEADING_SPACING: i32 = 50;

/// Baseline of the disclaimer printed on every card.
pub const FOOTER_Y: i32 = IMAGE_HEIGHT as i32 - 100;

/// Nothing but the footer may be drawn below this line.
pub const CONTENT_LIMIT: i32 = IMAGE_HEIGHT as i32 - 150;

/// Width available to full-width content.
pub const CONTENT_WIDTH: i32 = IMAGE_WIDTH as i32 - 2 * MARGIN_H;

/// Errors that can occur while rendering cards.
#[derive(Debug, Error)]
pub enum CardError {
    #[error("failed to read font {path}: {source}")]
    FontIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid TrueType data in {0}")]
    FontData(PathBuf),
    #[error("failed to encode PNG: {0}")]
    Encode(#[from] image::ImageError),
    #[error("continuation page has no room for a single entry ({available}px available)")]
    PageTooSmall { available: i32 },
}
