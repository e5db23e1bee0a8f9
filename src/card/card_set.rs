//! Decides which cards a record needs and renders them in order.

use rand::Rng;

use super::assets::CardAssets;
use super::canvas::{Canvas, Surface};
use super::fonts::{FontSet, TextStyle};
use super::packer::{pack, Columns};
use super::record::Record;
use super::renderer::{render_card, CardKind};
use super::{CardError, CONTENT_LIMIT, HEADING_SPACING};

const COMPANY_HEADING: &str = "Registros de Empresas";

/// One finished card.
#[derive(Debug, Clone)]
pub struct Card {
    pub kind: CardKind,
    pub png: Vec<u8>,
    /// Company entries packed onto this card, zero for table cards.
    pub companies_placed: usize,
}

impl Card {
    pub fn suffix(&self) -> String {
        self.kind.suffix()
    }
}

/// All cards for one query, in render order.
#[derive(Debug, Clone, Default)]
pub struct CardSet {
    pub cards: Vec<Card>,
}

impl CardSet {
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    pub fn suffixes(&self) -> Vec<String> {
        self.cards.iter().map(Card::suffix).collect()
    }

    fn push(&mut self, kind: CardKind, canvas: Canvas<'_>, companies_placed: usize) -> Result<(), CardError> {
        self.cards.push(Card {
            kind,
            png: canvas.finish()?,
            companies_placed,
        });
        Ok(())
    }
}

/// Render the personal card, company continuation pages, then one table card
/// per non-empty list.
pub fn build_card_set<R: Rng + ?Sized>(
    id: &str,
    record: &Record,
    assets: &CardAssets,
    fonts: &FontSet,
    rng: &mut R,
) -> Result<CardSet, CardError> {
    let mut set = CardSet::default();

    let mut personal = render_card(CardKind::Personal, record, assets, fonts, rng);
    let heading = personal.cursor.down(HEADING_SPACING / 2);
    let first = pack(
        &mut personal.canvas,
        &record.companies,
        heading.down(HEADING_SPACING),
        Columns::Single,
        CONTENT_LIMIT,
    )?;
    if first.placed > 0 {
        personal
            .canvas
            .text(TextStyle::Heading, heading.x, heading.y, COMPANY_HEADING);
    }
    set.push(CardKind::Personal, personal.canvas, first.placed)?;

    let mut remaining = first.rest;
    let mut page = 2;
    while !remaining.is_empty() {
        let kind = CardKind::Continuation(page);
        let mut rendered = render_card(kind, record, assets, fonts, rng);
        let packed = pack(
            &mut rendered.canvas,
            remaining,
            rendered.cursor,
            Columns::Dual,
            CONTENT_LIMIT,
        )?;
        set.push(kind, rendered.canvas, packed.placed)?;
        remaining = packed.rest;
        page += 1;
    }

    for (kind, present) in [
        (CardKind::Salary, !record.salaries.is_empty()),
        (CardKind::Phone, !record.phones.is_empty()),
        (CardKind::Company, !record.companies.is_empty()),
    ] {
        if present {
            let rendered = render_card(kind, record, assets, fonts, rng);
            set.push(kind, rendered.canvas, 0)?;
        }
    }

    log::info!("Rendered {} cards for DNI {}: {:?}", set.len(), id, set.suffixes());
    Ok(set)
}
