//! Fixed layouts for every card kind.

use image::imageops::{self, FilterType};
use image::RgbaImage;
use rand::Rng;

use super::assets::CardAssets;
use super::canvas::{Canvas, Surface, RULE_COLOR, TEXT_COLOR};
use super::fonts::{FontSet, TextStyle};
use super::packer::CONTINUATION_TOP;
use super::record::Record;
use super::text::{ellipsize, print_field, truncate_chars, Cursor};
use super::{CONTENT_LIMIT, CONTENT_WIDTH, FOOTER_Y, HEADING_SPACING, IMAGE_WIDTH, LINE_HEIGHT, MARGIN_H};

pub const DISCLAIMER: &str =
    "Esta imagen es solo informativa. No representa un documento oficial ni tiene validez legal.";
const FALLBACK_TITLE: &str = "Consulta Ciudadana";
const QR_CAPTION: &str = "Escanea el QR";

const HEADER_Y: i32 = 50;
const ICON_WIDTH: u32 = 300;

const BODY_TOP: i32 = 300;
const COLUMN_WIDTH: i32 = IMAGE_WIDTH as i32 / 2 - MARGIN_H - 25;
const RIGHT_COLUMN_X: i32 = IMAGE_WIDTH as i32 / 2 + MARGIN_H;
const SEPARATOR_X: i32 = IMAGE_WIDTH as i32 / 2;
const SEPARATOR_TOP: i32 = BODY_TOP - 50;
const PHOTO_SIZE: (u32, u32) = (350, 400);
const QR_SIZE: u32 = 250;
const QR_MIN_Y: i32 = BODY_TOP + 450;
const QR_CAPTION_GAP: i32 = 260;

const SUMMARY_Y: i32 = 150;
const MAX_TABLE_ROWS: usize = 40;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CardKind {
    Personal,
    /// Overflow company entries, numbered from 2.
    Continuation(usize),
    Salary,
    Phone,
    Company,
}

impl CardKind {
    /// Stable tag used in file names and response keys.
    pub fn suffix(self) -> String {
        match self {
            Self::Personal => "PERSONALES".to_string(),
            Self::Continuation(n) => format!("PAGE_{n}"),
            Self::Salary => "SUELDOS".to_string(),
            Self::Phone => "TELEFONOS".to_string(),
            Self::Company => "EMPRESAS".to_string(),
        }
    }

    pub fn title(self) -> String {
        match self {
            Self::Personal => FALLBACK_TITLE.to_string(),
            Self::Continuation(n) => format!("Registros de Empresas - Página {n}"),
            Self::Salary => "Historial de Sueldos".to_string(),
            Self::Phone => "Registros Telefónicos".to_string(),
            Self::Company => "Registros de Empresas".to_string(),
        }
    }

    /// Continuation titles carry a page number and are set smaller so it
    /// stays on the canvas.
    pub fn title_style(self) -> TextStyle {
        match self {
            Self::Continuation(_) => TextStyle::Heading,
            _ => TextStyle::Title,
        }
    }
}

/// A drawn card that can still take more content below `cursor`.
pub struct Rendered<'f> {
    pub canvas: Canvas<'f>,
    /// Full-width cursor below the fixed content.
    pub cursor: Cursor,
}

/// Draw the fixed parts of `kind`: background, watermark, header, body and
/// footer. Optional assets that are missing are skipped.
pub fn render_card<'f, R: Rng + ?Sized>(
    kind: CardKind,
    record: &Record,
    assets: &CardAssets,
    fonts: &'f FontSet,
    rng: &mut R,
) -> Rendered<'f> {
    let mut canvas = Canvas::new(fonts);
    canvas.watermark(rng);

    let end = match kind {
        CardKind::Personal => {
            draw_header(&mut canvas, assets.icon.as_ref());
            draw_personal(&mut canvas, record, assets)
        }
        CardKind::Continuation(_) => {
            draw_title(&mut canvas, kind);
            CONTINUATION_TOP
        }
        CardKind::Salary => {
            let rows = record
                .salaries
                .iter()
                .map(|s| vec![&s.ruc, &s.empresa, &s.situacion, &s.sueldo, &s.periodo]);
            draw_table(&mut canvas, kind, record, &SALARY_COLUMNS, rows, record.salaries.len()).0
        }
        CardKind::Phone => {
            let rows = record
                .phones
                .iter()
                .map(|p| vec![&p.telefono, &p.plan, &p.fuente, &p.periodo]);
            draw_table(&mut canvas, kind, record, &PHONE_COLUMNS, rows, record.phones.len()).0
        }
        CardKind::Company => {
            let rows = record
                .companies
                .iter()
                .map(|c| vec![&c.ruc, &c.razon_social, &c.cargo, &c.desde]);
            draw_table(&mut canvas, kind, record, &COMPANY_COLUMNS, rows, record.companies.len()).0
        }
    };

    canvas.text(TextStyle::Body, MARGIN_H, FOOTER_Y, DISCLAIMER);
    log::debug!("Rendered {} card fixed content down to y={}", kind.suffix(), end);

    Rendered {
        canvas,
        cursor: Cursor::new(MARGIN_H, end, CONTENT_WIDTH),
    }
}

/// Centered icon scaled to 300px wide, or the title text when there is none.
fn draw_header(canvas: &mut Canvas<'_>, icon: Option<&RgbaImage>) {
    match icon.filter(|i| i.width() > 0 && i.height() > 0) {
        Some(icon) => {
            let height = (icon.height() as u64 * ICON_WIDTH as u64 / icon.width() as u64).max(1) as u32;
            let scaled = imageops::resize(icon, ICON_WIDTH, height, FilterType::Lanczos3);
            let x = (IMAGE_WIDTH - ICON_WIDTH) as i32 / 2;
            canvas.overlay(&scaled, x, HEADER_Y, 1.0);
        }
        None => canvas.text(TextStyle::Title, MARGIN_H, HEADER_Y, FALLBACK_TITLE),
    }
}

/// Two-column personal body. Returns the y below the taller column.
fn draw_personal(canvas: &mut Canvas<'_>, record: &Record, assets: &CardAssets) -> i32 {
    let p = &record.personal;
    let mut right_y = BODY_TOP;

    if let Some(photo) = &assets.photo {
        let (w, h) = PHOTO_SIZE;
        let scaled = imageops::resize(photo, w, h, FilterType::Lanczos3);
        let x = RIGHT_COLUMN_X + (COLUMN_WIDTH - w as i32) / 2;
        canvas.overlay(&scaled, x, BODY_TOP, 1.0);
        right_y += h as i32 + HEADING_SPACING;
    }

    let estatura = p.estatura.as_ref().map(|e| format!("{e} cm"));
    let mut left = Cursor::new(MARGIN_H, BODY_TOP, COLUMN_WIDTH);

    left = heading(canvas, left, "Datos Personales");
    for (label, value) in [
        ("DNI", p.dni.as_deref()),
        ("Apellidos", p.apellidos.as_deref()),
        ("Nombres", p.nombres.as_deref()),
        ("F. Nacimiento", p.fecha_nacimiento.as_deref()),
        ("Sexo", p.genero.as_deref()),
        ("Estado Civil", p.estado_civil.as_deref()),
        ("Estatura", estatura.as_deref()),
        ("Grado Inst.", p.grado_instruccion.as_deref()),
        ("Restricción", p.restriccion.as_deref()),
    ] {
        left = print_field(canvas, left, label, value);
    }

    left = heading(canvas, left.down(HEADING_SPACING / 2), "Info. Adicional y Padres");
    left = print_field(canvas, left, "F. Emisión", p.fecha_emision.as_deref());
    left = print_field(canvas, left, "F. Caducidad", p.fecha_caducidad.as_deref());
    if let Some(death) = p.fecha_fallecimiento.as_deref() {
        left = print_field(canvas, left, "F. Fallecimiento", Some(death));
    }
    left = print_field(canvas, left, "Padre", p.padre.as_deref());
    left = print_field(canvas, left, "Madre", p.madre.as_deref());

    left = heading(canvas, left.down(HEADING_SPACING / 2), "Dirección y Ubicación");
    for (label, value) in [
        ("Dirección", p.direccion.as_deref()),
        ("Distrito", p.distrito.as_deref()),
        ("Provincia", p.provincia.as_deref()),
        ("Departamento", p.departamento.as_deref()),
        ("Cod. Postal", p.codigo_postal.as_deref()),
    ] {
        left = print_field(canvas, left, label, value);
    }

    if let Some(qr) = &assets.qr {
        let scaled = imageops::resize(qr, QR_SIZE, QR_SIZE, FilterType::Nearest);
        let x = RIGHT_COLUMN_X + (COLUMN_WIDTH - QR_SIZE as i32) / 2;
        let y = right_y.max(QR_MIN_Y);
        canvas.overlay(&scaled, x, y, 1.0);
        canvas.text(TextStyle::Heading, x, y + QR_CAPTION_GAP, QR_CAPTION);
        right_y = y + QR_CAPTION_GAP + LINE_HEIGHT;
    }

    let end = left.y.max(right_y).min(CONTENT_LIMIT);
    canvas.fill_rect(SEPARATOR_X, SEPARATOR_TOP, 2, (end - SEPARATOR_TOP) as u32, TEXT_COLOR);
    end
}

/// Card title at the top, cut to the content width.
fn draw_title(canvas: &mut Canvas<'_>, kind: CardKind) {
    let style = kind.title_style();
    let title = ellipsize(canvas.fonts(), style, &kind.title(), CONTENT_WIDTH as f32);
    canvas.text(style, MARGIN_H, HEADER_Y, &title);
}

fn heading(canvas: &mut Canvas<'_>, cursor: Cursor, text: &str) -> Cursor {
    canvas.text(TextStyle::Heading, cursor.x, cursor.y, text);
    cursor.down(HEADING_SPACING)
}

/// One table column: header, width in px and the most characters shown.
struct Column {
    header: &'static str,
    width: i32,
    max_chars: usize,
}

const fn col(header: &'static str, width: i32, max_chars: usize) -> Column {
    Column {
        header,
        width,
        max_chars,
    }
}

const SALARY_COLUMNS: [Column; 5] = [
    col("RUC", 100, 11),
    col("EMPRESA", 300, 30),
    col("SIT.", 150, 5),
    col("SUELDO", 200, 12),
    col("PERIODO", 200, 10),
];

const PHONE_COLUMNS: [Column; 4] = [
    col("TELÉFONO", 250, 15),
    col("PLAN", 200, 20),
    col("FUENTE", 300, 30),
    col("PERIODO", 200, 10),
];

const COMPANY_COLUMNS: [Column; 4] = [
    col("RUC", 150, 11),
    col("RAZÓN SOCIAL", 400, 45),
    col("CARGO", 250, 25),
    col("DESDE", 150, 10),
];

/// Title, summary and a fixed-width table. Returns the y below the last line
/// and how many rows were drawn.
fn draw_table<'r, I>(
    canvas: &mut Canvas<'_>,
    kind: CardKind,
    record: &Record,
    columns: &[Column],
    rows: I,
    total: usize,
) -> (i32, usize)
where
    I: Iterator<Item = Vec<&'r String>>,
{
    draw_title(canvas, kind);
    let summary = ellipsize(
        canvas.fonts(),
        TextStyle::Heading,
        &record.summary(total),
        CONTENT_WIDTH as f32,
    );
    canvas.text(TextStyle::Heading, MARGIN_H, SUMMARY_Y, &summary);

    let xs: Vec<i32> = columns
        .iter()
        .scan(MARGIN_H, |x, c| {
            let at = *x;
            *x += c.width;
            Some(at)
        })
        .collect();

    let mut y = SUMMARY_Y + HEADING_SPACING;
    for (column, x) in columns.iter().zip(&xs) {
        canvas.text(TextStyle::Label, *x, y, column.header);
    }
    y += LINE_HEIGHT / 2;
    canvas.fill_rect(MARGIN_H, y, CONTENT_WIDTH as u32, 2, RULE_COLOR);
    y += LINE_HEIGHT / 4;

    let mut shown = 0;
    for row in rows.take(MAX_TABLE_ROWS) {
        if y + LINE_HEIGHT > CONTENT_LIMIT {
            break;
        }
        for ((column, x), cell) in columns.iter().zip(&xs).zip(row) {
            canvas.text(TextStyle::Body, *x, y, &truncate_chars(cell, column.max_chars));
        }
        y += LINE_HEIGHT;
        shown += 1;
    }

    if shown < total {
        let notice = format!(
            "...y {} resultados más (se muestran los {} primeros)",
            total - shown,
            shown
        );
        canvas.text(TextStyle::Heading, MARGIN_H, y, &notice);
        y += LINE_HEIGHT;
    }
    (y, shown)
}
