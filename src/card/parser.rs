//! Parser for the plain-text `message` returned by the lookup API.
//!
//! The text is a sequence of blocks separated by `---`. The first block holds
//! `label : value` lines with personal data; later blocks hold repeated
//! entries, each starting with a `DNI :` line.

use lazy_static::lazy_static;
use regex::Regex;
use thiserror::Error;

use super::record::{EntryKind, RawFields, Record};

const BLOCK_DELIMITER: &str = "---";

lazy_static! {
    static ref BRACKET_MARKER: Regex = Regex::new(r"\[[^\]]*\]").unwrap();
    static ref PAGE_MARKER: Regex = Regex::new(r"\[\d+/\d+\]").unwrap();
    static ref DIGITS: Regex = Regex::new(r"\d+").unwrap();
    static ref ENTRY_BOUNDARY: Regex = Regex::new(r"^DNI\s*:").unwrap();
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("upstream payload is empty")]
    Empty,
    #[error("no personal data block found in upstream payload")]
    MissingPersonalBlock,
}

/// Parse the upstream text into a [`Record`].
///
/// Labels that are not part of the personal data table are ignored, and entry
/// blocks without a recognizable kind are dropped.
pub fn parse_record(text: &str) -> Result<Record, ParseError> {
    let mut blocks = text
        .split(BLOCK_DELIMITER)
        .map(str::trim)
        .filter(|block| !block.is_empty());

    let personal_block = blocks.next().ok_or(ParseError::Empty)?;

    let mut record = Record::default();
    let mut mapped = 0;
    for line in non_empty_lines(personal_block) {
        let Some((label, value)) = line.split_once(':') else {
            continue;
        };
        let label = normalize_label(label);
        let value = clean_value(value);
        if let Some(slot) = record.personal.slot(&label) {
            mapped += 1;
            *slot = (!value.is_empty()).then_some(value);
        }
    }
    if mapped == 0 {
        return Err(ParseError::MissingPersonalBlock);
    }

    for block in blocks {
        parse_entry_block(block, &mut record);
    }

    log::debug!(
        "Parsed record: {} salaries, {} phones, {} companies",
        record.salaries.len(),
        record.phones.len(),
        record.companies.len()
    );
    Ok(record)
}

fn parse_entry_block(block: &str, record: &mut Record) {
    let lines: Vec<&str> = non_empty_lines(block).collect();
    let kind = EntryKind::classify(lines.iter().copied());
    if kind.is_none() {
        log::debug!("Dropping entry block without a known marker ({} lines)", lines.len());
    }

    let mut commit = |fields: RawFields| {
        if let Some(kind) = kind {
            if fields.contains_key("DNI") {
                record.push(kind, fields);
            }
        }
    };

    let mut current = RawFields::new();
    for line in lines {
        if ENTRY_BOUNDARY.is_match(line) {
            commit(std::mem::take(&mut current));
        }
        if let Some((label, value)) = line.split_once(':') {
            current.insert(field_key(label), value.trim().to_string());
        }
    }
    commit(current);
}

fn non_empty_lines(block: &str) -> impl Iterator<Item = &str> {
    block.lines().map(str::trim).filter(|line| !line.is_empty())
}

/// `RAZÓN SOCIAL` becomes `RAZON_SOCIAL`.
fn field_key(label: &str) -> String {
    fold_accents(label.trim())
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
}

fn normalize_label(label: &str) -> String {
    let label = BRACKET_MARKER.replace_all(label, "");
    let label = DIGITS.replace_all(&label, "");
    let label: String = label.chars().filter(|c| !is_pictographic(*c)).collect();
    fold_accents(&label)
        .to_uppercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn clean_value(value: &str) -> String {
    let value = PAGE_MARKER.replace_all(value, "");
    value
        .chars()
        .filter(|c| !is_pictographic(*c))
        .collect::<String>()
        .trim()
        .to_string()
}

fn is_pictographic(c: char) -> bool {
    let code = c as u32;
    code > 0xFFFF
        || (0x2190..=0x2BFF).contains(&code)
        || (0xFE00..=0xFE0F).contains(&code)
        || code == 0x200D
}

fn fold_accents(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            'Á' | 'À' | 'Ä' => 'A',
            'É' | 'È' | 'Ë' => 'E',
            'Í' | 'Ì' | 'Ï' => 'I',
            'Ó' | 'Ò' | 'Ö' => 'O',
            'Ú' | 'Ù' | 'Ü' => 'U',
            'á' | 'à' | 'ä' => 'a',
            'é' | 'è' | 'ë' => 'e',
            'í' | 'ì' | 'ï' => 'i',
            'ó' | 'ò' | 'ö' => 'o',
            'ú' | 'ù' | 'ü' => 'u',
            other => other,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAYLOAD: &str = "\
[🪪] DNI : 44556677
APELLIDOS : QUISPE ROJAS
NOMBRES : ANA LUCIA
GENERO : FEMENINO
FECHA NACIMIENTO : 12/03/1990
ESTATURA : 158
[📍] DIRECCION : AV. LOS INCAS 123 [1/2]
CODIGO POSTAL : 15001
FOTO : no disponible
---
DNI : 44556677
RUC : 20100047218
EMPRESA : BANCO DE CREDITO
SITUACION : ACTIVO
SUELDO : 3500
PERIODO : 2023-11
DNI : 44556677
RUC : 20501234567
EMPRESA : MINERA ANDINA
SITUACION : BAJA
SUELDO : 2800
PERIODO : 2022-05
---
DNI : 44556677
TELEFONO : 987654321
PLAN : POSTPAGO
FUENTE : OPERADOR
PERIODO : 2024-01
---
DNI : 44556677
RUC : 20600011122
RAZÓN SOCIAL : INVERSIONES QUISPE S.A.C.
CARGO : GERENTE GENERAL
DESDE : 2019-02-01
";

    #[test]
    fn test_parse_personal_block() {
        let record = parse_record(PAYLOAD).unwrap();
        let personal = &record.personal;
        assert_eq!(personal.dni.as_deref(), Some("44556677"));
        assert_eq!(personal.apellidos.as_deref(), Some("QUISPE ROJAS"));
        assert_eq!(personal.nombres.as_deref(), Some("ANA LUCIA"));
        assert_eq!(personal.fecha_nacimiento.as_deref(), Some("12/03/1990"));
        assert_eq!(personal.direccion.as_deref(), Some("AV. LOS INCAS 123"));
        assert_eq!(personal.codigo_postal.as_deref(), Some("15001"));
        assert_eq!(personal.estado_civil, None);
    }

    #[test]
    fn test_parse_entry_blocks_into_lists() {
        let record = parse_record(PAYLOAD).unwrap();

        assert_eq!(record.salaries.len(), 2);
        assert_eq!(record.salaries[0].empresa, "BANCO DE CREDITO");
        assert_eq!(record.salaries[1].sueldo, "2800");

        assert_eq!(record.phones.len(), 1);
        assert_eq!(record.phones[0].telefono, "987654321");

        assert_eq!(record.companies.len(), 1);
        assert_eq!(record.companies[0].razon_social, "INVERSIONES QUISPE S.A.C.");
        assert_eq!(record.companies[0].cargo, "GERENTE GENERAL");
    }

    #[test]
    fn test_parse_is_deterministic() {
        assert_eq!(parse_record(PAYLOAD), parse_record(PAYLOAD));
    }

    #[test]
    fn test_unknown_block_is_dropped() {
        let text = "DNI : 1\n---\nDNI : 1\nVEHICULO : ABC-123\nMARCA : TOYOTA";
        let record = parse_record(text).unwrap();
        assert!(record.salaries.is_empty());
        assert!(record.phones.is_empty());
        assert!(record.companies.is_empty());
    }

    #[test]
    fn test_entry_without_dni_is_not_committed() {
        let text = "DNI : 1\n---\nTELEFONO : 999\nPLAN : PREPAGO\nDNI : 1\nTELEFONO : 988";
        let record = parse_record(text).unwrap();
        assert_eq!(record.phones.len(), 1);
        assert_eq!(record.phones[0].telefono, "988");
    }

    #[test]
    fn test_empty_or_unmapped_payload_is_malformed() {
        assert_eq!(parse_record(""), Err(ParseError::Empty));
        assert_eq!(parse_record(" --- \n---"), Err(ParseError::Empty));
        assert_eq!(
            parse_record("RESULTADO : SIN DATOS"),
            Err(ParseError::MissingPersonalBlock)
        );
    }

    #[test]
    fn test_normalize_label_strips_markers() {
        assert_eq!(normalize_label(" [🪪] DNI "), "DNI");
        assert_eq!(normalize_label("FECHA  EMISIÓN 2"), "FECHA EMISION");
        assert_eq!(normalize_label("📍 Dirección"), "DIRECCION");
    }

    #[test]
    fn test_field_key_replaces_whitespace() {
        assert_eq!(field_key("RAZON SOCIAL "), "RAZON_SOCIAL");
        assert_eq!(field_key("Razón Social"), "RAZON_SOCIAL");
    }
}
