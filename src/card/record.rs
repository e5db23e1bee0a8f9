//! Typed result of parsing one upstream response.

use std::collections::HashMap;

/// Fields read from the `label : value` lines of an entry block.
pub type RawFields = HashMap<String, String>;

/// Demographic and document data of the queried person.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PersonalRecord {
    pub dni: Option<String>,
    pub apellidos: Option<String>,
    pub nombres: Option<String>,
    pub genero: Option<String>,
    pub fecha_nacimiento: Option<String>,
    pub estado_civil: Option<String>,
    /// Height in centimetres, as sent upstream
    pub estatura: Option<String>,
    pub grado_instruccion: Option<String>,
    pub restriccion: Option<String>,
    pub fecha_emision: Option<String>,
    pub fecha_caducidad: Option<String>,
    pub fecha_fallecimiento: Option<String>,
    pub padre: Option<String>,
    pub madre: Option<String>,
    pub direccion: Option<String>,
    pub distrito: Option<String>,
    pub provincia: Option<String>,
    pub departamento: Option<String>,
    pub codigo_postal: Option<String>,
}

impl PersonalRecord {
    /// Slot for a normalized upstream label, `None` for labels we do not keep.
    pub(crate) fn slot(&mut self, label: &str) -> Option<&mut Option<String>> {
        let slot = match label {
            "DNI" => &mut self.dni,
            "APELLIDOS" => &mut self.apellidos,
            "NOMBRES" => &mut self.nombres,
            "GENERO" => &mut self.genero,
            "FECHA NACIMIENTO" => &mut self.fecha_nacimiento,
            "DEPARTAMENTO" => &mut self.departamento,
            "PROVINCIA" => &mut self.provincia,
            "DISTRITO" => &mut self.distrito,
            "GRADO INSTRUCCION" => &mut self.grado_instruccion,
            "ESTADO CIVIL" => &mut self.estado_civil,
            "ESTATURA" => &mut self.estatura,
            "FECHA EMISION" => &mut self.fecha_emision,
            "FECHA CADUCIDAD" => &mut self.fecha_caducidad,
            "FECHA FALLECIMIENTO" => &mut self.fecha_fallecimiento,
            "PADRE" => &mut self.padre,
            "MADRE" => &mut self.madre,
            "RESTRICCION" => &mut self.restriccion,
            "DIRECCION" => &mut self.direccion,
            "CODIGO POSTAL" => &mut self.codigo_postal,
            _ => return None,
        };
        Some(slot)
    }

    /// `NOMBRES APELLIDOS`, skipping whichever part is missing.
    pub fn full_name(&self) -> String {
        [self.nombres.as_deref(), self.apellidos.as_deref()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// One row of the salary history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SalaryEntry {
    pub dni: String,
    pub ruc: String,
    pub empresa: String,
    pub situacion: String,
    pub sueldo: String,
    pub periodo: String,
}

/// One row of the phone records.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PhoneEntry {
    pub dni: String,
    pub telefono: String,
    pub plan: String,
    pub fuente: String,
    pub periodo: String,
}

/// One company the person is registered with.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyEntry {
    pub dni: String,
    pub ruc: String,
    pub razon_social: String,
    pub cargo: String,
    pub desde: String,
}

fn take(fields: &mut RawFields, key: &str) -> String {
    fields.remove(key).unwrap_or_default()
}

impl SalaryEntry {
    pub(crate) fn from_fields(mut fields: RawFields) -> Self {
        Self {
            dni: take(&mut fields, "DNI"),
            ruc: take(&mut fields, "RUC"),
            empresa: take(&mut fields, "EMPRESA"),
            situacion: take(&mut fields, "SITUACION"),
            sueldo: take(&mut fields, "SUELDO"),
            periodo: take(&mut fields, "PERIODO"),
        }
    }
}

impl PhoneEntry {
    pub(crate) fn from_fields(mut fields: RawFields) -> Self {
        Self {
            dni: take(&mut fields, "DNI"),
            telefono: take(&mut fields, "TELEFONO"),
            plan: take(&mut fields, "PLAN"),
            fuente: take(&mut fields, "FUENTE"),
            periodo: take(&mut fields, "PERIODO"),
        }
    }
}

impl CompanyEntry {
    pub(crate) fn from_fields(mut fields: RawFields) -> Self {
        Self {
            dni: take(&mut fields, "DNI"),
            ruc: take(&mut fields, "RUC"),
            razon_social: take(&mut fields, "RAZON_SOCIAL"),
            cargo: take(&mut fields, "CARGO"),
            desde: take(&mut fields, "DESDE"),
        }
    }
}

/// Which list the entries of a block belong to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Salary,
    Phone,
    Company,
}

impl EntryKind {
    /// Markers are checked in priority order; the first one found anywhere in
    /// the block decides the kind of every entry in it.
    pub(crate) fn classify<'a>(lines: impl IntoIterator<Item = &'a str> + Clone) -> Option<Self> {
        let has = |marker: &str| lines.clone().into_iter().any(|l| l.contains(marker));
        if has("SUELDO") {
            Some(Self::Salary)
        } else if has("TELEFONO") {
            Some(Self::Phone)
        } else if has("CARGO") {
            Some(Self::Company)
        } else {
            None
        }
    }
}

/// Everything parsed from one upstream response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Record {
    pub personal: PersonalRecord,
    pub salaries: Vec<SalaryEntry>,
    pub phones: Vec<PhoneEntry>,
    pub companies: Vec<CompanyEntry>,
    /// Subject photo sent next to the text payload
    pub photo_url: Option<String>,
}

impl Record {
    pub(crate) fn push(&mut self, kind: EntryKind, fields: RawFields) {
        match kind {
            EntryKind::Salary => self.salaries.push(SalaryEntry::from_fields(fields)),
            EntryKind::Phone => self.phones.push(PhoneEntry::from_fields(fields)),
            EntryKind::Company => self.companies.push(CompanyEntry::from_fields(fields)),
        }
    }

    pub fn with_photo(mut self, url: Option<String>) -> Self {
        self.photo_url = url.filter(|u| !u.trim().is_empty());
        self
    }

    /// `DNI: … | Nombres: … | Total Registros: n` line shown under table titles.
    pub fn summary(&self, total: usize) -> String {
        format!(
            "DNI: {} | Nombres: {} | Total Registros: {}",
            self.personal.dni.as_deref().unwrap_or("-"),
            self.personal.full_name(),
            total
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_uses_priority_order() {
        let lines = ["DNI : 1", "CARGO : GERENTE", "SUELDO : 1500"];
        assert_eq!(EntryKind::classify(lines), Some(EntryKind::Salary));

        let lines = ["DNI : 1", "TELEFONO : 999", "CARGO : X"];
        assert_eq!(EntryKind::classify(lines), Some(EntryKind::Phone));

        let lines = ["DNI : 1", "DIRECCION : AV. LIMA"];
        assert_eq!(EntryKind::classify(lines), None);
    }

    #[test]
    fn test_full_name_skips_missing_parts() {
        let mut personal = PersonalRecord::default();
        assert_eq!(personal.full_name(), "");
        personal.nombres = Some("ANA".to_string());
        assert_eq!(personal.full_name(), "ANA");
        personal.apellidos = Some("QUISPE ROJAS".to_string());
        assert_eq!(personal.full_name(), "ANA QUISPE ROJAS");
    }

    #[test]
    fn test_with_photo_drops_blank_url() {
        let record = Record::default().with_photo(Some("  ".to_string()));
        assert_eq!(record.photo_url, None);
    }
}
