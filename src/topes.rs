//! Caps ("topes") support: UIT lookup by year, the reference recompute
//! applied on save, form overrides and table cell formatting.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::entity::{EntityRecord, FieldValue};
use crate::forms::FieldDescriptor;
use crate::metadata::{FieldKind, SelectOption, ValidationConstraints};

/// Error type for cap operations
#[derive(Debug, Clone, PartialEq)]
pub enum TopesError {
    NoUitForYear(i64),
}

impl fmt::Display for TopesError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TopesError::NoUitForYear(year) => write!(f, "No UIT found for year {}", year),
        }
    }
}

impl std::error::Error for TopesError {}

/// UIT records indexed by `anioVigencia`. On duplicate years the last
/// record wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UitTable {
    by_year: BTreeMap<i64, EntityRecord>,
}

impl UitTable {
    pub fn from_records(records: &[EntityRecord]) -> Self {
        let by_year = records
            .iter()
            .filter_map(|r| r.get_i64("anioVigencia").map(|y| (y, r.clone())))
            .collect();
        Self { by_year }
    }

    pub fn get(&self, year: i64) -> Option<&EntityRecord> {
        self.by_year.get(&year)
    }

    pub fn monto(&self, year: i64) -> Option<&FieldValue> {
        self.get(year).and_then(|uit| uit.get("monto"))
    }

    /// Years with a UIT, most recent first.
    pub fn years_desc(&self) -> Vec<i64> {
        self.by_year.keys().rev().copied().collect()
    }

    pub fn len(&self) -> usize {
        self.by_year.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_year.is_empty()
    }

    /// `"{year} (UIT: S/ {monto})"`, or the bare year when no UIT exists.
    pub fn year_label(&self, year: i64) -> String {
        match self.monto(year) {
            Some(monto) => format!("{} (UIT: S/ {})", year, monto),
            None => year.to_string(),
        }
    }
}

/// Point a cap at the UIT of its validity year.
///
/// Sets `idUit` and copies the UIT amount into `referenciaUit`. A cap
/// without a year is left untouched.
pub fn apply_uit_reference(record: &mut EntityRecord, uits: &UitTable) -> Result<(), TopesError> {
    let Some(year) = record.get_i64("anioVigencia") else {
        return Ok(());
    };
    let uit = uits.get(year).ok_or(TopesError::NoUitForYear(year))?;

    record.set("idUit", FieldValue::from(uit.id));
    record.set(
        "referenciaUit",
        uit.get("monto").cloned().unwrap_or(FieldValue::Null),
    );
    Ok(())
}

/// The lists a cap refers to, with their display labels.
#[derive(Debug, Clone, Default)]
pub struct RelatedLists {
    pub tipos_proceso: Vec<EntityRecord>,
    pub objetos_contratacion: Vec<EntityRecord>,
    pub operadores_monto: Vec<EntityRecord>,
    pub uits: UitTable,
}

fn text(record: &EntityRecord, field: &str) -> String {
    record.get(field).map(ToString::to_string).unwrap_or_default()
}

fn code_name(record: &EntityRecord) -> String {
    format!("{} - {}", text(record, "codigo"), text(record, "nombre"))
}

fn symbol_name(record: &EntityRecord) -> String {
    format!("{} ({})", text(record, "simbolo"), text(record, "nombre"))
}

fn by_id(records: &[EntityRecord], id: i64) -> Option<&EntityRecord> {
    records.iter().find(|r| r.id == Some(id))
}

fn options(records: &[EntityRecord], label: fn(&EntityRecord) -> String) -> Vec<SelectOption> {
    records
        .iter()
        .map(|r| SelectOption::new(r.id, label(r)))
        .collect()
}

impl RelatedLists {
    fn relation_label(&self, column: &str, id: i64) -> Option<String> {
        match column {
            "idTipoProcesoSeleccion" => by_id(&self.tipos_proceso, id).map(code_name),
            "idObjetoContratacion" => by_id(&self.objetos_contratacion, id).map(code_name),
            "idOperadorMonto" => by_id(&self.operadores_monto, id).map(symbol_name),
            _ => None,
        }
    }
}

const RELATION_COLUMNS: &[&str] = &["idTipoProcesoSeleccion", "idObjetoContratacion", "idOperadorMonto"];

/// Rewrite generated cap descriptors: relation selects, amount and year
/// presentation, observation limits, default status. `idUit` is dropped
/// since it is derived from the year on save.
pub fn apply_overrides(
    descriptors: Vec<FieldDescriptor>,
    related: &RelatedLists,
    current_year: i64,
) -> Vec<FieldDescriptor> {
    descriptors
        .into_iter()
        .filter(|d| d.name != "idUit")
        .map(|mut d| {
            match d.name.as_str() {
                "idTipoProcesoSeleccion" => {
                    select(&mut d, options(&related.tipos_proceso, code_name));
                    d.help = "Selection process type this cap applies to".to_string();
                    d.placeholder = "Select process type...".to_string();
                }
                "idObjetoContratacion" => {
                    select(&mut d, options(&related.objetos_contratacion, code_name));
                    d.help = "Contracting object this cap applies to".to_string();
                    d.placeholder = "Select contracting object...".to_string();
                }
                "idOperadorMonto" => {
                    select(&mut d, options(&related.operadores_monto, symbol_name));
                    d.help = "Operator used to compare the amount".to_string();
                    d.placeholder = "Select operator...".to_string();
                }
                "monto" => {
                    d.kind = FieldKind::Number;
                    d.constraints = Some(ValidationConstraints {
                        min: Some(0.0),
                        step: Some(0.01),
                        ..ValidationConstraints::default()
                    });
                    d.placeholder = "e.g. 150000.00".to_string();
                    d.help = "Cap amount in soles (0 or more)".to_string();
                    d.suffix = Some("S/".to_string());
                }
                "referenciaUit" => {
                    d.kind = FieldKind::Number;
                    d.required = false;
                    d.read_only = false;
                    d.constraints = Some(ValidationConstraints {
                        min: Some(0.0),
                        step: Some(0.0001),
                        ..ValidationConstraints::default()
                    });
                    d.placeholder = "Filled in automatically...".to_string();
                    d.help = "Computed from the selected year".to_string();
                    d.suffix = Some("UIT".to_string());
                    if let Some(monto) = related.uits.monto(current_year) {
                        d.value = Some(monto.clone());
                    }
                }
                "anioVigencia" => {
                    let years = related
                        .uits
                        .years_desc()
                        .into_iter()
                        .map(|y| SelectOption::new(y, related.uits.year_label(y)))
                        .collect();
                    select(&mut d, years);
                    d.help = "Fiscal year of the cap (determines the UIT)".to_string();
                    d.placeholder = "Select year...".to_string();
                }
                "observaciones" => {
                    d.kind = FieldKind::Textarea;
                    d.required = false;
                    d.constraints = Some(ValidationConstraints {
                        max_length: Some(500),
                        rows: Some(3),
                        ..ValidationConstraints::default()
                    });
                    d.placeholder = "Additional notes about this cap...".to_string();
                }
                "estado" => {
                    if d.value.as_ref().map(FieldValue::is_empty).unwrap_or(true) {
                        d.value = Some(FieldValue::from("ACTIVO"));
                    }
                }
                _ => {}
            }
            d
        })
        .collect()
}

fn select(descriptor: &mut FieldDescriptor, options: Vec<SelectOption>) {
    descriptor.kind = FieldKind::Select;
    descriptor.required = true;
    descriptor.options = Some(options);
}

/// Table cell text for `column` of a cap.
pub fn format_cell(column: &str, value: &FieldValue, related: &RelatedLists) -> String {
    if value.is_null() {
        return "--".to_string();
    }

    if RELATION_COLUMNS.contains(&column) {
        return value
            .as_i64()
            .and_then(|id| related.relation_label(column, id))
            .unwrap_or_else(|| format!("ID: {}", value));
    }

    match column {
        "monto" => match value.as_f64() {
            Some(amount) => format!("S/ {}", money(amount)),
            None => value.to_string(),
        },
        "referenciaUit" => match value.as_f64() {
            Some(reference) if reference != 0.0 => format!("{:.4} UIT", reference),
            Some(_) => "--".to_string(),
            None if value.is_empty() => "--".to_string(),
            None => value.to_string(),
        },
        "estado" => match value.as_str() {
            Some("ACTIVO") => "✅ Active".to_string(),
            Some("INACTIVO") => "❌ Inactive".to_string(),
            _ => value.to_string(),
        },
        "anioVigencia" => match value.as_i64() {
            Some(year) => related.uits.year_label(year),
            None => value.to_string(),
        },
        _ => value.to_string(),
    }
}

/// Two decimals with comma thousands separators.
fn money(amount: f64) -> String {
    let fixed = format!("{:.2}", amount.abs());
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed.as_str(), "00"));

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    let sign = if amount < 0.0 { "-" } else { "" };
    format!("{}{}.{}", sign, grouped, frac_part)
}

/// Column header for a cap table.
pub fn column_title<'a>(
    column: &'a str,
    field_descriptions: Option<&'a HashMap<String, String>>,
) -> &'a str {
    match column {
        "idTipoProcesoSeleccion" => "Process Type",
        "idObjetoContratacion" => "Contracting Object",
        "idOperadorMonto" => "Operator",
        "monto" => "Amount",
        "referenciaUit" => "UIT Ref.",
        "observaciones" => "Notes",
        "anioVigencia" => "Year",
        "estado" => "Status",
        other => field_descriptions
            .and_then(|d| d.get(other))
            .map(String::as_str)
            .unwrap_or(other),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn uit(id: i64, year: i64, monto: f64) -> EntityRecord {
        let mut record = EntityRecord::new()
            .with_field("anioVigencia", year)
            .with_field("monto", monto);
        record.id = Some(id);
        record
    }

    fn related() -> RelatedLists {
        let mut lp = EntityRecord::new()
            .with_field("codigo", "LP")
            .with_field("nombre", "Licitacion Publica");
        lp.id = Some(1);
        let mut bienes = EntityRecord::new()
            .with_field("codigo", "BI")
            .with_field("nombre", "Bienes");
        bienes.id = Some(2);
        let mut gte = EntityRecord::new()
            .with_field("simbolo", ">=")
            .with_field("nombre", "Mayor o igual");
        gte.id = Some(3);

        RelatedLists {
            tipos_proceso: vec![lp],
            objetos_contratacion: vec![bienes],
            operadores_monto: vec![gte],
            uits: UitTable::from_records(&[uit(10, 2024, 5150.0), uit(11, 2025, 5350.0)]),
        }
    }

    #[test]
    fn test_uit_reference_recomputed_from_year() {
        let related = related();
        let mut cap = EntityRecord::new()
            .with_field("anioVigencia", 2025)
            .with_field("referenciaUit", 1.0);

        apply_uit_reference(&mut cap, &related.uits).unwrap();
        assert_eq!(cap.get_i64("idUit"), Some(11));
        assert_eq!(cap.get_f64("referenciaUit"), Some(5350.0));
    }

    #[test]
    fn test_uit_reference_refused_without_uit() {
        let related = related();
        let mut cap = EntityRecord::new().with_field("anioVigencia", 2019);
        let err = apply_uit_reference(&mut cap, &related.uits).unwrap_err();
        assert_eq!(err.to_string(), "No UIT found for year 2019");
        assert!(cap.get("idUit").is_none());
    }

    #[test]
    fn test_overrides() {
        let related = related();
        let descriptors = vec![
            FieldDescriptor::new("idTipoProcesoSeleccion", "Tipo", FieldKind::Number),
            FieldDescriptor::new("idOperadorMonto", "Operador", FieldKind::Number),
            FieldDescriptor::new("idUit", "Uit", FieldKind::Number),
            FieldDescriptor::new("referenciaUit", "Ref", FieldKind::Text).required(true),
            FieldDescriptor::new("anioVigencia", "Year", FieldKind::Number),
            FieldDescriptor::new("estado", "Estado", FieldKind::Select),
        ];

        let fields = apply_overrides(descriptors, &related, 2025);
        let names: Vec<&str> = fields.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["idTipoProcesoSeleccion", "idOperadorMonto", "referenciaUit", "anioVigencia", "estado"]
        );

        let tipo = &fields[0];
        assert_eq!(tipo.kind, FieldKind::Select);
        assert!(tipo.required);
        assert_eq!(tipo.options.as_ref().unwrap()[0].label, "LP - Licitacion Publica");
        assert_eq!(fields[1].options.as_ref().unwrap()[0].label, ">= (Mayor o igual)");

        let reference = &fields[2];
        assert!(!reference.required);
        assert_eq!(reference.value, Some(FieldValue::Float(5350.0)));
        assert_eq!(reference.suffix.as_deref(), Some("UIT"));

        let years = fields[3].options.as_ref().unwrap();
        assert_eq!(years[0].value, FieldValue::Int(2025));
        assert_eq!(years[0].label, "2025 (UIT: S/ 5350)");
        assert_eq!(years[1].value, FieldValue::Int(2024));

        assert_eq!(fields[4].value, Some(FieldValue::from("ACTIVO")));
    }

    #[test]
    fn test_cell_formatting() {
        let related = related();
        assert_eq!(format_cell("monto", &FieldValue::Null, &related), "--");
        assert_eq!(
            format_cell("idTipoProcesoSeleccion", &FieldValue::Int(1), &related),
            "LP - Licitacion Publica"
        );
        assert_eq!(format_cell("idObjetoContratacion", &FieldValue::Int(99), &related), "ID: 99");
        assert_eq!(format_cell("monto", &FieldValue::Float(150000.0), &related), "S/ 150,000.00");
        assert_eq!(format_cell("monto", &FieldValue::Int(950), &related), "S/ 950.00");
        assert_eq!(format_cell("referenciaUit", &FieldValue::Float(5350.0), &related), "5350.0000 UIT");
        assert_eq!(format_cell("referenciaUit", &FieldValue::Int(0), &related), "--");
        assert_eq!(format_cell("estado", &FieldValue::from("ACTIVO"), &related), "✅ Active");
        assert_eq!(format_cell("estado", &FieldValue::from("PENDIENTE"), &related), "PENDIENTE");
        assert_eq!(format_cell("anioVigencia", &FieldValue::Int(2024), &related), "2024 (UIT: S/ 5150)");
        assert_eq!(format_cell("anioVigencia", &FieldValue::Int(2019), &related), "2019");
    }

    #[test]
    fn test_money_grouping() {
        assert_eq!(money(1234567.891), "1,234,567.89");
        assert_eq!(money(100.0), "100.00");
        assert_eq!(money(-2500.5), "-2,500.50");
    }

    #[test]
    fn test_column_titles() {
        let mut descriptions = HashMap::new();
        descriptions.insert("idUit".to_string(), "Tipo: Long".to_string());
        assert_eq!(column_title("monto", Some(&descriptions)), "Amount");
        assert_eq!(column_title("idUit", Some(&descriptions)), "Tipo: Long");
        assert_eq!(column_title("other", None), "other");
    }
}
