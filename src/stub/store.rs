//! In-memory tables behind the stub backend.

use chrono::{Datelike, Local, NaiveDate, NaiveDateTime};
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::fmt;

use crate::entity::{EntityRecord, FieldValue};
use crate::metadata::Catalog;
use crate::parametricas::{EvaluationRequest, EvaluationResult, ParametricKind, VigentesSnapshot};
use crate::rules::{default_rules, RuleDraft, RuleRecord};
use crate::stub::seed;

/// Error type for stub operations
#[derive(Debug, Clone, PartialEq)]
pub enum StubError {
    NotFound { entity: String, id: i64 },
    UnknownEntity(String),
    NoUitInForce(i32),
    Duplicate(String),
    Validation(String),
}

impl StubError {
    pub fn status(&self) -> u16 {
        match self {
            StubError::NotFound { .. }
            | StubError::UnknownEntity(_)
            | StubError::NoUitInForce(_) => 404,
            StubError::Duplicate(_) => 409,
            StubError::Validation(_) => 400,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            StubError::NotFound { .. } | StubError::NoUitInForce(_) => "ENTITY_NOT_FOUND",
            StubError::UnknownEntity(_) => "UNKNOWN_ENTITY",
            StubError::Duplicate(_) => "DUPLICATE_ENTITY",
            StubError::Validation(_) => "VALIDATION_ERROR",
        }
    }
}

impl fmt::Display for StubError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StubError::NotFound { entity, id } => write!(f, "{} not found with id {}", entity, id),
            StubError::UnknownEntity(name) => write!(f, "Unknown parametric entity: {}", name),
            StubError::NoUitInForce(year) => write!(f, "No UIT in force for year {}", year),
            StubError::Duplicate(msg) => write!(f, "{}", msg),
            StubError::Validation(msg) => write!(f, "{}", msg),
        }
    }
}

impl std::error::Error for StubError {}

/// Error body returned for every failed request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    pub timestamp: NaiveDateTime,
    pub status: u16,
}

impl From<&StubError> for ErrorResponse {
    fn from(err: &StubError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
            timestamp: now(),
            status: err.status(),
        }
    }
}

fn now() -> NaiveDateTime {
    Local::now().naive_local()
}

fn is_active(record: &EntityRecord) -> bool {
    record.is_live() && record.estado() == Some("ACTIVO")
}

/// Does `amount` satisfy a cap of `cap` under the operator `code`?
pub fn operator_matches(code: &str, amount: f64, cap: f64) -> bool {
    match code {
        "MAYOR_IGUAL" => amount >= cap,
        "MENOR_IGUAL" => amount <= cap,
        "MAYOR" => amount > cap,
        "MENOR" => amount < cap,
        _ => false,
    }
}

#[derive(Debug, Default)]
pub struct Store {
    tables: HashMap<ParametricKind, Vec<EntityRecord>>,
    rules: Vec<RuleRecord>,
    next_id: i64,
}

impl Store {
    pub fn empty() -> Self {
        Self {
            next_id: 1,
            ..Self::default()
        }
    }

    /// Store with the reference tables, 2025 caps and the default rules.
    pub fn seeded() -> Self {
        let mut store = Self::empty();
        for kind in ParametricKind::ALL {
            for row in seed::rows(kind) {
                store.insert(kind, row);
            }
        }

        for &(object, sub) in seed::OBJECT_SUB_DESCRIPTIONS {
            let sub_id = store.id_by_codigo(ParametricKind::SubDescripcion, sub);
            if let Some(row) = store
                .tables
                .get_mut(&ParametricKind::ObjetoContratacion)
                .and_then(|rows| rows.iter_mut().find(|r| r.get_str("codigo") == Some(object)))
            {
                row.set("idSubDescripcionContratacion", sub_id);
                row.set("permiteSubDescripcion", sub_id.is_some());
            }
        }

        for &(process, object, operator, monto) in seed::CAPS_2025 {
            let id_of = |kind: ParametricKind, codigo: &str| store.id_by_codigo(kind, codigo);
            let uit = store.uit_for_year(2025);
            let cap = EntityRecord::new()
                .with_field("idTipoProcesoSeleccion", id_of(ParametricKind::TipoProceso, process))
                .with_field("idObjetoContratacion", id_of(ParametricKind::ObjetoContratacion, object))
                .with_field("idOperadorMonto", id_of(ParametricKind::OperadoresMonto, operator))
                .with_field("monto", monto)
                .with_field("referenciaUit", uit.as_ref().and_then(|u| u.get_f64("monto")))
                .with_field("idUit", uit.as_ref().and_then(|u| u.id))
                .with_field("anioVigencia", 2025)
                .with_field("estado", "ACTIVO");
            store.insert(ParametricKind::Topes, cap);
        }

        for rule in default_rules() {
            store.next_id = store.next_id.max(rule.id + 1);
            store.rules.push(rule);
        }
        tracing::debug!("Stub store seeded");
        store
    }

    fn id_by_codigo(&self, kind: ParametricKind, codigo: &str) -> Option<i64> {
        self.table(kind)
            .iter()
            .find(|r| r.get_str("codigo") == Some(codigo))
            .and_then(|r| r.id)
    }

    fn allocate_id(&mut self) -> i64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn insert(&mut self, kind: ParametricKind, mut record: EntityRecord) -> EntityRecord {
        let stamp = now();
        record.id = Some(self.allocate_id());
        record.created_at = Some(stamp);
        record.updated_at = Some(stamp);
        record.created_by = Some("system".to_string());
        record.updated_by = Some("system".to_string());
        if record.get("estado").map(FieldValue::is_empty).unwrap_or(true) {
            record.set("estado", "ACTIVO");
        }
        record.set("estadoRegistro", true);
        self.tables.entry(kind).or_default().push(record.clone());
        record
    }

    fn table(&self, kind: ParametricKind) -> &[EntityRecord] {
        self.tables.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    fn live(&self, kind: ParametricKind) -> impl Iterator<Item = &EntityRecord> {
        self.table(kind).iter().filter(|r| r.is_live())
    }

    fn position(&self, kind: ParametricKind, id: i64) -> Result<usize, StubError> {
        self.table(kind)
            .iter()
            .position(|r| r.id == Some(id) && r.is_live())
            .ok_or_else(|| StubError::NotFound {
                entity: kind.config().friendly_name.to_string(),
                id,
            })
    }

    /// Live records, optionally restricted to one validity year.
    pub fn list(&self, kind: ParametricKind, year: Option<i32>) -> Vec<EntityRecord> {
        self.live(kind)
            .filter(|r| year.map_or(true, |y| r.get_i64("anioVigencia") == Some(y as i64)))
            .cloned()
            .collect()
    }

    pub fn get(&self, kind: ParametricKind, id: i64) -> Result<EntityRecord, StubError> {
        let index = self.position(kind, id)?;
        Ok(self.table(kind)[index].clone())
    }

    fn validate(
        &self,
        kind: ParametricKind,
        record: &EntityRecord,
        exclude: Option<i64>,
    ) -> Result<(), StubError> {
        for field in kind.config().required_fields {
            if record.get(field).map(FieldValue::is_empty).unwrap_or(true) {
                return Err(StubError::Validation(format!("Field '{}' is required", field)));
            }
        }

        match kind {
            ParametricKind::Uit => {
                if record.get_f64("monto").map_or(true, |m| m <= 0.0) {
                    return Err(StubError::Validation(
                        "UIT amount must be greater than zero".to_string(),
                    ));
                }
                let year = record.get_i64("anioVigencia");
                let taken = self
                    .live(kind)
                    .any(|u| u.get_i64("anioVigencia") == year && u.id != exclude);
                if taken {
                    return Err(StubError::Duplicate(format!(
                        "UIT already exists for year {}",
                        year.unwrap_or_default()
                    )));
                }
            }
            ParametricKind::Topes => {
                if record.get_f64("monto").map_or(true, |m| m < 0.0) {
                    return Err(StubError::Validation(
                        "Cap amount must be zero or greater".to_string(),
                    ));
                }
            }
            _ => {}
        }
        Ok(())
    }

    pub fn create(&mut self, kind: ParametricKind, record: EntityRecord) -> Result<EntityRecord, StubError> {
        self.validate(kind, &record, None)?;
        let created = self.insert(kind, record);
        tracing::info!("Created {} {:?}", kind, created.id);
        Ok(created)
    }

    /// Replace the open fields of a record, keeping identity and creation
    /// audit data.
    pub fn update(
        &mut self,
        kind: ParametricKind,
        id: i64,
        record: EntityRecord,
    ) -> Result<EntityRecord, StubError> {
        let index = self.position(kind, id)?;
        self.validate(kind, &record, Some(id))?;

        let table = self.tables.entry(kind).or_default();
        let existing = &mut table[index];
        existing.fields = record.fields;
        existing.fields.retain(|k, _| k != "estadoRegistro");
        existing.set("estadoRegistro", true);
        existing.updated_at = Some(now());
        existing.updated_by = Some("system".to_string());
        tracing::info!("Updated {} {}", kind, id);
        Ok(existing.clone())
    }

    /// Soft delete: the record stays but is no longer listed or fetchable.
    pub fn delete(&mut self, kind: ParametricKind, id: i64) -> Result<(), StubError> {
        let index = self.position(kind, id)?;
        let table = self.tables.entry(kind).or_default();
        table[index].set("estadoRegistro", false);
        table[index].updated_at = Some(now());
        tracing::info!("Deleted {} {}", kind, id);
        Ok(())
    }

    fn uit_for_year(&self, year: i64) -> Option<EntityRecord> {
        self.live(ParametricKind::Uit)
            .find(|u| u.get_i64("anioVigencia") == Some(year))
            .cloned()
    }

    /// Latest active UIT whose year is not after `year`.
    pub fn uit_vigente(&self, year: i32) -> Option<EntityRecord> {
        self.live(ParametricKind::Uit)
            .filter(|u| is_active(u))
            .filter(|u| u.get_i64("anioVigencia").map_or(false, |y| y <= year as i64))
            .max_by_key(|u| u.get_i64("anioVigencia"))
            .cloned()
    }

    pub fn vigentes(&self, date: NaiveDate) -> VigentesSnapshot {
        let year = date.year();
        let active = |kind| -> Vec<EntityRecord> { self.live(kind).filter(|r| is_active(r)).cloned().collect() };
        let for_year = |kind| -> Vec<EntityRecord> {
            self.live(kind)
                .filter(|r| is_active(r) && r.get_i64("anioVigencia") == Some(year as i64))
                .cloned()
                .collect()
        };

        VigentesSnapshot {
            fecha_evaluacion: date.and_hms_opt(0, 0, 0),
            anio_vigencia: Some(year),
            uit_vigente: self.uit_vigente(year),
            tipos_proceso: for_year(ParametricKind::TipoProceso),
            objetos_contratacion: active(ParametricKind::ObjetoContratacion),
            operadores_monto: active(ParametricKind::OperadoresMonto),
            topes_vigentes: for_year(ParametricKind::Topes),
        }
    }

    fn name_of(&self, kind: ParametricKind, id: Option<i64>) -> String {
        id.and_then(|id| self.table(kind).iter().find(|r| r.id == Some(id)))
            .and_then(|r| r.get_str("nombre"))
            .unwrap_or("?")
            .to_string()
    }

    /// Caps of the request year that the contract amount falls under.
    pub fn evaluate(&self, request: &EvaluationRequest) -> EvaluationResult {
        let (Some(year), Some(amount)) = (request.year(), request.monto_contrato) else {
            return EvaluationResult {
                evaluacion_exitosa: false,
                mensaje: "Evaluation error: date and amount are required".to_string(),
                fecha_evaluacion: Some(now()),
                ..EvaluationResult::default()
            };
        };

        let operator_code = |id: Option<i64>| {
            id.and_then(|id| self.table(ParametricKind::OperadoresMonto).iter().find(|r| r.id == Some(id)))
                .and_then(|r| r.get_str("codigo"))
        };
        let applicable: Vec<&EntityRecord> = self
            .live(ParametricKind::Topes)
            .filter(|t| is_active(t) && t.get_i64("anioVigencia") == Some(year as i64))
            .filter(|t| match (operator_code(t.get_i64("idOperadorMonto")), t.get_f64("monto")) {
                (Some(code), Some(cap)) => operator_matches(code, amount, cap),
                _ => false,
            })
            .collect();

        let mensaje = if applicable.is_empty() {
            "No applicable caps found for the specified amount".to_string()
        } else {
            format!("Found {} applicable caps", applicable.len())
        };
        let reglas_aplicadas: Vec<String> = applicable
            .iter()
            .map(|t| {
                format!(
                    "{} - {}",
                    self.name_of(ParametricKind::TipoProceso, t.get_i64("idTipoProcesoSeleccion")),
                    self.name_of(ParametricKind::ObjetoContratacion, t.get_i64("idObjetoContratacion"))
                )
            })
            .collect();

        let january_first = NaiveDate::from_ymd_opt(year, 1, 1).unwrap_or_else(|| Local::now().date_naive());
        EvaluationResult {
            evaluacion_exitosa: !applicable.is_empty(),
            mensaje,
            parametricas_utilizadas: Some(self.vigentes(january_first)),
            reglas_aplicadas: Some(reglas_aplicadas),
            resultados_detalle: None,
            fecha_evaluacion: Some(now()),
        }
    }

    pub fn health(&self, today: NaiveDate) -> String {
        let snapshot = self.vigentes(today);
        format!(
            "Parametric system OK - UIT: {}, Process types: {}, Objects: {}, Operators: {}, Caps: {}",
            if snapshot.uit_vigente.is_some() { "Available" } else { "Unavailable" },
            snapshot.tipos_proceso.len(),
            snapshot.objetos_contratacion.len(),
            snapshot.operadores_monto.len(),
            snapshot.topes_vigentes.len()
        )
    }

    /// Catalog entries with live counts and available years.
    pub fn catalog(&self) -> Catalog {
        let parametricas = ParametricKind::ALL
            .into_iter()
            .map(|kind| {
                let mut metadata = seed::metadata(kind);
                let live: Vec<&EntityRecord> = self.live(kind).collect();
                let years: BTreeSet<i32> = live
                    .iter()
                    .filter_map(|r| r.get_i64("anioVigencia"))
                    .map(|y| y as i32)
                    .collect();
                metadata.total_registros = Some(live.len() as u64);
                metadata.anios_disponibles = years.into_iter().rev().collect();
                (kind.catalog_key().to_string(), metadata)
            })
            .collect::<indexmap::IndexMap<_, _>>();

        Catalog {
            total_parametricas: Some(parametricas.len()),
            parametricas,
            fecha_generacion: Some(now()),
            version: Some("1.0".to_string()),
        }
    }

    pub fn rules(&self) -> Vec<RuleRecord> {
        self.rules.clone()
    }

    fn rule_position(&self, id: i64) -> Result<usize, StubError> {
        self.rules
            .iter()
            .position(|r| r.id == id)
            .ok_or_else(|| StubError::NotFound {
                entity: "Rule".to_string(),
                id,
            })
    }

    pub fn create_rule(&mut self, draft: RuleDraft) -> Result<RuleRecord, StubError> {
        if !draft.is_complete() {
            return Err(StubError::Validation("Rule name and content are required".to_string()));
        }
        let stamp = now();
        let mut rule = RuleRecord::from_draft(self.allocate_id(), draft);
        rule.created_at = Some(stamp);
        rule.updated_at = Some(stamp);
        self.rules.push(rule.clone());
        Ok(rule)
    }

    pub fn update_rule(&mut self, id: i64, rule: RuleRecord) -> Result<RuleRecord, StubError> {
        let index = self.rule_position(id)?;
        let existing = &mut self.rules[index];
        *existing = RuleRecord {
            id,
            created_at: existing.created_at,
            updated_at: Some(now()),
            ..rule
        };
        Ok(existing.clone())
    }

    pub fn delete_rule(&mut self, id: i64) -> Result<(), StubError> {
        let index = self.rule_position(id)?;
        self.rules.remove(index);
        Ok(())
    }

    pub fn toggle_rule(&mut self, id: i64) -> Result<RuleRecord, StubError> {
        let index = self.rule_position(id)?;
        let rule = &mut self.rules[index];
        rule.active = !rule.active;
        rule.updated_at = Some(now());
        Ok(rule.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_operator_matching() {
        assert!(operator_matches("MAYOR_IGUAL", 400_000.0, 400_000.0));
        assert!(!operator_matches("MAYOR", 400_000.0, 400_000.0));
        assert!(operator_matches("MENOR", 15_000.0, 400_000.0));
        assert!(operator_matches("MENOR_IGUAL", 400_000.0, 400_000.0));
        assert!(!operator_matches("ENTRE", 1.0, 1.0));
    }

    #[test]
    fn test_seeded_objects_link_sub_descriptions() {
        let store = Store::seeded();
        let sub_id = store.id_by_codigo(ParametricKind::SubDescripcion, "SG");
        assert!(sub_id.is_some());

        let objects = store.list(ParametricKind::ObjetoContratacion, None);
        let servicios = objects.iter().find(|o| o.get_str("codigo") == Some("SE")).unwrap();
        assert_eq!(servicios.get_i64("idSubDescripcionContratacion"), sub_id);
        assert_eq!(servicios.get("permiteSubDescripcion"), Some(&true.into()));

        let bienes = objects.iter().find(|o| o.get_str("codigo") == Some("BI")).unwrap();
        assert!(bienes.get("idSubDescripcionContratacion").unwrap().is_null());
    }

    #[test]
    fn test_seeded_caps_reference_their_year_uit() {
        let store = Store::seeded();
        let caps = store.list(ParametricKind::Topes, Some(2025));
        assert_eq!(caps.len(), 4);
        for cap in caps {
            assert_eq!(cap.get_f64("referenciaUit"), Some(5350.0));
            assert!(cap.get_i64("idUit").is_some());
        }
    }

    #[test]
    fn test_evaluate_small_amount() {
        let store = Store::seeded();
        let result = store.evaluate(&EvaluationRequest::new(date(2025, 3, 1), 15_000.0));

        assert!(result.evaluacion_exitosa);
        assert_eq!(result.mensaje, "Found 2 applicable caps");
        assert_eq!(
            result.reglas(),
            [
                "Adjudicacion Simplificada - Bienes",
                "Adjudicacion Simplificada - Servicios"
            ]
        );
        let used = result.parametricas_utilizadas.unwrap();
        assert_eq!(used.anio_vigencia, Some(2025));
    }

    #[test]
    fn test_evaluate_year_without_caps() {
        let store = Store::seeded();
        let result = store.evaluate(&EvaluationRequest::new(date(2024, 3, 1), 15_000.0));
        assert!(!result.evaluacion_exitosa);
        assert_eq!(result.mensaje, "No applicable caps found for the specified amount");
        assert_eq!(result.reglas_aplicadas, Some(Vec::new()));
    }

    #[test]
    fn test_uit_vigente_falls_back_to_latest_earlier_year() {
        let store = Store::seeded();
        let uit = store.uit_vigente(2030).unwrap();
        assert_eq!(uit.get_i64("anioVigencia"), Some(2025));
        assert!(store.uit_vigente(2020).is_none());
    }

    #[test]
    fn test_uit_duplicate_year_rejected() {
        let mut store = Store::seeded();
        let duplicate = EntityRecord::new()
            .with_field("monto", 5000.0)
            .with_field("anioVigencia", 2025);
        let err = store.create(ParametricKind::Uit, duplicate).unwrap_err();
        assert_eq!(err.status(), 409);

        let zero = EntityRecord::new()
            .with_field("monto", 0.0)
            .with_field("anioVigencia", 2026);
        assert_eq!(store.create(ParametricKind::Uit, zero).unwrap_err().status(), 400);
    }

    #[test]
    fn test_soft_delete_hides_record() {
        let mut store = Store::seeded();
        let id = store.list(ParametricKind::SubDescripcion, None)[0].id.unwrap();
        store.delete(ParametricKind::SubDescripcion, id).unwrap();

        assert_eq!(store.list(ParametricKind::SubDescripcion, None).len(), 1);
        assert!(store.get(ParametricKind::SubDescripcion, id).is_err());
        assert!(store.delete(ParametricKind::SubDescripcion, id).is_err());
    }

    #[test]
    fn test_rule_toggle_and_delete() {
        let mut store = Store::seeded();
        let rule = store.toggle_rule(4).unwrap();
        assert!(rule.active);
        store.delete_rule(4).unwrap();
        assert_eq!(store.toggle_rule(4).unwrap_err().status(), 404);
    }

    #[test]
    fn test_catalog_counts() {
        let store = Store::seeded();
        let catalog = store.catalog();
        assert_eq!(catalog.total_parametricas, Some(6));
        let uit = catalog.metadata("uit").unwrap();
        assert_eq!(uit.total_registros, Some(3));
        assert_eq!(uit.anios_disponibles, vec![2025, 2024, 2023]);
        assert!(catalog.metadata("tipo-proceso").is_some());
    }
}
