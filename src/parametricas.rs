//! The parametric tables the console manages, and the evaluation payloads.

use chrono::{Datelike, NaiveDateTime};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::client::ApiError;
use crate::entity::{null_as_default, EntityRecord};

/// Operations a management screen may offer for an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    View,
    Create,
    Edit,
    Delete,
}

const ALL_OPERATIONS: &[Operation] = &[
    Operation::View,
    Operation::Create,
    Operation::Edit,
    Operation::Delete,
];

/// The six parametric tables.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ParametricKind {
    Uit,
    TipoProceso,
    ObjetoContratacion,
    OperadoresMonto,
    SubDescripcion,
    Topes,
}

/// Static presentation data for one entity.
#[derive(Debug, Clone, PartialEq)]
pub struct EntityConfig {
    pub kind: ParametricKind,
    pub friendly_name: &'static str,
    pub description: &'static str,
    pub icon: &'static str,
    pub required_fields: &'static [&'static str],
    pub optional_fields: &'static [&'static str],
    pub operations: &'static [Operation],
}

impl ParametricKind {
    pub const ALL: [ParametricKind; 6] = [
        ParametricKind::Uit,
        ParametricKind::TipoProceso,
        ParametricKind::ObjetoContratacion,
        ParametricKind::OperadoresMonto,
        ParametricKind::SubDescripcion,
        ParametricKind::Topes,
    ];

    /// Endpoint segment under the API base.
    pub fn path(&self) -> &'static str {
        match self {
            ParametricKind::Uit => "uit",
            ParametricKind::TipoProceso => "tipo-proceso",
            ParametricKind::ObjetoContratacion => "objeto-contratacion",
            ParametricKind::OperadoresMonto => "operadores-monto",
            ParametricKind::SubDescripcion => "sub-descripcion",
            ParametricKind::Topes => "topes",
        }
    }

    /// Key of the entity in the metadata catalog.
    pub fn catalog_key(&self) -> &'static str {
        match self {
            ParametricKind::Uit => "uit",
            ParametricKind::TipoProceso => "tipo_proceso",
            ParametricKind::ObjetoContratacion => "objeto_contratacion",
            ParametricKind::OperadoresMonto => "operadores_monto",
            ParametricKind::SubDescripcion => "sub_descripcion",
            ParametricKind::Topes => "topes",
        }
    }

    pub fn config(&self) -> EntityConfig {
        match self {
            ParametricKind::Uit => EntityConfig {
                kind: *self,
                friendly_name: "UIT",
                description: "Tax unit value per fiscal year",
                icon: "monetization_on",
                required_fields: &["monto", "anioVigencia"],
                optional_fields: &["estado", "observaciones"],
                operations: ALL_OPERATIONS,
            },
            ParametricKind::TipoProceso => EntityConfig {
                kind: *self,
                friendly_name: "Process Types",
                description: "Selection process types",
                icon: "account_tree",
                required_fields: &["codigo", "nombre", "anioVigencia"],
                optional_fields: &["descripcion", "estado", "observaciones"],
                operations: ALL_OPERATIONS,
            },
            ParametricKind::ObjetoContratacion => EntityConfig {
                kind: *self,
                friendly_name: "Contracting Objects",
                description: "Contracting objects (goods, services, works)",
                icon: "category",
                required_fields: &["codigo", "nombre"],
                optional_fields: &[
                    "descripcion",
                    "idSubDescripcionContratacion",
                    "permiteSubDescripcion",
                    "estado",
                ],
                operations: ALL_OPERATIONS,
            },
            ParametricKind::OperadoresMonto => EntityConfig {
                kind: *self,
                friendly_name: "Amount Operators",
                description: "Comparison operators for amount evaluation",
                icon: "functions",
                required_fields: &["codigo", "nombre", "simbolo"],
                optional_fields: &["descripcion", "estado"],
                operations: &[Operation::View, Operation::Create],
            },
            ParametricKind::SubDescripcion => EntityConfig {
                kind: *self,
                friendly_name: "Sub-descriptions",
                description: "Sub-descriptions of contracting objects",
                icon: "subdirectory_arrow_right",
                required_fields: &["codigo", "nombre"],
                optional_fields: &["descripcion", "estado"],
                operations: ALL_OPERATIONS,
            },
            ParametricKind::Topes => EntityConfig {
                kind: *self,
                friendly_name: "Caps",
                description: "Amount caps per process type and object",
                icon: "policy",
                required_fields: &[
                    "idTipoProcesoSeleccion",
                    "idObjetoContratacion",
                    "idOperadorMonto",
                    "monto",
                    "anioVigencia",
                ],
                optional_fields: &[
                    "idSubDescripcionContratacion",
                    "referenciaUit",
                    "observaciones",
                    "estado",
                ],
                operations: ALL_OPERATIONS,
            },
        }
    }

    pub fn allows(&self, operation: Operation) -> bool {
        self.config().operations.contains(&operation)
    }
}

impl fmt::Display for ParametricKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.path())
    }
}

impl FromStr for ParametricKind {
    type Err = String;

    /// Accepts either the endpoint path or the catalog key.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ParametricKind::ALL
            .into_iter()
            .find(|kind| kind.path() == s || kind.catalog_key() == s)
            .ok_or_else(|| format!("Unknown parametric entity: {}", s))
    }
}

/// Every parametric value in force on a date.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct VigentesSnapshot {
    pub fecha_evaluacion: Option<NaiveDateTime>,
    pub anio_vigencia: Option<i32>,
    pub uit_vigente: Option<EntityRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub tipos_proceso: Vec<EntityRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub objetos_contratacion: Vec<EntityRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub operadores_monto: Vec<EntityRecord>,
    #[serde(deserialize_with = "null_as_default")]
    pub topes_vigentes: Vec<EntityRecord>,
}

/// Input of a parametric evaluation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationRequest {
    pub fecha_evaluacion: Option<NaiveDateTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tipo_proceso_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub objeto_contratacion_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub sub_descripcion_id: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub operador_monto_id: Option<i64>,
    pub monto_contrato: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub anio_vigencia: Option<i32>,
    #[serde(skip_serializing_if = "IndexMap::is_empty")]
    pub parametros_adicionales: IndexMap<String, serde_json::Value>,
}

impl EvaluationRequest {
    pub fn new(fecha_evaluacion: NaiveDateTime, monto_contrato: f64) -> Self {
        Self {
            fecha_evaluacion: Some(fecha_evaluacion),
            monto_contrato: Some(monto_contrato),
            ..Self::default()
        }
    }

    /// Year the caps are looked up for: the explicit year, else the year of
    /// the evaluation date.
    pub fn year(&self) -> Option<i32> {
        self.anio_vigencia
            .or_else(|| self.fecha_evaluacion.map(|d| d.year()))
    }

    /// Checks performed before the request is sent.
    pub fn validate(&self) -> Result<(), ApiError> {
        if self.fecha_evaluacion.is_none() {
            return Err(ApiError::Invalid("Evaluation date is required".to_string()));
        }
        match self.monto_contrato {
            Some(monto) if monto > 0.0 => Ok(()),
            _ => Err(ApiError::Invalid(
                "Contract amount must be greater than zero".to_string(),
            )),
        }
    }
}

/// Outcome of an evaluation. The backend leaves `reglasAplicadas` null when
/// the evaluation fails and never fills `resultadosDetalle`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EvaluationResult {
    #[serde(deserialize_with = "null_as_default")]
    pub evaluacion_exitosa: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub mensaje: String,
    pub parametricas_utilizadas: Option<VigentesSnapshot>,
    pub reglas_aplicadas: Option<Vec<String>>,
    pub resultados_detalle: Option<IndexMap<String, serde_json::Value>>,
    pub fecha_evaluacion: Option<NaiveDateTime>,
}

impl EvaluationResult {
    /// Applied rule labels, empty when the backend sent none.
    pub fn reglas(&self) -> &[String] {
        self.reglas_aplicadas.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(0, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_kind_names_roundtrip() {
        for kind in ParametricKind::ALL {
            assert_eq!(kind.path().parse::<ParametricKind>(), Ok(kind));
            assert_eq!(kind.catalog_key().parse::<ParametricKind>(), Ok(kind));
        }
        assert!("clientes".parse::<ParametricKind>().is_err());
    }

    #[test]
    fn test_operators_are_view_and_create_only() {
        let kind = ParametricKind::OperadoresMonto;
        assert!(kind.allows(Operation::View));
        assert!(kind.allows(Operation::Create));
        assert!(!kind.allows(Operation::Edit));
        assert!(!kind.allows(Operation::Delete));
        assert!(ParametricKind::Topes.allows(Operation::Delete));
    }

    #[test]
    fn test_request_validation() {
        let request = EvaluationRequest::new(date(2025, 3, 1), 0.0);
        assert_eq!(
            request.validate(),
            Err(ApiError::Invalid(
                "Contract amount must be greater than zero".to_string()
            ))
        );

        let request = EvaluationRequest {
            monto_contrato: Some(1000.0),
            ..EvaluationRequest::default()
        };
        assert!(request.validate().is_err());

        assert!(EvaluationRequest::new(date(2025, 3, 1), 15_000.0)
            .validate()
            .is_ok());
    }

    #[test]
    fn test_request_year_prefers_explicit_year() {
        let mut request = EvaluationRequest::new(date(2025, 3, 1), 15_000.0);
        assert_eq!(request.year(), Some(2025));
        request.anio_vigencia = Some(2024);
        assert_eq!(request.year(), Some(2024));
    }

    #[test]
    fn test_request_serializes_camel_case() {
        let mut request = EvaluationRequest::new(date(2025, 3, 1), 15_000.0);
        request.tipo_proceso_id = Some(2);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["fechaEvaluacion"], "2025-03-01T00:00:00");
        assert_eq!(json["tipoProcesoId"], 2);
        assert_eq!(json["montoContrato"], 15_000.0);
        assert!(json.get("objetoContratacionId").is_none());
        assert!(json.get("parametrosAdicionales").is_none());
    }

    #[test]
    fn test_result_accepts_null_collections() {
        let success: EvaluationResult = serde_json::from_str(
            r#"{"evaluacionExitosa":true,"mensaje":"Found 1 applicable caps",
                "parametricasUtilizadas":{"anioVigencia":2025,"uitVigente":null,
                    "tiposProceso":null,"objetosContratacion":[],"operadoresMonto":null,
                    "topesVigentes":null},
                "reglasAplicadas":["Licitacion Publica - Bienes"],
                "resultadosDetalle":null,"fechaEvaluacion":"2025-03-01T10:00:00"}"#,
        )
        .unwrap();
        assert!(success.evaluacion_exitosa);
        assert_eq!(success.reglas(), ["Licitacion Publica - Bienes".to_string()]);
        assert_eq!(success.resultados_detalle, None);
        let used = success.parametricas_utilizadas.unwrap();
        assert!(used.tipos_proceso.is_empty());
        assert!(used.topes_vigentes.is_empty());

        let failure: EvaluationResult = serde_json::from_str(
            r#"{"evaluacionExitosa":false,"mensaje":"Evaluation error: boom",
                "parametricasUtilizadas":null,"reglasAplicadas":null,
                "resultadosDetalle":null,"fechaEvaluacion":"2025-03-01T10:00:00"}"#,
        )
        .unwrap();
        assert!(!failure.evaluacion_exitosa);
        assert!(failure.reglas().is_empty());
        assert_eq!(failure.parametricas_utilizadas, None);
    }

    #[test]
    fn test_result_serializes_missing_collections_as_null() {
        let json = serde_json::to_value(EvaluationResult::default()).unwrap();
        assert!(json["reglasAplicadas"].is_null());
        assert!(json["resultadosDetalle"].is_null());
    }
}
