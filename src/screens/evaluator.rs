use chrono::{Datelike, Duration, Local, NaiveDate, NaiveDateTime};
use rand::seq::SliceRandom;
use rand::Rng;
use std::sync::Arc;

use crate::client::{ApiError, Backend};
use crate::entity::EntityRecord;
use crate::notify::Notifier;
use crate::parametricas::{EvaluationRequest, EvaluationResult, ParametricKind, VigentesSnapshot};

/// Sample requirements offered by "random example".
pub const EXAMPLES: &[(f64, &str)] = &[
    (15_000.0, "Office equipment purchase"),
    (75_000.0, "Cleaning services"),
    (250_000.0, "Vehicle acquisition"),
    (800_000.0, "Infrastructure construction"),
    (35_000.0, "Consulting services"),
    (120_000.0, "Technology equipment"),
];

/// Years selectable for an evaluation: five back, two ahead.
pub fn available_years(current_year: i32) -> Vec<i32> {
    (current_year - 5..=current_year + 2).collect()
}

fn midnight(date: NaiveDate) -> NaiveDateTime {
    date.and_time(chrono::NaiveTime::MIN)
}

/// A sample request dated within the two years before `today`.
pub fn random_example_with<R: Rng + ?Sized>(rng: &mut R, today: NaiveDate) -> (EvaluationRequest, &'static str) {
    let (monto, description) = EXAMPLES.choose(rng).copied().unwrap_or(EXAMPLES[0]);
    let date = today - Duration::days(rng.gen_range(0..730));
    let mut request = EvaluationRequest::new(midnight(date), monto);
    request.anio_vigencia = Some(date.year());
    (request, description)
}

/// Parametric evaluator: builds a request, evaluates it and shows the
/// values in force on its date.
pub struct EvaluatorScreen {
    backend: Backend,
    notifier: Arc<dyn Notifier>,
    pub request: EvaluationRequest,
    last_result: Option<EvaluationResult>,
    vigentes: Option<VigentesSnapshot>,
    pub tipos_proceso: Vec<EntityRecord>,
    pub objetos_contratacion: Vec<EntityRecord>,
    pub operadores_monto: Vec<EntityRecord>,
}

fn blank_request() -> EvaluationRequest {
    let today = Local::now().date_naive();
    EvaluationRequest {
        fecha_evaluacion: Some(midnight(today)),
        monto_contrato: Some(0.0),
        anio_vigencia: Some(today.year()),
        ..EvaluationRequest::default()
    }
}

impl EvaluatorScreen {
    pub fn new(backend: Backend, notifier: Arc<dyn Notifier>) -> Self {
        Self {
            backend,
            notifier,
            request: blank_request(),
            last_result: None,
            vigentes: None,
            tipos_proceso: Vec::new(),
            objetos_contratacion: Vec::new(),
            operadores_monto: Vec::new(),
        }
    }

    pub fn last_result(&self) -> Option<&EvaluationResult> {
        self.last_result.as_ref()
    }

    pub fn vigentes(&self) -> Option<&VigentesSnapshot> {
        self.vigentes.as_ref()
    }

    /// Select lists, then the snapshot for the request date.
    pub async fn load(&mut self) -> bool {
        let entities = &self.backend.entities;
        let (tipos, objetos, operadores) = tokio::join!(
            entities.list(ParametricKind::TipoProceso.path(), None),
            entities.list(ParametricKind::ObjetoContratacion.path(), None),
            entities.list(ParametricKind::OperadoresMonto.path(), None),
        );
        match (tipos, objetos, operadores) {
            (Ok(tipos), Ok(objetos), Ok(operadores)) => {
                self.tipos_proceso = tipos;
                self.objetos_contratacion = objetos;
                self.operadores_monto = operadores;
            }
            _ => {
                self.notifier.error("Error loading initial data");
                return false;
            }
        }
        self.load_vigentes().await
    }

    pub async fn load_vigentes(&mut self) -> bool {
        let Some(fecha) = self.request.fecha_evaluacion else {
            return false;
        };
        match self.backend.parametricas.vigentes(fecha.date()).await {
            Ok(snapshot) => {
                self.vigentes = Some(snapshot);
                true
            }
            Err(ApiError::Domain(message)) => {
                self.notifier.error(&message);
                self.vigentes = None;
                false
            }
            Err(e) => {
                tracing::warn!("Vigentes unavailable: {}", e);
                self.notifier.warning("Error loading parametric values in force");
                self.vigentes = None;
                false
            }
        }
    }

    /// Change the evaluation date; the year follows and the snapshot is
    /// reloaded.
    pub async fn set_date(&mut self, date: NaiveDate) -> bool {
        self.request.fecha_evaluacion = Some(midnight(date));
        self.request.anio_vigencia = Some(date.year());
        self.load_vigentes().await
    }

    pub async fn evaluate(&mut self) -> Option<&EvaluationResult> {
        if let Err(e) = self.request.validate() {
            self.notifier.warning(&e.to_string());
            return None;
        }
        match self.backend.parametricas.evaluate(&self.request).await {
            Ok(result) => {
                if result.evaluacion_exitosa {
                    self.notifier.success("Evaluation completed successfully");
                } else {
                    self.notifier.warning(&result.mensaje);
                }
                self.last_result = Some(result);
                self.last_result.as_ref()
            }
            Err(ApiError::Domain(message)) => {
                self.notifier.error(&message);
                self.last_result = None;
                None
            }
            Err(e) => {
                tracing::warn!("Evaluation failed: {}", e);
                self.notifier.error("Error evaluating the requirement");
                self.last_result = None;
                None
            }
        }
    }

    pub async fn random_example(&mut self) {
        let today = Local::now().date_naive();
        let (request, description) = random_example_with(&mut rand::thread_rng(), today);
        self.request = request;
        self.load_vigentes().await;
        self.notifier
            .info(&format!("Example generated: {}", description));
    }

    pub async fn clear(&mut self) {
        self.request = blank_request();
        self.last_result = None;
        self.load_vigentes().await;
        self.notifier.info("Form cleared");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_available_years() {
        assert_eq!(
            available_years(2025),
            vec![2020, 2021, 2022, 2023, 2024, 2025, 2026, 2027]
        );
    }

    #[test]
    fn test_random_example_is_valid_and_recent() {
        let mut rng = StdRng::seed_from_u64(11);
        let today = NaiveDate::from_ymd_opt(2025, 6, 30).unwrap();
        for _ in 0..20 {
            let (request, description) = random_example_with(&mut rng, today);
            assert!(request.validate().is_ok());
            assert!(EXAMPLES.iter().any(|(_, d)| *d == description));

            let date = request.fecha_evaluacion.unwrap().date();
            assert!(date <= today && date > today - Duration::days(730));
            assert_eq!(request.year(), Some(date.year()));
        }
    }
}
