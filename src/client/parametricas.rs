//! Parametric queries: vigentes snapshot, evaluation, metadata catalog.

use chrono::NaiveDate;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

use crate::client::{ApiError, ApiResult, HttpClient};
use crate::entity::EntityRecord;
use crate::metadata::Catalog;
use crate::parametricas::{EvaluationRequest, EvaluationResult, VigentesSnapshot};

/// Latest successfully fetched catalog; `None` before the first fetch and
/// after a failed one.
pub type CatalogSlot = Option<Arc<Catalog>>;

#[derive(Clone)]
pub struct ParametricasClient {
    http: HttpClient,
    evaluate_timeout: Duration,
    catalog: Arc<watch::Sender<CatalogSlot>>,
}

fn fecha(date: NaiveDate) -> Vec<(&'static str, String)> {
    vec![("fecha", date.format("%Y-%m-%d").to_string())]
}

impl ParametricasClient {
    pub fn new(http: HttpClient, evaluate_timeout: Duration) -> Self {
        let (tx, _rx) = watch::channel(None);
        Self {
            http,
            evaluate_timeout,
            catalog: Arc::new(tx),
        }
    }

    /// Parametric values in force on `date`.
    pub async fn vigentes(&self, date: NaiveDate) -> ApiResult<VigentesSnapshot> {
        tracing::debug!("Fetching vigentes for {}", date);
        self.http
            .get("parametricas/vigentes", &fecha(date))
            .await
            .inspect_err(|e| tracing::warn!("Fetching vigentes failed: {}", e))
    }

    /// Evaluate a request. Invalid requests are rejected without a call.
    pub async fn evaluate(&self, request: &EvaluationRequest) -> ApiResult<EvaluationResult> {
        request.validate()?;
        tracing::debug!("Evaluating parametricas for {:?}", request.fecha_evaluacion);

        let call = self.http.post::<_, EvaluationResult>(
            "parametricas/evaluar",
            request,
            Some(self.evaluate_timeout),
        );
        match tokio::time::timeout(self.evaluate_timeout, call).await {
            Ok(result) => result.inspect_err(|e| tracing::warn!("Evaluation failed: {}", e)),
            Err(_) => {
                tracing::warn!("Evaluation exceeded {:?}", self.evaluate_timeout);
                Err(ApiError::Unavailable("request timed out".to_string()))
            }
        }
    }

    /// Fetch the metadata catalog and publish it to subscribers. A failure
    /// clears the published value.
    pub async fn catalog(&self) -> ApiResult<Arc<Catalog>> {
        match self.http.get::<Catalog>("parametricas/catalogo-completo", &[]).await {
            Ok(catalog) => {
                tracing::info!(
                    "Catalog received with {} parametricas",
                    catalog.parametricas.len()
                );
                let catalog = Arc::new(catalog);
                self.catalog.send_replace(Some(catalog.clone()));
                Ok(catalog)
            }
            Err(e) => {
                tracing::error!("Fetching catalog failed: {}", e);
                self.catalog.send_replace(None);
                Err(e)
            }
        }
    }

    /// The last published catalog, without fetching.
    pub fn cached_catalog(&self) -> CatalogSlot {
        self.catalog.borrow().clone()
    }

    pub fn subscribe_catalog(&self) -> watch::Receiver<CatalogSlot> {
        self.catalog.subscribe()
    }

    /// Backend health line.
    pub async fn health(&self) -> ApiResult<String> {
        self.http.get_text("parametricas/health").await
    }

    /// The UIT record in force on `date`.
    pub async fn uit_vigente(&self, date: NaiveDate) -> ApiResult<EntityRecord> {
        self.http
            .get("uit/vigente", &fecha(date))
            .await
            .inspect_err(|e| tracing::warn!("Fetching UIT vigente failed: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn offline() -> ParametricasClient {
        ParametricasClient::new(HttpClient::new("http://127.0.0.1:9/api"), Duration::from_secs(2))
    }

    #[tokio::test]
    async fn test_invalid_request_never_reaches_network() {
        let client = offline();
        let request = EvaluationRequest::default();
        let err = client.evaluate(&request).await.unwrap_err();
        assert!(matches!(err, ApiError::Invalid(_)));
    }

    #[tokio::test]
    async fn test_failed_catalog_clears_slot() {
        let client = offline();
        client.catalog.send_replace(Some(Arc::new(Catalog::default())));
        let rx = client.subscribe_catalog();

        assert!(client.catalog().await.is_err());
        assert!(rx.has_changed().unwrap());
        assert!(client.cached_catalog().is_none());
    }
}
