//! Generic CRUD over the parametric tables.

use crate::client::{ApiResult, HttpClient};
use crate::entity::EntityRecord;

/// CRUD façade for `{base}/{entity}` endpoints.
///
/// `entity` is the endpoint name (`uit`, `tipo-proceso`, ...).
#[derive(Debug, Clone)]
pub struct EntityClient {
    http: HttpClient,
}

impl EntityClient {
    pub fn new(http: HttpClient) -> Self {
        Self { http }
    }

    /// List records, optionally filtered by validity year (`?anio=`).
    pub async fn list(&self, entity: &str, year: Option<i32>) -> ApiResult<Vec<EntityRecord>> {
        let query: Vec<(&str, String)> = year.map(|y| ("anio", y.to_string())).into_iter().collect();
        tracing::debug!("GET {} (year filter: {:?})", entity, year);

        let records: Vec<EntityRecord> = self
            .http
            .get(entity, &query)
            .await
            .inspect_err(|e| tracing::warn!("Listing {} failed: {}", entity, e))?;
        tracing::debug!("Fetched {} {} records", records.len(), entity);
        Ok(records)
    }

    pub async fn get(&self, entity: &str, id: i64) -> ApiResult<EntityRecord> {
        tracing::debug!("GET {}/{}", entity, id);
        self.http
            .get(&format!("{}/{}", entity, id), &[])
            .await
            .inspect_err(|e| tracing::warn!("Fetching {} {} failed: {}", entity, id, e))
    }

    pub async fn create(&self, entity: &str, record: &EntityRecord) -> ApiResult<EntityRecord> {
        tracing::debug!("POST {}", entity);
        let created: EntityRecord = self
            .http
            .post(entity, record, None)
            .await
            .inspect_err(|e| tracing::warn!("Creating {} failed: {}", entity, e))?;
        tracing::info!("Created {} {:?}", entity, created.id);
        Ok(created)
    }

    pub async fn update(
        &self,
        entity: &str,
        id: i64,
        record: &EntityRecord,
    ) -> ApiResult<EntityRecord> {
        tracing::debug!("PUT {}/{}", entity, id);
        let updated: EntityRecord = self
            .http
            .put(&format!("{}/{}", entity, id), record)
            .await
            .inspect_err(|e| tracing::warn!("Updating {} {} failed: {}", entity, id, e))?;
        tracing::info!("Updated {} {}", entity, id);
        Ok(updated)
    }

    /// Delete a record. Any failure yields `false`.
    pub async fn delete(&self, entity: &str, id: i64) -> bool {
        tracing::debug!("DELETE {}/{}", entity, id);
        match self.http.delete(&format!("{}/{}", entity, id)).await {
            Ok(()) => {
                tracing::info!("Deleted {} {}", entity, id);
                true
            }
            Err(e) => {
                tracing::warn!("Deleting {} {} failed: {}", entity, id, e);
                false
            }
        }
    }
}
