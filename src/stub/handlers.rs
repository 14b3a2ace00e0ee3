//! Request handlers for the stub backend.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use chrono::{Datelike, Local, NaiveDate};
use serde::Deserialize;
use std::sync::Arc;

use crate::entity::EntityRecord;
use crate::metadata::Catalog;
use crate::parametricas::{EvaluationRequest, EvaluationResult, ParametricKind, VigentesSnapshot};
use crate::rules::{RuleDraft, RuleRecord};
use crate::simulation::{classify, Customer, ExecutionResult};
use crate::stub::store::{ErrorResponse, StubError};
use crate::stub::AppState;

type Shared = State<Arc<AppState>>;

impl IntoResponse for StubError {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        tracing::debug!("Request failed with {}: {}", status, self);
        (status, Json(ErrorResponse::from(&self))).into_response()
    }
}

fn kind(entity: &str) -> Result<ParametricKind, StubError> {
    entity
        .parse()
        .map_err(|_| StubError::UnknownEntity(entity.to_string()))
}

#[derive(Debug, Deserialize)]
pub struct YearQuery {
    pub anio: Option<i32>,
}

#[derive(Debug, Deserialize)]
pub struct DateQuery {
    pub fecha: Option<NaiveDate>,
}

impl DateQuery {
    fn date(&self) -> NaiveDate {
        self.fecha.unwrap_or_else(|| Local::now().date_naive())
    }
}

pub async fn list_entities(
    State(state): Shared,
    Path(entity): Path<String>,
    Query(query): Query<YearQuery>,
) -> Result<Json<Vec<EntityRecord>>, StubError> {
    let kind = kind(&entity)?;
    let store = state.store.read().await;
    Ok(Json(store.list(kind, query.anio)))
}

pub async fn get_entity(
    State(state): Shared,
    Path((entity, id)): Path<(String, i64)>,
) -> Result<Json<EntityRecord>, StubError> {
    let kind = kind(&entity)?;
    let store = state.store.read().await;
    Ok(Json(store.get(kind, id)?))
}

pub async fn create_entity(
    State(state): Shared,
    Path(entity): Path<String>,
    Json(record): Json<EntityRecord>,
) -> Result<(StatusCode, Json<EntityRecord>), StubError> {
    let kind = kind(&entity)?;
    let mut store = state.store.write().await;
    let created = store.create(kind, record)?;
    Ok((StatusCode::CREATED, Json(created)))
}

pub async fn update_entity(
    State(state): Shared,
    Path((entity, id)): Path<(String, i64)>,
    Json(record): Json<EntityRecord>,
) -> Result<Json<EntityRecord>, StubError> {
    let kind = kind(&entity)?;
    let mut store = state.store.write().await;
    Ok(Json(store.update(kind, id, record)?))
}

pub async fn delete_entity(
    State(state): Shared,
    Path((entity, id)): Path<(String, i64)>,
) -> Result<StatusCode, StubError> {
    let kind = kind(&entity)?;
    let mut store = state.store.write().await;
    store.delete(kind, id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn vigentes(State(state): Shared, Query(query): Query<DateQuery>) -> Json<VigentesSnapshot> {
    let store = state.store.read().await;
    Json(store.vigentes(query.date()))
}

pub async fn evaluate(
    State(state): Shared,
    Json(request): Json<EvaluationRequest>,
) -> Json<EvaluationResult> {
    let store = state.store.read().await;
    Json(store.evaluate(&request))
}

pub async fn catalog(State(state): Shared) -> Json<Catalog> {
    let store = state.store.read().await;
    Json(store.catalog())
}

pub async fn health(State(state): Shared) -> String {
    let store = state.store.read().await;
    store.health(Local::now().date_naive())
}

pub async fn uit_vigente(
    State(state): Shared,
    Query(query): Query<DateQuery>,
) -> Result<Json<EntityRecord>, StubError> {
    let year = query.date().year();
    let store = state.store.read().await;
    store
        .uit_vigente(year)
        .map(Json)
        .ok_or(StubError::NoUitInForce(year))
}

pub async fn list_rules(State(state): Shared) -> Json<Vec<RuleRecord>> {
    let store = state.store.read().await;
    Json(store.rules())
}

pub async fn create_rule(
    State(state): Shared,
    Json(draft): Json<RuleDraft>,
) -> Result<(StatusCode, Json<RuleRecord>), StubError> {
    let mut store = state.store.write().await;
    let rule = store.create_rule(draft)?;
    Ok((StatusCode::CREATED, Json(rule)))
}

pub async fn update_rule(
    State(state): Shared,
    Path(id): Path<i64>,
    Json(rule): Json<RuleRecord>,
) -> Result<Json<RuleRecord>, StubError> {
    let mut store = state.store.write().await;
    Ok(Json(store.update_rule(id, rule)?))
}

pub async fn delete_rule(State(state): Shared, Path(id): Path<i64>) -> Result<StatusCode, StubError> {
    let mut store = state.store.write().await;
    store.delete_rule(id)?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn toggle_rule(
    State(state): Shared,
    Path(id): Path<i64>,
) -> Result<Json<RuleRecord>, StubError> {
    let mut store = state.store.write().await;
    Ok(Json(store.toggle_rule(id)?))
}

pub async fn execute_rules(Json(customer): Json<Customer>) -> Json<ExecutionResult> {
    let mut result = classify(&customer);
    result.registration_date = Some(Local::now().format("%Y-%m-%d").to_string());
    Json(result)
}
