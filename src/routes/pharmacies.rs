//! Pharmacy endpoints
//!
//! Reads go through the cache-aside read guard. Writes require a credential
//! and evict every cache key the mutation can affect once the store has
//! accepted it.

use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Json,
};
use tracing::{info, instrument};

use super::root::MessageResponse;
use crate::{
    cache::keys,
    error::{AppError, AppResult},
    models::{Pharmacy, PharmacyInput},
    store::{collections::PHARMACIES, from_document, to_document, DocumentStore, Updated},
    AppState,
};

fn not_found() -> AppError {
    AppError::NotFound("Pharmacy not found".to_string())
}

async fn load_all(store: &dyn DocumentStore) -> AppResult<Vec<Pharmacy>> {
    store
        .find_all(PHARMACIES)
        .await?
        .into_iter()
        .map(|doc| from_document::<Pharmacy>(doc).map_err(AppError::from))
        .collect()
}

async fn load_by_id(store: &dyn DocumentStore, id: &str) -> AppResult<Pharmacy> {
    let doc = store.find_by_id(PHARMACIES, id).await?.ok_or_else(not_found)?;
    Ok(from_document(doc)?)
}

async fn load_by_name(store: &dyn DocumentStore, name: &str) -> AppResult<Pharmacy> {
    let doc = store
        .find_one_by_field(PHARMACIES, "name", name)
        .await?
        .ok_or_else(not_found)?;
    Ok(from_document(doc)?)
}

/// Keys a write to pharmacy `id` can make stale, given the names it had
/// before and after the write
pub(crate) fn affected_keys(id: &str, names: &[&str]) -> Vec<String> {
    let mut affected = vec![keys::all_pharmacies(), keys::pharmacy(id)];
    for name in names {
        let key = keys::pharmacy_by_name(name);
        if !affected.contains(&key) {
            affected.push(key);
        }
    }
    affected
}

/// Evict after a successful update and return the new snapshot
async fn finish_update(state: &AppState, updated: Updated) -> AppResult<Pharmacy> {
    let previous: Pharmacy = from_document(updated.previous)?;
    let current: Pharmacy = from_document(updated.current)?;

    state
        .read_guard
        .invalidate(&affected_keys(
            &current.id,
            &[previous.name.as_str(), current.name.as_str()],
        ))
        .await;

    info!(pharmacy_id = %current.id, "Pharmacy updated");
    Ok(current)
}

async fn finish_delete(state: &AppState, removed: Pharmacy) -> Json<MessageResponse> {
    state
        .read_guard
        .invalidate(&affected_keys(&removed.id, &[removed.name.as_str()]))
        .await;

    info!(pharmacy_id = %removed.id, "Pharmacy deleted");
    Json(MessageResponse::new("Pharmacy deleted"))
}

#[instrument(skip_all)]
pub async fn create_pharmacy(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<PharmacyInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Pharmacy>)> {
    let Json(input) = payload?;
    input.validate_create()?;

    let doc = state.store.insert(PHARMACIES, to_document(&input)?).await?;
    let pharmacy: Pharmacy = from_document(doc)?;

    // The listing is stale now
    state
        .read_guard
        .invalidate(&affected_keys(&pharmacy.id, &[pharmacy.name.as_str()]))
        .await;

    info!(pharmacy_id = %pharmacy.id, "Pharmacy created");
    Ok((StatusCode::CREATED, Json(pharmacy)))
}

pub async fn list_pharmacies(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<Pharmacy>>> {
    let store = state.store.as_ref();
    let pharmacies = state
        .read_guard
        .guard(&keys::all_pharmacies(), move || load_all(store))
        .await?;

    Ok(Json(pharmacies))
}

pub async fn get_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<Pharmacy>> {
    let store = state.store.as_ref();
    let pharmacy = state
        .read_guard
        .guard(&keys::pharmacy(&id), || load_by_id(store, &id))
        .await?;

    Ok(Json(pharmacy))
}

pub async fn get_pharmacy_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Pharmacy>> {
    let store = state.store.as_ref();
    let pharmacy = state
        .read_guard
        .guard(&keys::pharmacy_by_name(&name), || load_by_name(store, &name))
        .await?;

    Ok(Json(pharmacy))
}

#[instrument(skip(state, payload))]
pub async fn update_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<PharmacyInput>, JsonRejection>,
) -> AppResult<Json<Pharmacy>> {
    let Json(input) = payload?;
    input.validate_update()?;

    let updated = state
        .store
        .update_by_id(PHARMACIES, &id, to_document(&input)?)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(finish_update(&state, updated).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_pharmacy_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<PharmacyInput>, JsonRejection>,
) -> AppResult<Json<Pharmacy>> {
    let Json(input) = payload?;
    input.validate_update()?;

    let updated = state
        .store
        .update_one_by_field(PHARMACIES, "name", &name, to_document(&input)?)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(finish_update(&state, updated).await?))
}

#[instrument(skip(state))]
pub async fn delete_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let doc = state
        .store
        .delete_by_id(PHARMACIES, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(finish_delete(&state, from_document(doc)?).await)
}

#[instrument(skip(state))]
pub async fn delete_pharmacy_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let doc = state
        .store
        .delete_one_by_field(PHARMACIES, "name", &name)
        .await?
        .ok_or_else(not_found)?;

    Ok(finish_delete(&state, from_document(doc)?).await)
}
