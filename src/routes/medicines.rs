//! Medicine endpoints
//!
//! Reads return medicines with their pharmacy reference resolved. Medicine
//! reads are not cached.

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};

use super::root::MessageResponse;
use crate::{
    error::{AppError, AppResult},
    middleware::auth::AuthenticatedPharmacy,
    models::{Medicine, MedicineInput, MedicineView, Pharmacy},
    store::{
        collections::{MEDICINES, PHARMACIES},
        from_document, to_document, Document, DocumentStore,
    },
    AppState,
};

/// Result of a bulk update
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateManyResponse {
    pub matched: u64,
}

fn not_found() -> AppError {
    AppError::NotFound("Medicine not found".to_string())
}

fn decode_all(docs: Vec<Document>) -> AppResult<Vec<Medicine>> {
    docs.into_iter()
        .map(|doc| from_document::<Medicine>(doc).map_err(AppError::from))
        .collect()
}

async fn lookup_pharmacy(store: &dyn DocumentStore, id: &str) -> AppResult<Option<Pharmacy>> {
    Ok(store
        .find_by_id(PHARMACIES, id)
        .await?
        .map(from_document::<Pharmacy>)
        .transpose()?)
}

/// Resolve each medicine's pharmacy, fetching every distinct pharmacy once
async fn populate_all(
    store: &dyn DocumentStore,
    medicines: Vec<Medicine>,
) -> AppResult<Vec<MedicineView>> {
    let mut pharmacies: HashMap<String, Option<Pharmacy>> = HashMap::new();
    let mut views = Vec::with_capacity(medicines.len());

    for medicine in medicines {
        let pharmacy = match pharmacies.get(&medicine.pharmacy) {
            Some(known) => known.clone(),
            None => {
                let fetched = lookup_pharmacy(store, &medicine.pharmacy).await?;
                pharmacies.insert(medicine.pharmacy.clone(), fetched.clone());
                fetched
            }
        };
        views.push(medicine.populate(pharmacy));
    }

    Ok(views)
}

async fn populate_one(store: &dyn DocumentStore, medicine: Medicine) -> AppResult<MedicineView> {
    let pharmacy = lookup_pharmacy(store, &medicine.pharmacy).await?;
    Ok(medicine.populate(pharmacy))
}

/// Create a medicine owned by the authenticated pharmacy
#[instrument(skip_all, fields(pharmacy_id = %auth.pharmacy_id))]
pub async fn create_medicine(
    State(state): State<Arc<AppState>>,
    Extension(auth): Extension<AuthenticatedPharmacy>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> AppResult<(StatusCode, Json<Medicine>)> {
    let Json(mut input) = payload?;
    input.validate_create()?;
    input.pharmacy = Some(auth.pharmacy_id);

    let doc = state.store.insert(MEDICINES, to_document(&input)?).await?;
    let medicine: Medicine = from_document(doc)?;

    info!(medicine_id = %medicine.id, "Medicine created");
    Ok((StatusCode::CREATED, Json(medicine)))
}

pub async fn list_medicines(
    State(state): State<Arc<AppState>>,
) -> AppResult<Json<Vec<MedicineView>>> {
    let medicines = decode_all(state.store.find_all(MEDICINES).await?)?;
    Ok(Json(populate_all(state.store.as_ref(), medicines).await?))
}

pub async fn get_medicine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MedicineView>> {
    let doc = state
        .store
        .find_by_id(MEDICINES, &id)
        .await?
        .ok_or_else(not_found)?;

    Ok(Json(
        populate_one(state.store.as_ref(), from_document(doc)?).await?,
    ))
}

/// Medicines sharing a name; an empty list is a valid answer
pub async fn get_medicines_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<Vec<MedicineView>>> {
    let medicines = decode_all(state.store.find_by_field(MEDICINES, "name", &name).await?)?;
    Ok(Json(populate_all(state.store.as_ref(), medicines).await?))
}

pub async fn get_medicines_by_pharmacy(
    State(state): State<Arc<AppState>>,
    Path(pharmacy_id): Path<String>,
) -> AppResult<Json<Vec<MedicineView>>> {
    let medicines = decode_all(
        state
            .store
            .find_by_field(MEDICINES, "pharmacy", &pharmacy_id)
            .await?,
    )?;

    if medicines.is_empty() {
        return Err(AppError::NotFound(
            "No medicines found for this pharmacy".to_string(),
        ));
    }

    Ok(Json(populate_all(state.store.as_ref(), medicines).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_medicine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> AppResult<Json<MedicineView>> {
    let Json(input) = payload?;
    input.validate_update()?;

    let updated = state
        .store
        .update_by_id(MEDICINES, &id, to_document(&input)?)
        .await?
        .ok_or_else(not_found)?;

    info!("Medicine updated");
    Ok(Json(
        populate_one(state.store.as_ref(), from_document(updated.current)?).await?,
    ))
}

/// Apply the same patch to every medicine with this name
#[instrument(skip(state, payload))]
pub async fn update_medicines_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
    payload: Result<Json<MedicineInput>, JsonRejection>,
) -> AppResult<Json<UpdateManyResponse>> {
    let Json(input) = payload?;
    input.validate_update()?;

    let matched = state
        .store
        .update_many_by_field(MEDICINES, "name", &name, to_document(&input)?)
        .await?;

    if matched == 0 {
        return Err(not_found());
    }

    info!(matched, "Medicines updated");
    Ok(Json(UpdateManyResponse { matched }))
}

#[instrument(skip(state))]
pub async fn delete_medicine(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    state
        .store
        .delete_by_id(MEDICINES, &id)
        .await?
        .ok_or_else(not_found)?;

    info!("Medicine deleted");
    Ok(Json(MessageResponse::new("Medicine deleted")))
}

#[instrument(skip(state))]
pub async fn delete_medicines_by_name(
    State(state): State<Arc<AppState>>,
    Path(name): Path<String>,
) -> AppResult<Json<MessageResponse>> {
    let removed = state
        .store
        .delete_many_by_field(MEDICINES, "name", &name)
        .await?;

    if removed == 0 {
        return Err(AppError::NotFound(
            "No medicines found with this name".to_string(),
        ));
    }

    info!(removed, "Medicines deleted");
    Ok(Json(MessageResponse::new("Medicines deleted")))
}
