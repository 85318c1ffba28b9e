use axum::{
    extract::{Extension, State},
    routing::{get, put},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use cvde_catalog::ExamCatalogItem;
use cvde_core::faq::FaqEntry;
use cvde_core::profile::{validate_profile_name, Profile, RegistrationForm};
use cvde_core::repository::OrderScope;
use cvde_order::{build_selection, ExamOrder, OrderDraft, OrderValidationError, VetSnapshot};

use crate::error::AppError;
use crate::middleware::{vet_auth_middleware, PortalClaims};
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ProfileResponse {
    profile: Profile,
    registration_complete: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateNameRequest {
    full_name: String,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/vet/profile", get(get_profile))
        .route("/v1/vet/profile/name", put(update_profile_name))
        .route("/v1/vet/registration", put(complete_registration))
        .route("/v1/vet/exams", get(list_exams))
        .route("/v1/vet/orders", get(list_my_orders).post(create_order))
        .route("/v1/vet/faq", get(list_faq))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            vet_auth_middleware,
        ))
}

// ============================================================================
// Profile & Registration
// ============================================================================

/// GET /v1/vet/profile
async fn get_profile(
    State(state): State<AppState>,
    Extension(claims): Extension<PortalClaims>,
) -> Result<Json<ProfileResponse>, AppError> {
    let profile = state
        .profiles
        .get_profile(claims.sub)
        .await
        .map_err(AppError::from_repo)?;

    let registration_complete = profile.is_registration_complete();
    Ok(Json(ProfileResponse {
        profile,
        registration_complete,
    }))
}

/// PUT /v1/vet/registration
///
/// Validates the registration gate form and persists it. Until this succeeds
/// the vet cannot send exam orders.
async fn complete_registration(
    State(state): State<AppState>,
    Extension(claims): Extension<PortalClaims>,
    Json(form): Json<RegistrationForm>,
) -> Result<Json<ProfileResponse>, AppError> {
    let details = form
        .validate()
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let profile = state
        .profiles
        .complete_registration(claims.sub, details)
        .await
        .map_err(AppError::from_repo)?;

    info!("Vet {} completed registration", profile.id);

    let registration_complete = profile.is_registration_complete();
    Ok(Json(ProfileResponse {
        profile,
        registration_complete,
    }))
}

/// PUT /v1/vet/profile/name
async fn update_profile_name(
    State(state): State<AppState>,
    Extension(claims): Extension<PortalClaims>,
    Json(req): Json<UpdateNameRequest>,
) -> Result<Json<ProfileResponse>, AppError> {
    let full_name =
        validate_profile_name(&req.full_name).map_err(|e| AppError::ValidationError(e.to_string()))?;

    let profile = state
        .profiles
        .update_full_name(claims.sub, &full_name)
        .await
        .map_err(AppError::from_repo)?;

    let registration_complete = profile.is_registration_complete();
    Ok(Json(ProfileResponse {
        profile,
        registration_complete,
    }))
}

// ============================================================================
// Price Table & FAQ
// ============================================================================

/// GET /v1/vet/exams
///
/// The active catalog only; retired exams stay orderable nowhere.
async fn list_exams(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamCatalogItem>>, AppError> {
    let exams = state
        .catalog
        .list_exams(true)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(exams))
}

/// GET /v1/vet/faq
async fn list_faq(State(state): State<AppState>) -> Result<Json<Vec<FaqEntry>>, AppError> {
    let entries = state
        .faq
        .list_faq(true)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(entries))
}

// ============================================================================
// Orders
// ============================================================================

/// GET /v1/vet/orders
async fn list_my_orders(
    State(state): State<AppState>,
    Extension(claims): Extension<PortalClaims>,
) -> Result<Json<Vec<ExamOrder>>, AppError> {
    let orders = state
        .orders
        .list_orders(OrderScope::Vet(claims.sub))
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(orders))
}

/// POST /v1/vet/orders
///
/// Prices the selection server-side from the active catalog, validates the
/// draft and inserts the order as `requested`.
async fn create_order(
    State(state): State<AppState>,
    Extension(claims): Extension<PortalClaims>,
    Json(draft): Json<OrderDraft>,
) -> Result<Json<ExamOrder>, AppError> {
    // 1. The registration gate applies to ordering, not just the dashboard
    let profile = state
        .profiles
        .get_profile(claims.sub)
        .await
        .map_err(AppError::from_repo)?;
    if !profile.is_registration_complete() {
        return Err(AppError::ValidationError(
            OrderValidationError::RegistrationIncomplete.to_string(),
        ));
    }

    // 2. Price the selection against the active catalog
    let exams = state
        .catalog
        .list_exams(true)
        .await
        .map_err(AppError::from_repo)?;
    let selection = build_selection(&exams, &draft.selected_exam_ids)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    // 3. Validate the draft and assemble the order with the vet's snapshot
    let vet = VetSnapshot {
        vet_id: profile.id,
        name: profile.full_name.clone(),
        email: profile.email.clone(),
        crmv: profile.crmv.clone(),
        affiliation: profile.affiliation.clone(),
    };
    let new_order = draft
        .into_new_order(vet, selection)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let order = state
        .orders
        .create_order(new_order)
        .await
        .map_err(AppError::from_repo)?;

    info!("Exam order {} created by vet {}", order.id, order.vet_id);

    Ok(Json(order))
}
