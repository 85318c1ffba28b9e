use axum::{
    extract::{Path, Query, State},
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post, put},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::info;

use cvde_catalog::{validate_price_update, ExamCatalogItem, ExamDetailsUpdate, NewExam};
use cvde_collection::{
    build_driver_request_message, build_reminder_message, track_collection, validate_driver_phone,
    whatsapp_link, CollectionError, CollectionTracking,
};
use cvde_core::faq::{FaqEntry, NewFaqEntry};
use cvde_core::repository::{OrderScope, DRIVER_PHONE_SETTING};
use cvde_order::export::build_history_csv;
use cvde_order::history::{apply_filters, build_history_rows, summarize};
use cvde_order::{ExamOrder, HistoryFilter, HistoryRange, HistoryRow, HistorySummary, OrderEdit};

use crate::error::AppError;
use crate::middleware::admin_auth_middleware;
use crate::state::AppState;

// ============================================================================
// Request/Response Types
// ============================================================================

/// An order as the admin panel sees it, with the derived collection tracking
/// computed at response time.
#[derive(Debug, Serialize)]
struct AdminOrderResponse {
    #[serde(flatten)]
    order: ExamOrder,
    collection: CollectionTracking,
}

fn admin_order(order: ExamOrder, now: DateTime<Utc>) -> AdminOrderResponse {
    let collection = track_collection(&order, now);
    AdminOrderResponse { order, collection }
}

#[derive(Debug, Serialize)]
struct DriverRequestResponse {
    order: AdminOrderResponse,
    whatsapp_link: String,
}

#[derive(Debug, Serialize)]
struct ReminderResponse {
    whatsapp_link: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateExamRequest {
    name: String,
    description: Option<String>,
    category: Option<String>,
    price: Option<f64>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdateExamRequest {
    name: String,
    description: Option<String>,
    category: Option<String>,
    active: Option<bool>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct UpdatePriceRequest {
    price: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct SetActiveRequest {
    active: bool,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CreateFaqRequest {
    question: String,
    answer: String,
    category: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DriverPhoneRequest {
    driver_phone: String,
}

#[derive(Debug, Serialize)]
struct DriverPhoneResponse {
    driver_phone: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryQuery {
    range: Option<String>,
    vet: Option<String>,
    clinic: Option<String>,
    exam: Option<String>,
}

#[derive(Debug, Serialize)]
struct HistoryResponse {
    range: String,
    rows: Vec<HistoryRow>,
    summary: HistorySummary,
}

pub fn routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/v1/admin/orders", get(list_orders))
        .route("/v1/admin/orders/{id}", get(get_order).put(update_order))
        .route(
            "/v1/admin/orders/{id}/driver-request",
            post(request_driver_collection),
        )
        .route(
            "/v1/admin/orders/{id}/driver-reminder",
            get(driver_reminder_link),
        )
        .route(
            "/v1/admin/orders/{id}/sample-received",
            post(mark_sample_received),
        )
        .route("/v1/admin/exams", get(list_exams).post(create_exam))
        .route("/v1/admin/exams/{id}", put(update_exam))
        .route("/v1/admin/exams/{id}/price", put(update_exam_price))
        .route("/v1/admin/exams/{id}/active", put(set_exam_active))
        .route("/v1/admin/faq", get(list_faq).post(create_faq))
        .route("/v1/admin/faq/{id}/active", put(set_faq_active))
        .route(
            "/v1/admin/settings/driver-phone",
            get(get_driver_phone).put(put_driver_phone),
        )
        .route("/v1/admin/history", get(exam_history))
        .route("/v1/admin/history/export", get(export_history))
        .route_layer(axum::middleware::from_fn_with_state(
            state,
            admin_auth_middleware,
        ))
}

// ============================================================================
// Orders
// ============================================================================

/// GET /v1/admin/orders
async fn list_orders(
    State(state): State<AppState>,
) -> Result<Json<Vec<AdminOrderResponse>>, AppError> {
    let orders = state
        .orders
        .list_orders(OrderScope::All)
        .await
        .map_err(AppError::from_repo)?;

    let now = Utc::now();
    let responses = orders
        .into_iter()
        .map(|order| admin_order(order, now))
        .collect();
    Ok(Json(responses))
}

/// GET /v1/admin/orders/{id}
async fn get_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AdminOrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(id)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(admin_order(order, Utc::now())))
}

/// PUT /v1/admin/orders/{id}
///
/// Saves the full mutable set in one call: status, scheduling, notes and the
/// collection fields. The edit carries the version the admin last read; a
/// stale version is rejected as a conflict.
async fn update_order(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(edit): Json<OrderEdit>,
) -> Result<Json<AdminOrderResponse>, AppError> {
    let order = state
        .orders
        .update_order(id, edit.normalized())
        .await
        .map_err(AppError::from_repo)?;

    info!("Order {} updated to status {}", id, order.status.as_str());

    Ok(Json(admin_order(order, Utc::now())))
}

/// Resolves the configured driver phone or explains why the collection
/// buttons are unavailable.
async fn driver_phone(state: &AppState) -> Result<String, AppError> {
    let stored = state
        .settings
        .get(DRIVER_PHONE_SETTING)
        .await
        .map_err(AppError::from_repo)?;

    let phone = stored.ok_or_else(|| {
        AppError::ConflictError(CollectionError::MissingDriverPhone.to_string())
    })?;

    validate_driver_phone(&phone).map_err(|e| AppError::ConflictError(e.to_string()))
}

/// POST /v1/admin/orders/{id}/driver-request
///
/// Stamps the driver request time and returns the WhatsApp deep link with the
/// collection message. The one-hour countdown starts at this stamp.
async fn request_driver_collection(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<DriverRequestResponse>, AppError> {
    let order = state
        .orders
        .get_order(id)
        .await
        .map_err(AppError::from_repo)?;

    if !order.request_collection {
        return Err(AppError::ValidationError(
            CollectionError::NoCollectionRequested.to_string(),
        ));
    }

    let phone = driver_phone(&state).await?;

    let mut edit = OrderEdit::from_order(&order);
    edit.set_driver_requested(true, Utc::now());
    let updated = state
        .orders
        .update_order(id, edit)
        .await
        .map_err(AppError::from_repo)?;

    let message = build_driver_request_message(&updated);
    let link = whatsapp_link(&phone, &message);

    info!("Driver collection requested for order {}", id);

    Ok(Json(DriverRequestResponse {
        order: admin_order(updated, Utc::now()),
        whatsapp_link: link,
    }))
}

/// GET /v1/admin/orders/{id}/driver-reminder
///
/// Reminder link for an already-requested collection; never restarts the
/// countdown.
async fn driver_reminder_link(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ReminderResponse>, AppError> {
    let order = state
        .orders
        .get_order(id)
        .await
        .map_err(AppError::from_repo)?;

    if !order.request_collection || !order.driver_collection_requested {
        return Err(AppError::ValidationError(
            CollectionError::NoCollectionRequested.to_string(),
        ));
    }

    let phone = driver_phone(&state).await?;
    let message = build_reminder_message(&order);

    Ok(Json(ReminderResponse {
        whatsapp_link: whatsapp_link(&phone, &message),
    }))
}

/// POST /v1/admin/orders/{id}/sample-received
async fn mark_sample_received(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<AdminOrderResponse>, AppError> {
    let order = state
        .orders
        .get_order(id)
        .await
        .map_err(AppError::from_repo)?;

    let mut edit = OrderEdit::from_order(&order);
    edit.set_sample_received(Utc::now());
    let updated = state
        .orders
        .update_order(id, edit)
        .await
        .map_err(AppError::from_repo)?;

    info!("Sample received recorded for order {}", id);

    Ok(Json(admin_order(updated, Utc::now())))
}

// ============================================================================
// Exam Catalog
// ============================================================================

/// GET /v1/admin/exams
async fn list_exams(
    State(state): State<AppState>,
) -> Result<Json<Vec<ExamCatalogItem>>, AppError> {
    let exams = state
        .catalog
        .list_exams(false)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(exams))
}

/// POST /v1/admin/exams
async fn create_exam(
    State(state): State<AppState>,
    Json(req): Json<CreateExamRequest>,
) -> Result<Json<ExamCatalogItem>, AppError> {
    // A missing price fails validation the same way a non-numeric one does.
    let new_exam = NewExam::from_input(
        &req.name,
        req.description.as_deref(),
        req.category.as_deref(),
        req.price.unwrap_or(f64::NAN),
    )
    .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let exam = state
        .catalog
        .create_exam(new_exam)
        .await
        .map_err(AppError::from_repo)?;

    info!("Exam '{}' added to the catalog", exam.name);

    Ok(Json(exam))
}

/// PUT /v1/admin/exams/{id}
async fn update_exam(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdateExamRequest>,
) -> Result<Json<ExamCatalogItem>, AppError> {
    let update = ExamDetailsUpdate::from_input(
        &req.name,
        req.description.as_deref(),
        req.category.as_deref(),
        req.active.unwrap_or(true),
    )
    .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let exam = state
        .catalog
        .update_exam(id, update)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(exam))
}

/// PUT /v1/admin/exams/{id}/price
async fn update_exam_price(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<UpdatePriceRequest>,
) -> Result<Json<ExamCatalogItem>, AppError> {
    let price_cents = validate_price_update(req.price.unwrap_or(f64::NAN))
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let exam = state
        .catalog
        .update_exam_price(id, price_cents)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(exam))
}

/// PUT /v1/admin/exams/{id}/active
async fn set_exam_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<ExamCatalogItem>, AppError> {
    let exam = state
        .catalog
        .set_exam_active(id, req.active)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(exam))
}

// ============================================================================
// FAQ
// ============================================================================

/// GET /v1/admin/faq
async fn list_faq(State(state): State<AppState>) -> Result<Json<Vec<FaqEntry>>, AppError> {
    let entries = state
        .faq
        .list_faq(false)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(entries))
}

/// POST /v1/admin/faq
async fn create_faq(
    State(state): State<AppState>,
    Json(req): Json<CreateFaqRequest>,
) -> Result<Json<FaqEntry>, AppError> {
    let entry = NewFaqEntry::from_input(&req.question, &req.answer, req.category.as_deref())
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    let created = state
        .faq
        .create_faq(entry)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(created))
}

/// PUT /v1/admin/faq/{id}/active
async fn set_faq_active(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(req): Json<SetActiveRequest>,
) -> Result<Json<FaqEntry>, AppError> {
    let entry = state
        .faq
        .set_faq_active(id, req.active)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(entry))
}

// ============================================================================
// Settings
// ============================================================================

/// GET /v1/admin/settings/driver-phone
async fn get_driver_phone(
    State(state): State<AppState>,
) -> Result<Json<DriverPhoneResponse>, AppError> {
    let driver_phone = state
        .settings
        .get(DRIVER_PHONE_SETTING)
        .await
        .map_err(AppError::from_repo)?;
    Ok(Json(DriverPhoneResponse { driver_phone }))
}

/// PUT /v1/admin/settings/driver-phone
///
/// Normalizes the phone to the international display format before storing.
async fn put_driver_phone(
    State(state): State<AppState>,
    Json(req): Json<DriverPhoneRequest>,
) -> Result<Json<DriverPhoneResponse>, AppError> {
    let formatted = validate_driver_phone(&req.driver_phone)
        .map_err(|e| AppError::ValidationError(e.to_string()))?;

    state
        .settings
        .put(DRIVER_PHONE_SETTING, &formatted)
        .await
        .map_err(AppError::from_repo)?;

    Ok(Json(DriverPhoneResponse {
        driver_phone: Some(formatted),
    }))
}

// ============================================================================
// Exam History
// ============================================================================

fn history_filter(q: HistoryQuery) -> HistoryFilter {
    HistoryFilter {
        // Unknown range codes fall back to the default window.
        range: q
            .range
            .as_deref()
            .and_then(HistoryRange::from_code)
            .unwrap_or_default(),
        vet: q.vet.filter(|v| !v.trim().is_empty()),
        clinic: q.clinic.filter(|c| !c.trim().is_empty()),
        exam: q.exam.filter(|e| !e.trim().is_empty()),
    }
}

/// GET /v1/admin/history
async fn exam_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Json<HistoryResponse>, AppError> {
    let filter = history_filter(q);
    let orders = state
        .orders
        .list_orders(OrderScope::All)
        .await
        .map_err(AppError::from_repo)?;

    let rows = build_history_rows(&orders, filter.range, Utc::now());
    let rows = apply_filters(rows, &filter);
    let summary = summarize(&rows);

    Ok(Json(HistoryResponse {
        range: filter.range.code().to_string(),
        rows,
        summary,
    }))
}

/// GET /v1/admin/history/export
///
/// Streams the filtered history as a CSV attachment.
async fn export_history(
    State(state): State<AppState>,
    Query(q): Query<HistoryQuery>,
) -> Result<Response, AppError> {
    let filter = history_filter(q);
    let orders = state
        .orders
        .list_orders(OrderScope::All)
        .await
        .map_err(AppError::from_repo)?;

    let now = Utc::now();
    let rows = apply_filters(build_history_rows(&orders, filter.range, now), &filter);
    let export = build_history_csv(&rows, &filter, now);

    let headers = [
        (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
        (
            header::CONTENT_DISPOSITION,
            format!("attachment; filename=\"{}\"", export.filename),
        ),
    ];

    Ok((headers, export.content).into_response())
}
