//! # API REST
//!
//! REST API for the clinic record forms.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON bodies, status codes, CORS, the optional API key)
//!
//! All form behaviour lives in `clinic-core`; handlers translate between JSON and
//! [`FormService`] calls.

#![warn(rust_2018_idioms)]

use axum::{
    extract::{Path, Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Json, Response},
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use api_shared::{validate_api_key, HealthRes, HealthService, API_KEY_HEADER};
use clinic_core::{
    ClinicError, DayOfWeek, DaySlot, EntityKind, EntityRecord, FieldDefinition, FormInput,
    FormService, PersistenceError, RecordStore, SaveError, ScheduleDecode, ScheduleDraft,
    ScheduleRow, SessionError, Step, StoreError, ToggleError, ToggleOutcome, ValidationError,
    VisibilityConfig,
};

/// Shared state for every handler.
pub struct AppState<S> {
    pub service: Arc<FormService<S>>,
    /// When set, every route except `/health` requires a matching `x-api-key` header.
    pub api_key: Option<Arc<str>>,
}

impl<S> AppState<S> {
    pub fn new(service: Arc<FormService<S>>, api_key: Option<String>) -> Self {
        Self {
            service,
            api_key: api_key.map(Arc::from),
        }
    }
}

impl<S> Clone for AppState<S> {
    fn clone(&self) -> Self {
        Self {
            service: self.service.clone(),
            api_key: self.api_key.clone(),
        }
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health,
        list_fields,
        list_steps,
        get_visibility,
        toggle_visibility,
        list_records,
        get_record,
        create_record,
        update_record,
        get_schedule,
        encode_schedule,
        decode_schedule,
    ),
    components(schemas(
        HealthRes,
        FieldRes,
        StepRes,
        VisibilityRes,
        ToggleRes,
        RecordRes,
        ListRecordsRes,
        SaveRecordReq,
        SaveRecordRes,
        DaySlotReq,
        DayRes,
        ScheduleRowRes,
        EncodeScheduleReq,
        EncodeScheduleRes,
        DecodeScheduleReq,
        ScheduleRes,
        ErrorRes,
    ))
)]
pub struct ApiDoc;

/// Builds the full application router, Swagger UI included.
pub fn router<S: RecordStore + 'static>(state: AppState<S>) -> Router {
    let api = Router::new()
        .route("/forms/:kind/fields", get(list_fields::<S>))
        .route("/forms/:kind/steps", get(list_steps::<S>))
        .route("/forms/:kind/visibility", get(get_visibility::<S>))
        .route(
            "/forms/:kind/visibility/:field_id/toggle",
            post(toggle_visibility::<S>),
        )
        .route(
            "/records/:kind",
            get(list_records::<S>).post(create_record::<S>),
        )
        .route(
            "/records/:kind/:id",
            get(get_record::<S>).put(update_record::<S>),
        )
        .route("/schedules/encode", post(encode_schedule::<S>))
        .route("/schedules/decode", post(decode_schedule::<S>))
        .route("/schedules/:owner_id", get(get_schedule::<S>))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key::<S>,
        ));

    Router::new()
        .route("/health", get(health))
        .merge(api)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

async fn require_api_key<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    request: Request,
    next: Next,
) -> Response {
    let Some(expected) = state.api_key.as_deref() else {
        return next.run(request).await;
    };

    let provided = request
        .headers()
        .get(API_KEY_HEADER)
        .and_then(|value| value.to_str().ok());
    match validate_api_key(provided, expected) {
        Ok(()) => next.run(request).await,
        Err(err) => {
            tracing::info!("rejected request to {}: {}", request.uri().path(), err);
            ApiError::new(StatusCode::UNAUTHORIZED, "unauthorised", err.to_string()).into_response()
        }
    }
}

// ---------------------------------------------------------------------------
// Request and response bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FieldRes {
    pub id: String,
    pub label: String,
    /// One of text, number, date, time, select, textarea, email, tel.
    #[serde(rename = "type")]
    pub field_type: String,
    pub category: String,
    pub mandatory: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<String>>,
}

impl From<&FieldDefinition> for FieldRes {
    fn from(field: &FieldDefinition) -> Self {
        Self {
            id: field.id.into(),
            label: field.label.into(),
            field_type: field.kind.type_name().into(),
            category: field.category.into(),
            mandatory: field.mandatory,
            options: field
                .kind
                .options()
                .map(|options| options.iter().map(|o| o.to_string()).collect()),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StepRes {
    pub index: usize,
    pub title: String,
    pub category: String,
    pub fields: Vec<FieldRes>,
    /// Whether the weekly schedule editor belongs to this step.
    pub schedule: bool,
}

impl From<&Step> for StepRes {
    fn from(step: &Step) -> Self {
        Self {
            index: step.index,
            title: step.title.into(),
            category: step.category.into(),
            fields: step.fields.iter().map(FieldRes::from).collect(),
            schedule: step.schedule,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct VisibilityRes {
    pub kind: String,
    pub fields: BTreeMap<String, bool>,
}

impl VisibilityRes {
    fn new(kind: EntityKind, config: &VisibilityConfig) -> Self {
        Self {
            kind: kind.to_string(),
            fields: config
                .iter()
                .map(|(id, enabled)| (id.to_string(), enabled))
                .collect(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ToggleRes {
    pub field_id: String,
    pub enabled: bool,
    pub visibility: VisibilityRes,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RecordRes {
    pub id: String,
    pub kind: String,
    pub fields: BTreeMap<String, Option<String>>,
    pub created_at: String,
    pub updated_at: String,
}

impl From<&EntityRecord> for RecordRes {
    fn from(record: &EntityRecord) -> Self {
        Self {
            id: record.id.clone(),
            kind: record.kind.to_string(),
            fields: record.fields.clone(),
            created_at: record.created_at.to_rfc3339(),
            updated_at: record.updated_at.to_rfc3339(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListRecordsRes {
    pub records: Vec<RecordRes>,
}

#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct DaySlotReq {
    #[serde(default)]
    pub start: String,
    #[serde(default)]
    pub end: String,
}

/// Field values to write, and for doctors the weekly schedule keyed by day name.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct SaveRecordReq {
    #[serde(default)]
    pub fields: BTreeMap<String, Option<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule: Option<BTreeMap<String, DaySlotReq>>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRowRes {
    pub owner_id: String,
    pub day_index: i32,
    pub start_time: String,
    pub end_time: String,
    pub slot_type: String,
}

impl From<&ScheduleRow> for ScheduleRowRes {
    fn from(row: &ScheduleRow) -> Self {
        Self {
            owner_id: row.owner_id.clone(),
            day_index: row.day_index,
            start_time: row.start_time.clone(),
            end_time: row.end_time.clone(),
            slot_type: row.slot_type.clone(),
        }
    }
}

impl From<ScheduleRowRes> for ScheduleRow {
    fn from(row: ScheduleRowRes) -> Self {
        Self {
            owner_id: row.owner_id,
            day_index: row.day_index,
            start_time: row.start_time,
            end_time: row.end_time,
            slot_type: row.slot_type,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct SaveRecordRes {
    pub record: RecordRes,
    pub schedule_rows: Vec<ScheduleRowRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DayRes {
    pub day: String,
    pub index: i32,
    pub start: String,
    pub end: String,
    /// complete, off or half-filled.
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ScheduleRes {
    pub owner_id: String,
    /// Monday first.
    pub days: Vec<DayRes>,
    /// Stored rows whose day index names no day; they were skipped.
    pub unrecognised: Vec<ScheduleRowRes>,
}

impl ScheduleRes {
    fn new(owner_id: &str, decoded: &ScheduleDecode) -> Self {
        let days = decoded
            .draft
            .iter()
            .map(|(day, slot)| DayRes {
                day: day.name().into(),
                index: day.index(),
                start: slot.start.clone(),
                end: slot.end.clone(),
                status: day_status_name(decoded.draft.status(day)).into(),
            })
            .collect();
        Self {
            owner_id: owner_id.into(),
            days,
            unrecognised: decoded.unrecognised.iter().map(ScheduleRowRes::from).collect(),
        }
    }
}

fn day_status_name(status: clinic_core::DayStatus) -> &'static str {
    match status {
        clinic_core::DayStatus::Complete => "complete",
        clinic_core::DayStatus::Off => "off",
        clinic_core::DayStatus::HalfFilled => "half-filled",
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EncodeScheduleReq {
    pub owner_id: String,
    pub schedule: BTreeMap<String, DaySlotReq>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct EncodeScheduleRes {
    pub rows: Vec<ScheduleRowRes>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct DecodeScheduleReq {
    pub owner_id: String,
    pub rows: Vec<ScheduleRowRes>,
}

/// Body of every error response.
#[derive(Debug, Default, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Stable machine-readable code, e.g. `validation`, `mandatory-locked`, `partial-save`.
    pub error: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub step: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub day: Option<String>,
    /// For partial saves: the record that was written.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub record: Option<RecordRes>,
    /// For partial saves: whether the record's previous schedule rows are gone.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schedule_cleared: Option<bool>,
}

fn parse_schedule(days: BTreeMap<String, DaySlotReq>) -> Result<ScheduleDraft, ApiError> {
    let mut draft = ScheduleDraft::new();
    for (name, slot) in days {
        let day: DayOfWeek = name
            .parse()
            .map_err(|message: String| ApiError::new(StatusCode::BAD_REQUEST, "bad-request", message))?;
        draft.set(day, DaySlot::new(slot.start, slot.end));
    }
    Ok(draft)
}

fn parse_kind(kind: &str) -> Result<EntityKind, ApiError> {
    kind.parse().map_err(ApiError::from)
}

// ---------------------------------------------------------------------------
// Error mapping
// ---------------------------------------------------------------------------

/// An error response: status plus [`ErrorRes`] body.
#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorRes,
}

impl ApiError {
    fn new(status: StatusCode, error: &str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorRes {
                error: error.into(),
                message: message.into(),
                ..ErrorRes::default()
            },
        }
    }

    fn validation(step: Option<usize>, error: &ValidationError) -> Self {
        let mut api = Self::new(StatusCode::UNPROCESSABLE_ENTITY, "validation", error.to_string());
        api.body.step = step;
        api.body.field = error.field().map(|field| field.id.to_string());
        api.body.day = error.day().map(|day| day.name().to_string());
        api
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<PersistenceError> for ApiError {
    fn from(err: PersistenceError) -> Self {
        match &err.source {
            StoreError::NotFound { .. } => Self::new(StatusCode::NOT_FOUND, "not-found", err.to_string()),
            StoreError::InvalidId(message) => {
                Self::new(StatusCode::BAD_REQUEST, "bad-request", message.clone())
            }
            _ => {
                tracing::error!("record store error: {}", err);
                Self::new(StatusCode::BAD_GATEWAY, "persistence", err.to_string())
            }
        }
    }
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::Validation { step, error } => Self::validation(Some(step), &error),
            SessionError::UnknownField(_) | SessionError::NoSchedule => {
                Self::new(StatusCode::UNPROCESSABLE_ENTITY, "invalid-field", err.to_string())
            }
            SessionError::NoSteps => Self::new(StatusCode::CONFLICT, "no-steps", err.to_string()),
            other => {
                tracing::error!("unexpected session state: {}", other);
                Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal", other.to_string())
            }
        }
    }
}

impl From<SaveError> for ApiError {
    fn from(err: SaveError) -> Self {
        match err {
            SaveError::Session(err) => err.into(),
            SaveError::Validation { step, error } => Self::validation(Some(step), &error),
            SaveError::Persistence(err) => err.into(),
            SaveError::PartialSave(partial) => {
                tracing::error!("{}", partial);
                let mut api = Self::new(
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "partial-save",
                    partial.to_string(),
                );
                api.body.record = Some(RecordRes::from(partial.record.as_ref()));
                api.body.schedule_cleared = Some(partial.schedule_cleared());
                api
            }
        }
    }
}

impl From<ToggleError> for ApiError {
    fn from(err: ToggleError) -> Self {
        match err {
            ToggleError::UnknownField { .. } => {
                Self::new(StatusCode::NOT_FOUND, "unknown-field", err.to_string())
            }
            ToggleError::Load(err) | ToggleError::Persistence { source: err, .. } => {
                tracing::error!("visibility store error: {}", err);
                Self::new(StatusCode::BAD_GATEWAY, "persistence", err.to_string())
            }
        }
    }
}

impl From<ClinicError> for ApiError {
    fn from(err: ClinicError) -> Self {
        match err {
            ClinicError::UnknownEntityKind(_) => {
                Self::new(StatusCode::NOT_FOUND, "unknown-kind", err.to_string())
            }
            ClinicError::InvalidInput(_) | ClinicError::Text(_) => {
                Self::new(StatusCode::BAD_REQUEST, "bad-request", err.to_string())
            }
            ClinicError::Persistence(err) => err.into(),
            ClinicError::Toggle(err) => err.into(),
            ClinicError::Session(err) => err.into(),
            ClinicError::Save(err) => err.into(),
        }
    }
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Never requires an API key; used by monitoring and load balancers.
pub async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    get,
    path = "/forms/{kind}/fields",
    params(("kind" = String, Path, description = "patient or doctor")),
    responses(
        (status = 200, description = "Active fields in registry order", body = [FieldRes]),
        (status = 404, description = "Unknown entity kind", body = ErrorRes)
    )
)]
/// Fields a new form for `kind` shows right now
pub async fn list_fields<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<FieldRes>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let fields = state.service.active_fields(kind).await;
    Ok(Json(fields.iter().map(FieldRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/forms/{kind}/steps",
    params(("kind" = String, Path, description = "patient or doctor")),
    responses(
        (status = 200, description = "Wizard steps in order", body = [StepRes]),
        (status = 404, description = "Unknown entity kind", body = ErrorRes)
    )
)]
pub async fn list_steps<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
) -> Result<Json<Vec<StepRes>>, ApiError> {
    let kind = parse_kind(&kind)?;
    let steps = state.service.steps(kind).await;
    Ok(Json(steps.iter().map(StepRes::from).collect()))
}

#[utoipa::path(
    get,
    path = "/forms/{kind}/visibility",
    params(("kind" = String, Path, description = "patient or doctor")),
    responses(
        (status = 200, description = "Stored visibility map", body = VisibilityRes),
        (status = 404, description = "Unknown entity kind", body = ErrorRes),
        (status = 502, description = "Record store unavailable", body = ErrorRes)
    )
)]
pub async fn get_visibility<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
) -> Result<Json<VisibilityRes>, ApiError> {
    let kind = parse_kind(&kind)?;
    let config = state.service.visibility(kind).await?;
    Ok(Json(VisibilityRes::new(kind, &config)))
}

#[utoipa::path(
    post,
    path = "/forms/{kind}/visibility/{field_id}/toggle",
    params(
        ("kind" = String, Path, description = "patient or doctor"),
        ("field_id" = String, Path, description = "Field to show or hide")
    ),
    responses(
        (status = 200, description = "Toggle applied and persisted", body = ToggleRes),
        (status = 404, description = "Unknown entity kind or field", body = ErrorRes),
        (status = 409, description = "Mandatory fields cannot be hidden", body = ErrorRes),
        (status = 502, description = "Record store unavailable; nothing changed", body = ErrorRes)
    )
)]
/// Show or hide one optional field on future forms
pub async fn toggle_visibility<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((kind, field_id)): Path<(String, String)>,
) -> Result<Json<ToggleRes>, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.service.toggle_field_visibility(kind, &field_id).await? {
        ToggleOutcome::Applied(config) => Ok(Json(ToggleRes {
            enabled: config.is_enabled(&field_id),
            field_id,
            visibility: VisibilityRes::new(kind, &config),
        })),
        ToggleOutcome::Rejected(lock) => Err(ApiError::new(
            StatusCode::CONFLICT,
            lock.as_str(),
            lock.to_string(),
        )),
    }
}

#[utoipa::path(
    get,
    path = "/records/{kind}",
    params(("kind" = String, Path, description = "patient or doctor")),
    responses(
        (status = 200, description = "Stored records", body = ListRecordsRes),
        (status = 502, description = "Record store unavailable", body = ErrorRes)
    )
)]
pub async fn list_records<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
) -> Result<Json<ListRecordsRes>, ApiError> {
    let kind = parse_kind(&kind)?;
    let records = state.service.list_records(kind).await?;
    Ok(Json(ListRecordsRes {
        records: records.iter().map(RecordRes::from).collect(),
    }))
}

#[utoipa::path(
    get,
    path = "/records/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "patient or doctor"),
        ("id" = String, Path, description = "Record id, 32 lowercase hex characters")
    ),
    responses(
        (status = 200, description = "The record", body = RecordRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No such record", body = ErrorRes),
        (status = 502, description = "Record store unavailable", body = ErrorRes)
    )
)]
pub async fn get_record<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((kind, id)): Path<(String, String)>,
) -> Result<Json<RecordRes>, ApiError> {
    let kind = parse_kind(&kind)?;
    match state.service.get_record(kind, &id).await? {
        Some(record) => Ok(Json(RecordRes::from(&record))),
        None => Err(ApiError::new(
            StatusCode::NOT_FOUND,
            "not-found",
            format!("{kind} record {id} not found"),
        )),
    }
}

async fn submit<S: RecordStore + 'static>(
    state: &AppState<S>,
    kind: &str,
    id: Option<&str>,
    req: SaveRecordReq,
) -> Result<SaveRecordRes, ApiError> {
    let kind = parse_kind(kind)?;
    let schedule = req.schedule.map(parse_schedule).transpose()?;
    let input = FormInput {
        fields: req.fields,
        schedule,
    };

    let saved = state.service.submit(kind, id, input).await?;
    Ok(SaveRecordRes {
        record: RecordRes::from(&saved.record),
        schedule_rows: saved.schedule_rows.iter().map(ScheduleRowRes::from).collect(),
    })
}

#[utoipa::path(
    post,
    path = "/records/{kind}",
    params(("kind" = String, Path, description = "patient or doctor")),
    request_body = SaveRecordReq,
    responses(
        (status = 201, description = "Record and schedule saved", body = SaveRecordRes),
        (status = 422, description = "A step is incomplete or a field is not on the form", body = ErrorRes),
        (status = 502, description = "Record store unavailable; nothing saved", body = ErrorRes),
        (status = 500, description = "Record saved but schedule not updated", body = ErrorRes)
    )
)]
/// Create a record, walking every wizard step in order
pub async fn create_record<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(kind): Path<String>,
    Json(req): Json<SaveRecordReq>,
) -> Result<(StatusCode, Json<SaveRecordRes>), ApiError> {
    let saved = submit(&state, &kind, None, req).await?;
    Ok((StatusCode::CREATED, Json(saved)))
}

#[utoipa::path(
    put,
    path = "/records/{kind}/{id}",
    params(
        ("kind" = String, Path, description = "patient or doctor"),
        ("id" = String, Path, description = "Record id")
    ),
    request_body = SaveRecordReq,
    responses(
        (status = 200, description = "Record and schedule saved", body = SaveRecordRes),
        (status = 404, description = "No such record", body = ErrorRes),
        (status = 422, description = "A step is incomplete or a field is not on the form", body = ErrorRes),
        (status = 502, description = "Record store unavailable; nothing saved", body = ErrorRes),
        (status = 500, description = "Record saved but schedule not updated", body = ErrorRes)
    )
)]
/// Update a record; fields left out of the body keep their stored values
pub async fn update_record<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path((kind, id)): Path<(String, String)>,
    Json(req): Json<SaveRecordReq>,
) -> Result<Json<SaveRecordRes>, ApiError> {
    let saved = submit(&state, &kind, Some(&id), req).await?;
    Ok(Json(saved))
}

#[utoipa::path(
    get,
    path = "/schedules/{owner_id}",
    params(("owner_id" = String, Path, description = "Doctor record id")),
    responses(
        (status = 200, description = "Weekly schedule, Monday first", body = ScheduleRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 502, description = "Record store unavailable", body = ErrorRes)
    )
)]
pub async fn get_schedule<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Path(owner_id): Path<String>,
) -> Result<Json<ScheduleRes>, ApiError> {
    let decoded = state.service.schedule_for(&owner_id).await?;
    Ok(Json(ScheduleRes::new(&owner_id, &decoded)))
}

#[utoipa::path(
    post,
    path = "/schedules/encode",
    request_body = EncodeScheduleReq,
    responses(
        (status = 200, description = "One row per complete day", body = EncodeScheduleRes),
        (status = 400, description = "Unknown day name", body = ErrorRes)
    )
)]
pub async fn encode_schedule<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<EncodeScheduleReq>,
) -> Result<Json<EncodeScheduleRes>, ApiError> {
    let draft = parse_schedule(req.schedule)?;
    let rows = state.service.encode_schedule(&draft, &req.owner_id);
    Ok(Json(EncodeScheduleRes {
        rows: rows.iter().map(ScheduleRowRes::from).collect(),
    }))
}

#[utoipa::path(
    post,
    path = "/schedules/decode",
    request_body = DecodeScheduleReq,
    responses(
        (status = 200, description = "Weekly schedule, Monday first", body = ScheduleRes)
    )
)]
pub async fn decode_schedule<S: RecordStore + 'static>(
    State(state): State<AppState<S>>,
    Json(req): Json<DecodeScheduleReq>,
) -> Json<ScheduleRes> {
    let rows: Vec<ScheduleRow> = req.rows.into_iter().map(ScheduleRow::from).collect();
    let decoded = state.service.decode_schedule(&rows, &req.owner_id);
    Json(ScheduleRes::new(&req.owner_id, &decoded))
}
