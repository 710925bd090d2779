use std::{net::SocketAddr, sync::Arc};

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Agenda, AgendaError, AttendanceForm, CalendarPeriod, CalendarQuery, Congregation, EnsaioData,
    GridTable, ImportSource, ImportSummary, Instrument, Musician, MusicianFilter, MusicianForm,
    ParseReport, PersistenceError, RehearsalType, Stage, export,
};

#[derive(Clone)]
pub struct AppState {
    agenda: Arc<Agenda>,
}

impl AppState {
    pub fn new(agenda: Agenda) -> Self {
        Self {
            agenda: Arc::new(agenda),
        }
    }

    fn agenda(&self) -> &Agenda {
        &self.agenda
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: String,
}

#[derive(Debug)]
enum ApiError {
    NotFound(String),
    Conflict(String),
    Invalid(String),
    Internal(String),
}

impl ApiError {
    fn invalid(message: impl Into<String>) -> Self {
        ApiError::Invalid(message.into())
    }

    fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }
}

impl From<AgendaError> for ApiError {
    fn from(err: AgendaError) -> Self {
        let message = err.to_string();
        match err {
            AgendaError::NotFound { .. }
            | AgendaError::UnknownCongregation(_)
            | AgendaError::NothingToExport => ApiError::NotFound(message),
            AgendaError::MissingFields(_) | AgendaError::InvalidQuery(_) => {
                ApiError::Invalid(message)
            }
            AgendaError::Persistence(PersistenceError::Duplicate { .. }) => {
                ApiError::Conflict(message)
            }
            AgendaError::Persistence(PersistenceError::InvalidData(_)) => {
                ApiError::Invalid(message)
            }
            AgendaError::Persistence(_) | AgendaError::Io(_) | AgendaError::Csv(_) => {
                ApiError::Internal(message)
            }
            #[cfg(feature = "xlsx")]
            AgendaError::Xlsx(_) => ApiError::Internal(message),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, message) = match self {
            ApiError::NotFound(message) => (StatusCode::NOT_FOUND, "not_found", message),
            ApiError::Conflict(message) => (StatusCode::CONFLICT, "conflict", message),
            ApiError::Invalid(message) => (StatusCode::BAD_REQUEST, "invalid_request", message),
            ApiError::Internal(message) => {
                tracing::error!(%message, "request failed");
                (StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
            }
        };
        (status, Json(ErrorBody { error, message })).into_response()
    }
}

pub fn router(state: AppState) -> Router {
    let router = Router::new()
        .route("/health", get(health))
        .route(
            "/congregations",
            get(list_congregations).post(create_congregation),
        )
        .route(
            "/congregations/:id",
            get(get_congregation)
                .put(update_congregation)
                .delete(delete_congregation),
        )
        .route("/musicians", get(list_musicians).post(register_musician))
        .route("/musicians/by-stage", get(musicians_by_stage))
        .route(
            "/musicians/:id",
            get(get_musician).put(update_musician).delete(delete_musician),
        )
        .route("/imports/text", post(preview_text_import))
        .route("/imports/grid", post(preview_grid_import))
        .route("/imports/confirm", post(confirm_import))
        .route("/ensaios", get(list_ensaios).post(record_attendance))
        .route("/ensaios/:id", get(get_ensaio).delete(delete_ensaio))
        .route("/calendar", get(calendar))
        .route("/calendar/grid", get(calendar_grid))
        .route("/calendar/export.csv", get(export_calendar));
    #[cfg(feature = "xlsx")]
    let router = router.route("/calendar/export.xlsx", get(export_calendar_xlsx));
    router.with_state(state)
}

pub async fn serve(addr: SocketAddr, agenda: Agenda) -> std::io::Result<()> {
    let app = router(AppState::new(agenda));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, "HTTP API listening");
    axum::serve(listener, app).await
}

async fn health() -> impl IntoResponse {
    Json(json!({ "status": "ok" }))
}

// Congregations

async fn list_congregations(
    State(state): State<AppState>,
) -> Result<Json<Vec<Congregation>>, ApiError> {
    Ok(Json(state.agenda().congregations()?))
}

async fn get_congregation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Congregation>, ApiError> {
    Ok(Json(state.agenda().congregation(&id)?))
}

async fn create_congregation(
    State(state): State<AppState>,
    Json(congregation): Json<Congregation>,
) -> Result<(StatusCode, Json<Congregation>), ApiError> {
    let created = state.agenda().add_congregation(congregation)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_congregation(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(congregation): Json<Congregation>,
) -> Result<Json<Congregation>, ApiError> {
    if congregation.id.as_deref().is_some_and(|body_id| body_id != id) {
        return Err(ApiError::invalid(
            "congregation id in payload does not match path parameter",
        ));
    }
    Ok(Json(state.agenda().replace_congregation(&id, congregation)?))
}

async fn delete_congregation(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.agenda().remove_congregation(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Musicians

#[derive(Debug, Default, Deserialize)]
struct MusicianParams {
    instrument: Option<String>,
    stage: Option<String>,
    congregation_id: Option<String>,
    search: Option<String>,
}

impl MusicianParams {
    fn into_filter(self) -> Result<MusicianFilter, ApiError> {
        let instrument = non_blank(self.instrument)
            .map(|value| {
                Instrument::from_label(&value)
                    .ok_or_else(|| ApiError::invalid(format!("unknown instrument '{value}'")))
            })
            .transpose()?;
        let stage = non_blank(self.stage)
            .map(|value| {
                Stage::from_label(&value)
                    .ok_or_else(|| ApiError::invalid(format!("unknown stage '{value}'")))
            })
            .transpose()?;
        Ok(MusicianFilter {
            instrument,
            stage,
            congregation_id: non_blank(self.congregation_id),
            search: non_blank(self.search),
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty() && v != "all")
}

async fn list_musicians(
    State(state): State<AppState>,
    Query(params): Query<MusicianParams>,
) -> Result<Json<Vec<Musician>>, ApiError> {
    let filter = params.into_filter()?;
    Ok(Json(state.agenda().musicians(&filter)?))
}

#[derive(Debug, Serialize)]
struct StageGroup {
    stage: Stage,
    musicians: Vec<Musician>,
}

async fn musicians_by_stage(
    State(state): State<AppState>,
    Query(params): Query<MusicianParams>,
) -> Result<Json<Vec<StageGroup>>, ApiError> {
    let filter = params.into_filter()?;
    let groups = state
        .agenda()
        .musicians_by_stage(&filter)?
        .into_iter()
        .map(|(stage, musicians)| StageGroup { stage, musicians })
        .collect();
    Ok(Json(groups))
}

async fn get_musician(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Musician>, ApiError> {
    match state.agenda().musician(&id)? {
        Some(musician) => Ok(Json(musician)),
        None => Err(ApiError::not_found(format!("musician {id} not found"))),
    }
}

async fn register_musician(
    State(state): State<AppState>,
    Json(form): Json<MusicianForm>,
) -> Result<(StatusCode, Json<Musician>), ApiError> {
    let created = state.agenda().register_musician(form)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn update_musician(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(musician): Json<Musician>,
) -> Result<Json<Musician>, ApiError> {
    if musician.id.as_deref().is_some_and(|body_id| body_id != id) {
        return Err(ApiError::invalid(
            "musician id in payload does not match path parameter",
        ));
    }
    Ok(Json(state.agenda().replace_musician(&id, musician)?))
}

async fn delete_musician(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.agenda().remove_musician(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Imports

#[derive(Debug, Deserialize)]
struct TextImportPayload {
    text: String,
}

#[derive(Debug, Deserialize)]
struct GridImportPayload {
    rows: Vec<Vec<String>>,
}

async fn preview_text_import(
    State(state): State<AppState>,
    Json(payload): Json<TextImportPayload>,
) -> Result<Json<ParseReport>, ApiError> {
    let report = state
        .agenda()
        .preview_import(&ImportSource::Text(payload.text))?;
    Ok(Json(report))
}

async fn preview_grid_import(
    State(state): State<AppState>,
    Json(payload): Json<GridImportPayload>,
) -> Result<Json<ParseReport>, ApiError> {
    let report = state
        .agenda()
        .preview_import(&ImportSource::Grid(payload.rows))?;
    Ok(Json(report))
}

async fn confirm_import(
    State(state): State<AppState>,
    Json(records): Json<Vec<Musician>>,
) -> Json<ImportSummary> {
    Json(state.agenda().confirm_import(records))
}

// Attendance

async fn list_ensaios(State(state): State<AppState>) -> Result<Json<Vec<EnsaioData>>, ApiError> {
    Ok(Json(state.agenda().attendance()?))
}

async fn get_ensaio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<EnsaioData>, ApiError> {
    match state.agenda().attendance_record(&id)? {
        Some(record) => Ok(Json(record)),
        None => Err(ApiError::not_found(format!("ensaio {id} not found"))),
    }
}

async fn record_attendance(
    State(state): State<AppState>,
    Json(form): Json<AttendanceForm>,
) -> Result<(StatusCode, Json<EnsaioData>), ApiError> {
    let created = state.agenda().record_attendance(form)?;
    Ok((StatusCode::CREATED, Json(created)))
}

async fn delete_ensaio(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    state.agenda().remove_attendance(&id)?;
    Ok(StatusCode::NO_CONTENT)
}

// Calendar

#[derive(Debug, Default, Deserialize)]
struct CalendarParams {
    year: Option<i32>,
    period: Option<String>,
    congregation_id: Option<String>,
    city: Option<String>,
    #[serde(rename = "type")]
    rehearsal_type: Option<String>,
    /// Overrides the server date; mostly useful for reproducible requests.
    today: Option<NaiveDate>,
}

impl CalendarParams {
    fn into_query(self) -> Result<(CalendarQuery, NaiveDate), ApiError> {
        let today = self
            .today
            .unwrap_or_else(|| chrono::Local::now().date_naive());
        let period = match self.period.as_deref() {
            Some(value) => CalendarPeriod::parse(value)
                .ok_or_else(|| ApiError::invalid(format!("unknown period '{value}'")))?,
            None => CalendarPeriod::default(),
        };
        let rehearsal_type = non_blank(self.rehearsal_type)
            .map(|value| {
                RehearsalType::from_str(&value)
                    .ok_or_else(|| ApiError::invalid(format!("unknown rehearsal type '{value}'")))
            })
            .transpose()?;
        let query = CalendarQuery {
            year: self.year.unwrap_or_else(|| today.year()),
            period,
            congregation_id: non_blank(self.congregation_id),
            city: non_blank(self.city),
            rehearsal_type,
        };
        Ok((query, today))
    }
}

async fn calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<EnsaioData>>, ApiError> {
    let (query, today) = params.into_query()?;
    Ok(Json(state.agenda().calendar(&query, today)?))
}

async fn calendar_grid(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Json<Vec<GridTable>>, ApiError> {
    let (query, today) = params.into_query()?;
    Ok(Json(state.agenda().calendar_grid(&query, today)?))
}

fn attachment(body: Vec<u8>, content_type: &'static str, file_name: String) -> Response {
    let disposition = format!("attachment; filename=\"{file_name}\"");
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        body,
    )
        .into_response()
}

async fn export_calendar(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Response, ApiError> {
    let (query, today) = params.into_query()?;
    let mut body = Vec::new();
    state.agenda().export_calendar_csv(&query, today, &mut body)?;
    let file_name = export::export_file_name(query.year, query.period, "csv");
    Ok(attachment(body, "text/csv; charset=utf-8", file_name))
}

#[cfg(feature = "xlsx")]
async fn export_calendar_xlsx(
    State(state): State<AppState>,
    Query(params): Query<CalendarParams>,
) -> Result<Response, ApiError> {
    let (query, today) = params.into_query()?;
    let mut body = Vec::new();
    state.agenda().export_calendar_xlsx(&query, today, &mut body)?;
    let file_name = export::export_file_name(query.year, query.period, "xlsx");
    Ok(attachment(
        body,
        "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet",
        file_name,
    ))
}
