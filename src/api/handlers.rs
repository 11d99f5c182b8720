use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Datelike, Duration, TimeZone, Utc};
use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::warn;
use utoipa::OpenApi;
use uuid::Uuid;

use super::{
    dto::{
        CreateNoteRequest, DashboardDto, LastReadingDto, MonthPointDto, MonthlyAverageDto,
        ReportRequest, ReportResponse, SensorDto, TimeRangeDto, YearlySeriesDto,
    },
    errors::AppError,
    AppState,
};
use crate::{
    aggregate::{
        fleet::{count_fleet_health, FleetHealth},
        monthly::aggregate_monthly,
        snapshot::resolve_snapshot,
    },
    config::SensorInfo,
    model::{Metric, Note, Reading, SensorStatus},
    normalize::normalize,
    reports::{Comparative, ComparisonReport, ReportPoint, ReportSummary, SensorReport},
};

// ---------------------------------------------------------------------------
// Query parameters
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub struct YearParams {
    pub year: i32,
}

#[derive(Debug, Deserialize)]
pub struct DashboardParams {
    pub sensor_id: Option<String>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Inclusive bounds of a calendar year in UTC. The end bound sits just
/// before the start of the next year so sub-second readings in the final
/// second of December 31st are still covered.
fn year_bounds(year: i32) -> Result<(DateTime<Utc>, DateTime<Utc>), AppError> {
    let start = Utc.with_ymd_and_hms(year, 1, 1, 0, 0, 0).single();
    let next_year = Utc.with_ymd_and_hms(year + 1, 1, 1, 0, 0, 0).single();
    match (start, next_year) {
        (Some(start), Some(next_year)) => Ok((start, next_year - Duration::nanoseconds(1))),
        _ => Err(AppError::InvalidRequest(format!("invalid year: {year}"))),
    }
}

/// Fetch one sensor's latest reading and classify it.
///
/// A store failure degrades to an inactive placeholder rather than an error:
/// one unreachable sensor must not take down a fleet view.
async fn sensor_snapshot_dto(state: AppState, info: SensorInfo) -> SensorDto {
    match state.store.query_latest(&info.id).await {
        Ok(latest) => {
            let readings: Vec<Reading> = latest.iter().map(normalize).collect();
            let snapshot =
                resolve_snapshot(&info.id, &readings, Utc::now(), state.liveness_window);
            SensorDto::from_snapshot(&info, &snapshot)
        }
        Err(e) => {
            warn!(sensor_id = %info.id, error = %e, "Sensor fetch failed; reporting as inactive");
            SensorDto::unavailable(&info)
        }
    }
}

/// Resolve snapshots for many sensors concurrently, preserving input order.
/// Latency is bounded by the slowest single fetch, not the sum.
async fn snapshots_for(state: &AppState, sensors: Vec<SensorInfo>) -> Vec<SensorDto> {
    let mut tasks = JoinSet::new();
    for (index, info) in sensors.iter().cloned().enumerate() {
        let state = state.clone();
        tasks.spawn(async move { (index, sensor_snapshot_dto(state, info).await) });
    }

    let mut slots: Vec<Option<SensorDto>> = sensors.iter().map(|_| None).collect();
    while let Some(joined) = tasks.join_next().await {
        match joined {
            Ok((index, dto)) => slots[index] = Some(dto),
            Err(e) => warn!(error = %e, "Snapshot task failed"),
        }
    }

    slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| slot.unwrap_or_else(|| SensorDto::unavailable(&sensors[index])))
        .collect()
}

// ---------------------------------------------------------------------------
// Sensor views
// ---------------------------------------------------------------------------

/// All configured sensors with their latest readings and liveness status.
#[utoipa::path(
    get,
    path = "/sensors",
    responses(
        (status = 200, description = "All configured sensors with snapshots", body = Vec<SensorDto>),
    ),
    tag = "sensors"
)]
pub async fn get_sensors(State(state): State<AppState>) -> Json<Vec<SensorDto>> {
    let sensors = state.topology.as_ref().clone();
    Json(snapshots_for(&state, sensors).await)
}

/// Configured sensors on one floor.
#[utoipa::path(
    get,
    path = "/floors/{floor}/sensors",
    params(("floor" = String, Path, description = "Floor label, e.g. \"2\" or \"external\"")),
    responses(
        (status = 200, description = "Sensors on the floor", body = Vec<SensorDto>),
    ),
    tag = "sensors"
)]
pub async fn get_sensors_by_floor(
    State(state): State<AppState>,
    Path(floor): Path<String>,
) -> Json<Vec<SensorDto>> {
    let sensors: Vec<SensorInfo> = state
        .topology
        .iter()
        .filter(|s| s.floor == floor)
        .cloned()
        .collect();
    Json(snapshots_for(&state, sensors).await)
}

/// One configured sensor with its latest reading and liveness status.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Sensor with snapshot", body = SensorDto),
        (status = 404, description = "Sensor not in topology"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<SensorDto>, AppError> {
    let info = state
        .topology
        .iter()
        .find(|s| s.id == sensor_id)
        .cloned()
        .ok_or(AppError::UnknownSensor(sensor_id))?;
    Ok(Json(sensor_snapshot_dto(state.clone(), info).await))
}

/// The most recent reading of a sensor, or `null` when none is stored.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}/latest",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Latest reading or null", body = Option<LastReadingDto>),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "sensors"
)]
pub async fn get_sensor_latest(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<Option<LastReadingDto>>, AppError> {
    let latest = state.store.query_latest(&sensor_id).await?;
    Ok(Json(latest.map(|r| LastReadingDto::from(&normalize(&r)))))
}

// ---------------------------------------------------------------------------
// Aggregates
// ---------------------------------------------------------------------------

/// Per-month temperature and CO2 averages for one sensor over one year.
/// Months without readings are omitted; a metric with no contributions in a
/// month is `null`.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}/monthly",
    params(
        ("sensor_id" = String, Path, description = "Sensor ID"),
        ("year" = i32, Query, description = "Calendar year, e.g. 2024"),
    ),
    responses(
        (status = 200, description = "Monthly averages, ascending by month", body = Vec<MonthlyAverageDto>),
        (status = 400, description = "Invalid year"),
    ),
    tag = "aggregates"
)]
pub async fn get_monthly_averages(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Query(params): Query<YearParams>,
) -> Result<Json<Vec<MonthlyAverageDto>>, AppError> {
    let (start, end) = year_bounds(params.year)?;
    let records = state.store.query_range(&sensor_id, start, end).await?;
    let readings: Vec<Reading> = records.iter().map(normalize).collect();
    let buckets = aggregate_monthly(&readings, &[Metric::Temperature, Metric::Co2]);
    Ok(Json(buckets.iter().map(MonthlyAverageDto::from).collect()))
}

/// Fleet-wide sensor counts from one consistent scan.
#[utoipa::path(
    get,
    path = "/fleet/health",
    responses(
        (status = 200, description = "Total and recently-reporting sensor counts", body = FleetHealth),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "aggregates"
)]
pub async fn get_fleet_health(
    State(state): State<AppState>,
) -> Result<Json<FleetHealth>, AppError> {
    let records = state.store.scan_all().await?;
    let readings: Vec<Reading> = records.iter().map(normalize).collect();
    Ok(Json(count_fleet_health(
        &readings,
        Utc::now(),
        state.fleet_freshness,
    )))
}

/// Combined dashboard payload: current-year monthly series for one sensor,
/// its realtime reading, and fleet counts. The three fetches run in
/// parallel; a failed branch degrades to an empty section.
#[utoipa::path(
    get,
    path = "/dashboard",
    params(
        ("sensor_id" = Option<String>, Query, description = "Sensor for the charts; defaults to the first configured sensor"),
    ),
    responses(
        (status = 200, description = "Dashboard payload", body = DashboardDto),
        (status = 400, description = "No sensor_id given and no topology configured"),
    ),
    tag = "aggregates"
)]
pub async fn get_dashboard(
    State(state): State<AppState>,
    Query(params): Query<DashboardParams>,
) -> Result<Json<DashboardDto>, AppError> {
    let sensor_id = params
        .sensor_id
        .or_else(|| state.topology.first().map(|s| s.id.clone()))
        .ok_or_else(|| {
            AppError::InvalidRequest(
                "sensor_id is required when no topology is configured".to_owned(),
            )
        })?;

    let (start, end) = year_bounds(Utc::now().year())?;
    let (range, latest, scan) = tokio::join!(
        state.store.query_range(&sensor_id, start, end),
        state.store.query_latest(&sensor_id),
        state.store.scan_all(),
    );

    let yearly = match range {
        Ok(records) => {
            let readings: Vec<Reading> = records.iter().map(normalize).collect();
            let buckets = aggregate_monthly(&readings, &[Metric::Temperature, Metric::Co2]);
            YearlySeriesDto::from_buckets(&buckets)
        }
        Err(e) => {
            warn!(sensor_id = %sensor_id, error = %e, "Yearly series fetch failed");
            YearlySeriesDto::from_buckets(&[])
        }
    };

    let real_time = match latest {
        Ok(record) => record.map(|r| LastReadingDto::from(&normalize(&r))),
        Err(e) => {
            warn!(sensor_id = %sensor_id, error = %e, "Realtime fetch failed");
            None
        }
    };

    let fleet = match scan {
        Ok(records) => {
            let readings: Vec<Reading> = records.iter().map(normalize).collect();
            count_fleet_health(&readings, Utc::now(), state.fleet_freshness)
        }
        Err(e) => {
            warn!(error = %e, "Fleet scan failed");
            FleetHealth {
                total_sensors: 0,
                working_sensors: 0,
            }
        }
    };

    Ok(Json(DashboardDto {
        yearly,
        real_time,
        fleet,
    }))
}

// ---------------------------------------------------------------------------
// Reports
// ---------------------------------------------------------------------------

/// Generate a report over a closed time interval. One sensor id yields a
/// single report; several yield a comparison with cross-sensor statistics.
#[utoipa::path(
    post,
    path = "/reports/generate",
    request_body = ReportRequest,
    responses(
        (status = 200, description = "Single or comparison report", body = ReportResponse),
        (status = 400, description = "Unsupported metric or malformed request"),
        (status = 500, description = "Store unavailable (single-sensor report only)"),
    ),
    tag = "reports"
)]
pub async fn generate_report(
    State(state): State<AppState>,
    Json(request): Json<ReportRequest>,
) -> Result<Json<ReportResponse>, AppError> {
    let metric: Metric = request.report_type.parse()?;
    if request.sensor_ids.is_empty() {
        return Err(AppError::InvalidRequest(
            "sensor_ids must not be empty".to_owned(),
        ));
    }
    if request.end_time < request.start_time {
        return Err(AppError::InvalidRequest(
            "end_time must not precede start_time".to_owned(),
        ));
    }

    let time_range = TimeRangeDto {
        start_time: request.start_time,
        end_time: request.end_time,
    };

    if let [sensor_id] = request.sensor_ids.as_slice() {
        let report = state
            .reports
            .generate_report(sensor_id, metric, request.start_time, request.end_time)
            .await?;
        Ok(Json(ReportResponse::Single {
            report_type: metric,
            time_range,
            report,
        }))
    } else {
        let comparison = state
            .reports
            .compare_sensors(
                &request.sensor_ids,
                metric,
                request.start_time,
                request.end_time,
            )
            .await;
        Ok(Json(ReportResponse::Comparison {
            report_type: metric,
            time_range,
            comparison,
        }))
    }
}

// ---------------------------------------------------------------------------
// Notes
// ---------------------------------------------------------------------------

/// All notes attached to a sensor, most recent first.
#[utoipa::path(
    get,
    path = "/sensors/{sensor_id}/notes",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    responses(
        (status = 200, description = "Notes, most recent first", body = Vec<Note>),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "notes"
)]
pub async fn get_notes(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
) -> Result<Json<Vec<Note>>, AppError> {
    Ok(Json(state.notes.list_notes(&sensor_id).await?))
}

/// Attach a note to a sensor. `author` defaults to `"Anonymous"`.
#[utoipa::path(
    post,
    path = "/sensors/{sensor_id}/notes",
    params(("sensor_id" = String, Path, description = "Sensor ID")),
    request_body = CreateNoteRequest,
    responses(
        (status = 201, description = "Created note", body = Note),
        (status = 400, description = "Empty content"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "notes"
)]
pub async fn add_note(
    State(state): State<AppState>,
    Path(sensor_id): Path<String>,
    Json(request): Json<CreateNoteRequest>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    if request.content.trim().is_empty() {
        return Err(AppError::InvalidRequest(
            "note content must not be empty".to_owned(),
        ));
    }
    let author = request.author.as_deref().unwrap_or("Anonymous");
    let note = state
        .notes
        .add_note(&sensor_id, author, &request.content)
        .await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// Delete one note from a sensor.
#[utoipa::path(
    delete,
    path = "/sensors/{sensor_id}/notes/{note_id}",
    params(
        ("sensor_id" = String, Path, description = "Sensor ID"),
        ("note_id" = Uuid, Path, description = "Note ID"),
    ),
    responses(
        (status = 204, description = "Note deleted"),
        (status = 404, description = "No such note for this sensor"),
        (status = 500, description = "Store unavailable"),
    ),
    tag = "notes"
)]
pub async fn delete_note(
    State(state): State<AppState>,
    Path((sensor_id, note_id)): Path<(String, Uuid)>,
) -> Result<StatusCode, AppError> {
    if state.notes.delete_note(&sensor_id, note_id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(AppError::UnknownNote(note_id))
    }
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

/// Returns `200 OK` with `{"status":"ok"}` when the server is running.
#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy"),
    ),
    tag = "system"
)]
pub async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({ "status": "ok" }))
}

// ---------------------------------------------------------------------------
// OpenAPI spec
// ---------------------------------------------------------------------------

#[derive(OpenApi)]
#[openapi(
    paths(
        get_sensors,
        get_sensors_by_floor,
        get_sensor,
        get_sensor_latest,
        get_monthly_averages,
        get_fleet_health,
        get_dashboard,
        generate_report,
        get_notes,
        add_note,
        delete_note,
        health,
    ),
    components(schemas(
        SensorDto,
        LastReadingDto,
        SensorStatus,
        MonthlyAverageDto,
        MonthPointDto,
        YearlySeriesDto,
        DashboardDto,
        FleetHealth,
        Metric,
        ReportRequest,
        ReportResponse,
        TimeRangeDto,
        SensorReport,
        ReportPoint,
        ReportSummary,
        ComparisonReport,
        Comparative,
        Note,
        CreateNoteRequest,
    )),
    tags(
        (name = "sensors",    description = "Sensor topology and snapshots"),
        (name = "aggregates", description = "Monthly, dashboard and fleet aggregates"),
        (name = "reports",    description = "Report generation"),
        (name = "notes",      description = "Per-sensor annotations"),
        (name = "system",     description = "System endpoints"),
    ),
    info(
        title = "Aerium Monitoring API",
        version = "0.1.0",
        description = "REST API for building environmental monitoring"
    )
)]
pub struct ApiDoc;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
