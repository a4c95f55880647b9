use crate::errors::AppError;
use crate::models::{
    AppData, Badge, CompleteQuery, CompletionStatus, DateQuery, NewRoutine, ResolvedSchedule, Routine,
    StatusResponse, TaskLog, UserContext,
};
use crate::routines;
use crate::state::AppState;
use crate::storage::persist_data;
use crate::ui::render_dashboard;
use axum::{
    extract::{Path, Query, State},
    response::{Html, Redirect},
    Json,
};
use chrono::NaiveDate;

pub async fn index(State(state): State<AppState>) -> Redirect {
    Redirect::to(&format!("/users/{}/dashboard", state.default_user_id))
}

pub async fn dashboard(State(state): State<AppState>, Path(user_id): Path<u64>) -> Html<String> {
    let schedule = state.resolve_for(UserContext::new(user_id)).await;
    Html(render_dashboard(user_id, &schedule))
}

pub async fn get_schedule(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<ResolvedSchedule>, AppError> {
    Ok(Json(state.resolve_for(UserContext::new(user_id)).await))
}

pub async fn get_routines(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<Routine>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(routines::list_routines(&data, UserContext::new(user_id))))
}

pub async fn create_routine(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
    Json(payload): Json<NewRoutine>,
) -> Result<Json<Routine>, AppError> {
    let now = state.clock.now();
    let routine = commit(&state, |data| {
        routines::create_routine(data, UserContext::new(user_id), payload, now)
    })
    .await?;
    Ok(Json(routine))
}

pub async fn update_routine(
    State(state): State<AppState>,
    Path(routine_id): Path<u64>,
    Json(payload): Json<NewRoutine>,
) -> Result<Json<Routine>, AppError> {
    let routine = commit(&state, |data| routines::update_routine(data, routine_id, payload)).await?;
    Ok(Json(routine))
}

pub async fn delete_routine(
    State(state): State<AppState>,
    Path(routine_id): Path<u64>,
) -> Result<Json<Routine>, AppError> {
    let routine = commit(&state, |data| routines::delete_routine(data, routine_id)).await?;
    Ok(Json(routine))
}

pub async fn get_routine_history(
    State(state): State<AppState>,
    Path(routine_id): Path<u64>,
) -> Result<Json<Vec<NaiveDate>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(routines::routine_history(&data, routine_id)?))
}

pub async fn get_routine_logs(
    State(state): State<AppState>,
    Path(routine_id): Path<u64>,
) -> Result<Json<Vec<TaskLog>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(routines::routine_logs(&data, routine_id)?))
}

pub async fn complete_task(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Query(query): Query<CompleteQuery>,
) -> Result<Json<TaskLog>, AppError> {
    let status = match query.status.as_deref() {
        None => CompletionStatus::Completed,
        Some(value) => CompletionStatus::parse(value)
            .ok_or_else(|| AppError::bad_request("status must be 'completed' or 'skipped'"))?,
    };
    let now = state.clock.now();
    let date = parse_date(query.date_str.as_deref(), now.date())?;

    let log = commit(&state, |data| {
        routines::record_completion(data, task_id, status, date, now)
    })
    .await?;
    Ok(Json(log))
}

pub async fn uncomplete_task(
    State(state): State<AppState>,
    Path(task_id): Path<u64>,
    Query(query): Query<DateQuery>,
) -> Result<Json<StatusResponse>, AppError> {
    let date = parse_date(query.date_str.as_deref(), state.clock.today())?;

    commit(&state, |data| {
        if routines::remove_completion(data, task_id, date) {
            Ok(())
        } else {
            Err(AppError::not_found("Task log not found"))
        }
    })
    .await?;
    Ok(Json(StatusResponse {
        status: "success".to_string(),
    }))
}

pub async fn get_today_logs(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<TaskLog>>, AppError> {
    let today = state.clock.today();
    let data = state.data.lock().await;
    Ok(Json(routines::list_completions_for_date(
        &data,
        UserContext::new(user_id),
        today,
    )))
}

pub async fn get_badges(
    State(state): State<AppState>,
    Path(user_id): Path<u64>,
) -> Result<Json<Vec<Badge>>, AppError> {
    let data = state.data.lock().await;
    Ok(Json(routines::badges(&data, UserContext::new(user_id))))
}

/// Applies `change` to a copy of the document and swaps it in only once the
/// copy is on disk, so a failed write leaves memory untouched.
async fn commit<T>(
    state: &AppState,
    change: impl FnOnce(&mut AppData) -> Result<T, AppError>,
) -> Result<T, AppError> {
    let mut data = state.data.lock().await;
    let mut draft = data.clone();
    let result = change(&mut draft)?;
    persist_data(&state.data_path, &draft).await?;
    *data = draft;
    drop(data);

    state.notify_changed();
    Ok(result)
}

fn parse_date(date_str: Option<&str>, today: NaiveDate) -> Result<NaiveDate, AppError> {
    match date_str {
        None => Ok(today),
        Some(value) => NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d")
            .map_err(|_| AppError::bad_request("Invalid date format. Use YYYY-MM-DD")),
    }
}
