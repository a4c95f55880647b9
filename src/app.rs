use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post, put}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/users/:user_id/dashboard", get(handlers::dashboard))
        .route("/users/:user_id/schedule", get(handlers::get_schedule))
        .route(
            "/users/:user_id/routines/",
            get(handlers::get_routines).post(handlers::create_routine),
        )
        .route("/users/:user_id/tasks/today", get(handlers::get_today_logs))
        .route("/users/:user_id/badges", get(handlers::get_badges))
        .route(
            "/routines/:routine_id",
            put(handlers::update_routine).delete(handlers::delete_routine),
        )
        .route("/routines/:routine_id/history", get(handlers::get_routine_history))
        .route("/routines/:routine_id/logs", get(handlers::get_routine_logs))
        .route(
            "/tasks/:task_id/complete",
            post(handlers::complete_task).delete(handlers::uncomplete_task),
        )
        .with_state(state)
}
