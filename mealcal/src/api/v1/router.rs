use axum::{
    routing::{delete, get},
    Router,
};

use crate::api::state::AppState;

use super::handlers;

pub fn v1_router() -> Router<AppState> {
    let periods = Router::new()
        .route("/current", get(handlers::periods::current_period))
        .route("/{date}", get(handlers::periods::period_for_date));

    let meals = Router::new()
        .route(
            "/",
            get(handlers::meals::list_meals).put(handlers::meals::upsert_meal),
        )
        .route("/{id}", delete(handlers::meals::delete_meal));

    let weekly_memos = Router::new()
        .route(
            "/",
            get(handlers::weekly_memos::list_weekly_memos)
                .put(handlers::weekly_memos::upsert_weekly_memo),
        )
        .route(
            "/{key}",
            get(handlers::weekly_memos::get_weekly_memo)
                .delete(handlers::weekly_memos::delete_weekly_memo),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/calendar/{date}", get(handlers::calendar::get_calendar))
        .route(
            "/preferences/theme",
            get(handlers::preferences::get_theme).put(handlers::preferences::set_theme),
        )
        .nest("/periods", periods)
        .nest("/meals", meals)
        .nest("/weekly-memos", weekly_memos)
}
