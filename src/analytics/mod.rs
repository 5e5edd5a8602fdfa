pub mod handlers;
pub mod repo;
pub mod report;

use axum::{routing::get, Router};

use crate::state::AppState;

pub use report::{AggregateReporter, DailyBucket, MacroSplit, WeeklyBucket};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/analytics/weekly", get(handlers::weekly))
        .route("/analytics/daily-goals", get(handlers::daily_goals))
        .route("/analytics/macros", get(handlers::macros))
        .route("/goal", get(handlers::get_goal).put(handlers::put_goal))
}
