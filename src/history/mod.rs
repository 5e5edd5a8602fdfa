mod dto;
pub mod handlers;
pub mod local;
pub mod record;
pub mod remote;
pub mod search;
pub mod services;
pub mod store;

use crate::state::AppState;
use axum::Router;

pub use record::{AnalysisRecord, NewAnalysis};
pub use search::{SearchCoordinator, SearchSnapshot, SEARCH_DEBOUNCE};
pub use store::{ClearOutcome, HistoryStore, SavedAnalysis, StorageTier};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
