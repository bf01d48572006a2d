mod export;
mod handlers;

use axum::{
    routing::{get, post},
    Router,
};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_questions).post(handlers::create_question))
        .route("/export", get(export::export_questions))
        .route("/bulk-import", post(handlers::bulk_import))
        .route("/duplicates", get(handlers::find_duplicates))
        .route(
            "/:question_id",
            get(handlers::get_question)
                .put(handlers::update_question)
                .delete(handlers::delete_question),
        )
        .route("/:question_id/approve", post(handlers::approve_question))
}
