mod handlers;
mod notes;

use axum::{routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_classes))
        .route("/:class_name/rounds", get(handlers::list_rounds).post(handlers::create_round))
        .route("/:class_name/rounds/:round/material", get(handlers::round_material))
        .route(
            "/:class_name/rounds/:round/scores",
            get(handlers::list_scores).put(handlers::save_score),
        )
        .route("/:class_name/rounds/:round/summary", get(handlers::round_summary))
        .route("/:class_name/rounds/:round/extracts", post(notes::compile_extracts))
        .route(
            "/:class_name/rounds/:round/students/:student_id/extracts",
            get(notes::student_extracts),
        )
        .route(
            "/:class_name/rounds/:round/students/:student_id/note-images",
            get(notes::student_note_images),
        )
}
