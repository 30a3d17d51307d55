mod handlers;

use axum::{routing::delete, routing::get, routing::post, Router};

use crate::core::state::AppState;

pub(crate) fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(handlers::register_material))
        .route("/:material_id", get(handlers::get_material).delete(handlers::delete_material))
        .route("/:material_id/regions", get(handlers::get_regions).put(handlers::save_regions))
        .route("/:material_id/regions/:question_number", delete(handlers::remove_region))
}

#[cfg(test)]
mod tests;
