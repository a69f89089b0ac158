pub mod health;

use axum::{
    routing::{get, post, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::auth::handlers as auth;
use crate::profile::handlers as profile;
use crate::resumes::handlers as resumes;
use crate::state::AppState;

/// The `{"status": "success", "message": ..}` body returned by mutations.
pub fn success(message: &str) -> Json<Value> {
    Json(json!({
        "status": "success",
        "message": message
    }))
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // Auth
        .route("/api/v1/auth/login", post(auth::handle_login))
        .route("/api/v1/auth/logout", post(auth::handle_logout))
        // Profile
        .route("/api/v1/profile", get(profile::handle_get_profile))
        .route(
            "/api/v1/profile/particulars",
            put(profile::handle_update_particulars),
        )
        .route(
            "/api/v1/profile/custom-prompt",
            put(profile::handle_update_custom_prompt),
        )
        .route("/api/v1/profile/:kind", post(profile::handle_add_item))
        .route(
            "/api/v1/profile/:kind/:id",
            put(profile::handle_update_item).delete(profile::handle_delete_item),
        )
        // Resumes
        .route(
            "/api/v1/resumes",
            get(resumes::handle_list_resumes).post(resumes::handle_generate_resume),
        )
        .route(
            "/api/v1/resumes/:id",
            get(resumes::handle_view_resume).delete(resumes::handle_delete_resume),
        )
        .route("/api/v1/resumes/:id/pdf", get(resumes::handle_download_pdf))
        .with_state(state)
}
