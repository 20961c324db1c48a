use crate::{
    AppState,
    guard::Capability,
    handlers,
    session::Role,
    shell::{RouteDescriptor, View},
};
use axum::{Router, routing::post};

/// Admin Views
///
/// Document management. A normal user navigating here is silently sent to the
/// default landing.
pub fn admin_views() -> Vec<RouteDescriptor> {
    let admin_only = || Capability::RoleIn(vec![Role::Admin]);
    vec![
        RouteDescriptor::new("/upload", View::Upload, admin_only()),
        RouteDescriptor::new("/documents", View::Documents, admin_only()),
        RouteDescriptor::new("/deleted", View::Deleted, admin_only()),
    ]
}

/// Admin Router Module
///
/// Document indexing actions, wrapped in `auth::require_admin` by `create_router`.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        // POST /api/admin/upload
        // Multipart PDF upload, forwarded to the backend for indexing.
        .route("/api/admin/upload", post(handlers::upload_document))
        // POST /api/admin/populate
        // Index already-stored PDFs into a fresh collection.
        .route("/api/admin/populate", post(handlers::populate_collection))
}
