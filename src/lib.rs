//src/lib.rs

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

pub mod client;
pub mod common;
pub mod config;
pub mod db;
pub mod docs;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;

use crate::config::AppState;
use crate::middleware::auth::auth_guard;

/// Monta o router completo da API sobre o estado dado.
pub fn app(app_state: AppState) -> Router {
    // Rotas públicas
    let auth_routes = Router::new()
        .route("/login/", post(handlers::auth::login))
        .route("/refresh/", post(handlers::auth::refresh));

    let reference_routes = Router::new()
        .route("/me/", get(handlers::auth::me))
        .route("/states/", get(handlers::reference::list_states))
        .route("/obligation-types/", get(handlers::reference::list_obligation_types))
        .route("/users/", get(handlers::reference::list_users))
        .route(
            "/companies/",
            get(handlers::reference::list_companies).post(handlers::reference::create_company),
        )
        .route(
            "/companies/{id}/",
            get(handlers::reference::get_company)
                .patch(handlers::reference::update_company)
                .delete(handlers::reference::delete_company),
        )
        .route("/companies/{id}/obligations/", get(handlers::reference::company_obligations));

    let obligation_routes = Router::new()
        .route(
            "/obligations/",
            get(handlers::obligations::list_obligations).post(handlers::obligations::create_obligation),
        )
        .route("/obligations/bulk-delete/", post(handlers::obligations::bulk_delete_obligations))
        .route("/obligations/recurrence/preview/", post(handlers::obligations::recurrence_preview))
        .route("/obligations/recurrence/generate/", post(handlers::obligations::recurrence_generate))
        .route(
            "/obligations/{id}/",
            get(handlers::obligations::get_obligation)
                .patch(handlers::obligations::update_obligation)
                .delete(handlers::obligations::delete_obligation),
        );

    let submission_routes = Router::new()
        .route("/submissions/", post(handlers::submissions::create_submission))
        .route("/deliveries/", get(handlers::submissions::list_deliveries))
        .route("/deliveries/bulk/", post(handlers::submissions::bulk_deliveries))
        .route("/deliveries/bulk-attachments/", post(handlers::submissions::bulk_attachments))
        .route("/deliveries/template/", get(handlers::submissions::delivery_template));

    let approval_routes = Router::new()
        .route("/pending/", get(handlers::approvals::pending))
        .route("/my-deliveries/", get(handlers::approvals::my_deliveries))
        .route("/{id}/approve/", post(handlers::approvals::approve))
        .route("/{id}/reject/", post(handlers::approvals::reject))
        .route("/{id}/request-revision/", post(handlers::approvals::request_revision))
        .route("/{id}/resubmit/", post(handlers::approvals::resubmit))
        .route("/{id}/timeline/", get(handlers::approvals::timeline))
        .route(
            "/{id}/attachments/{attachment_id}/download/",
            get(handlers::approvals::download_attachment),
        );

    let notification_routes = Router::new()
        .route("/notifications/", get(handlers::notifications::list_notifications))
        .route("/notifications/stats/", get(handlers::notifications::notification_stats))
        .route("/notifications/read-all/", post(handlers::notifications::mark_all_read))
        .route("/notifications/{id}/read/", post(handlers::notifications::mark_read));

    let planning_routes = Router::new()
        .route("/generate/", post(handlers::planning::generate))
        .route("/check-due-dates/", post(handlers::planning::check_due_dates))
        .route("/check-overdue/", post(handlers::planning::check_overdue))
        .route("/send-emails/", post(handlers::planning::send_emails));

    let report_routes = Router::new()
        .route("/summary/", get(handlers::reports::summary))
        .route("/detailed/", get(handlers::reports::detailed))
        .route("/advanced/", get(handlers::reports::advanced))
        .route("/user/{id}/", get(handlers::reports::user_performance))
        .route("/export.csv", get(handlers::reports::export_csv))
        .route("/export.xlsx", get(handlers::reports::export_xlsx));

    let user_admin_routes = Router::new()
        .route("/admin/", get(handlers::users::list_users))
        .route("/create/", post(handlers::users::create_user))
        .route("/stats/", get(handlers::users::user_stats))
        .route("/{id}/", axum::routing::delete(handlers::users::delete_user))
        .route("/{id}/role/", axum::routing::patch(handlers::users::set_role))
        .route("/{id}/password/", post(handlers::users::set_password))
        .route("/{id}/history/", get(handlers::users::user_history));

    let import_routes = Router::new()
        .route("/templates/{kind}/", get(handlers::imports::template))
        .route("/imports/companies/", post(handlers::imports::import_companies))
        .route("/imports/obligations/", post(handlers::imports::import_obligations));

    let dispatch_routes = Router::new()
        .route(
            "/dispatches/",
            get(handlers::dispatches::list_dispatches).post(handlers::dispatches::create_dispatch),
        )
        .route("/dispatches/progress/recalculate/", post(handlers::dispatches::recalculate))
        .route("/dispatches/notifications/run/", post(handlers::dispatches::run_notifications))
        .route(
            "/dispatches/{id}/",
            get(handlers::dispatches::get_dispatch)
                .patch(handlers::dispatches::update_dispatch)
                .delete(handlers::dispatches::delete_dispatch),
        )
        .route("/dispatches/{id}/progress/", get(handlers::dispatches::dispatch_progress))
        .route(
            "/dispatches/{id}/subtasks/",
            get(handlers::dispatches::list_subtasks).post(handlers::dispatches::create_subtask),
        )
        .route(
            "/dispatches/{id}/subtasks/{subtask_id}/",
            axum::routing::patch(handlers::dispatches::update_subtask)
                .delete(handlers::dispatches::delete_subtask),
        );

    // Tudo que exige Bearer token passa pelo auth_guard
    let protected_routes = Router::new()
        .merge(reference_routes)
        .merge(obligation_routes)
        .merge(submission_routes)
        .merge(import_routes)
        .merge(notification_routes)
        .merge(dispatch_routes)
        .nest("/approvals", approval_routes)
        .nest("/planning", planning_routes)
        .nest("/reports", report_routes)
        .nest("/users", user_admin_routes)
        .layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            auth_guard,
        ));

    // Combina tudo no router principal
    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .nest("/api/auth", auth_routes)
        .nest("/api", protected_routes)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", docs::ApiDoc::openapi()))
        .with_state(app_state)
}
