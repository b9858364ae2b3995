// src/docs.rs

use utoipa::OpenApi;
use utoipa::openapi::security::{Http, HttpAuthScheme, SecurityScheme};
use crate::handlers;
use crate::models;

#[derive(OpenApi)]
#[openapi(
    paths(
        // --- Auth ---
        handlers::auth::login,
        handlers::auth::refresh,
        handlers::auth::me,

        // --- Reference ---
        handlers::reference::list_states,
        handlers::reference::list_obligation_types,
        handlers::reference::list_users,
        handlers::reference::list_companies,
        handlers::reference::create_company,
        handlers::reference::get_company,
        handlers::reference::update_company,
        handlers::reference::delete_company,
        handlers::reference::company_obligations,

        // --- Obligations ---
        handlers::obligations::list_obligations,
        handlers::obligations::create_obligation,
        handlers::obligations::get_obligation,
        handlers::obligations::update_obligation,
        handlers::obligations::delete_obligation,
        handlers::obligations::bulk_delete_obligations,
        handlers::obligations::recurrence_preview,
        handlers::obligations::recurrence_generate,

        // --- Submissions ---
        handlers::submissions::create_submission,
        handlers::submissions::list_deliveries,
        handlers::submissions::bulk_deliveries,
        handlers::submissions::bulk_attachments,
        handlers::submissions::delivery_template,

        // --- Approvals ---
        handlers::approvals::pending,
        handlers::approvals::approve,
        handlers::approvals::reject,
        handlers::approvals::request_revision,
        handlers::approvals::resubmit,
        handlers::approvals::timeline,
        handlers::approvals::download_attachment,
        handlers::approvals::my_deliveries,

        // --- Notifications ---
        handlers::notifications::list_notifications,
        handlers::notifications::notification_stats,
        handlers::notifications::mark_read,
        handlers::notifications::mark_all_read,

        // --- Planning ---
        handlers::planning::generate,
        handlers::planning::check_due_dates,
        handlers::planning::check_overdue,
        handlers::planning::send_emails,

        // --- Reports ---
        handlers::reports::summary,
        handlers::reports::detailed,
        handlers::reports::advanced,
        handlers::reports::user_performance,
        handlers::reports::export_csv,
        handlers::reports::export_xlsx,

        // --- Users ---
        handlers::users::list_users,
        handlers::users::create_user,
        handlers::users::set_role,
        handlers::users::set_password,
        handlers::users::delete_user,
        handlers::users::user_history,
        handlers::users::user_stats,

        // --- Imports ---
        handlers::imports::template,
        handlers::imports::import_companies,
        handlers::imports::import_obligations,

        // --- Dispatches ---
        handlers::dispatches::list_dispatches,
        handlers::dispatches::create_dispatch,
        handlers::dispatches::get_dispatch,
        handlers::dispatches::update_dispatch,
        handlers::dispatches::delete_dispatch,
        handlers::dispatches::dispatch_progress,
        handlers::dispatches::list_subtasks,
        handlers::dispatches::create_subtask,
        handlers::dispatches::update_subtask,
        handlers::dispatches::delete_subtask,
        handlers::dispatches::recalculate,
        handlers::dispatches::run_notifications,
    ),
    components(
        schemas(
            // --- Enums compartilhados ---
            models::auth::Role,
            models::company::Recurrence,
            models::obligation::ObligationStatus,
            models::submission::SubmissionType,
            models::submission::ApprovalStatus,
            models::submission::AttachmentKind,
            models::notification::NotificationType,
            models::notification::Priority,
            models::dispatch::DispatchCategory,
            models::dispatch::DispatchStatus,
            models::import::TemplateKind,
        )
    ),
    tags(
        (name = "Auth", description = "Login, refresh e usuário atual"),
        (name = "Reference", description = "UFs, tipos de obrigação e usuários"),
        (name = "Companies", description = "Cadastro de empresas"),
        (name = "Obligations", description = "Obrigações acessórias"),
        (name = "Recurrence", description = "Geração de obrigações recorrentes"),
        (name = "Submissions", description = "Registro de entregas"),
        (name = "Approvals", description = "Fluxo de aprovação de entregas"),
        (name = "Notifications", description = "Alertas do usuário"),
        (name = "Planning", description = "Planejamento e rotinas de alerta"),
        (name = "Reports", description = "Relatórios de conformidade"),
        (name = "Users", description = "Administração de usuários"),
        (name = "Imports", description = "Modelos e importação de planilhas"),
        (name = "Dispatches", description = "Despachos, fiscalizações e subtarefas")
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl utoipa::Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "api_jwt",
            SecurityScheme::Http(
                Http::new(HttpAuthScheme::Bearer)
            ),
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_lists_routes_and_bearer_scheme() {
        let doc = ApiDoc::openapi();
        assert!(doc.paths.paths.contains_key("/api/obligations/recurrence/preview/"));
        assert!(doc.paths.paths.contains_key("/api/approvals/{id}/attachments/{attachment_id}/download/"));
        let components = doc.components.expect("components");
        assert!(components.security_schemes.contains_key("api_jwt"));
    }
}
