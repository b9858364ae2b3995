// src/services.rs

pub mod approval_service;
pub mod auth;
pub mod company_service;
pub mod dispatch_service;
pub mod import_service;
pub mod mailer;
pub mod notification_service;
pub mod obligation_service;
pub mod planning_service;
pub mod recurrence_service;
pub mod report_service;
pub mod submission_service;
pub mod user_admin_service;

pub use approval_service::ApprovalService;
pub use auth::AuthService;
pub use company_service::CompanyService;
pub use dispatch_service::DispatchService;
pub use import_service::ImportService;
pub use notification_service::NotificationService;
pub use obligation_service::ObligationService;
pub use planning_service::PlanningService;
pub use recurrence_service::RecurrenceService;
pub use report_service::ReportService;
pub use submission_service::SubmissionService;
pub use user_admin_service::UserAdminService;
