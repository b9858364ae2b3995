pub mod user_repo;
pub use user_repo::UserRepository;
pub mod reference_repo;
pub use reference_repo::ReferenceRepository;
pub mod obligation_repo;
pub use obligation_repo::ObligationRepository;
pub mod submission_repo;
pub use submission_repo::SubmissionRepository;
pub mod audit_repo;
pub use audit_repo::AuditRepository;
pub mod notification_repo;
pub use notification_repo::NotificationRepository;
pub mod report_repo;
pub use report_repo::ReportRepository;
pub mod dispatch_repo;
pub use dispatch_repo::DispatchRepository;
