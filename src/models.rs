pub mod approval;
pub mod auth;
pub mod company;
pub mod dispatch;
pub mod import;
pub mod notification;
pub mod obligation;
pub mod planning;
pub mod recurrence;
pub mod report;
pub mod submission;
pub mod user_admin;
