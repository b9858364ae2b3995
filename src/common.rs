pub mod csv;
pub mod error;
pub mod storage;
pub mod upload;
pub mod xlsx;
