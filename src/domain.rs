//! Regras de negócio puras, sem acesso a banco ou rede. Usadas tanto pelo
//! servidor quanto pelo cliente.

pub mod approval;
pub mod cnpj;
pub mod competence;
pub mod filename;
pub mod progress;
pub mod recurrence;
pub mod report;
pub mod status;
