// src/domain/status.rs

use chrono::NaiveDate;

use crate::models::{notification::Priority, obligation::ObligationStatus};

/// entregue > atrasado > pendente
pub fn classify(has_approved_submission: bool, due_date: NaiveDate, today: NaiveDate) -> ObligationStatus {
    if has_approved_submission {
        ObligationStatus::Entregue
    } else if due_date < today {
        ObligationStatus::Atrasado
    } else {
        ObligationStatus::Pendente
    }
}

/// Prioridade do alerta de vencimento conforme os dias restantes.
pub fn due_priority(days_until_due: i64) -> Priority {
    match days_until_due {
        i64::MIN..=1 => Priority::Urgent,
        2..=3 => Priority::High,
        4..=5 => Priority::Medium,
        _ => Priority::Low,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn approved_submission_wins_over_due_date() {
        let today = d(2025, 3, 10);
        assert_eq!(classify(true, d(2025, 1, 1), today), ObligationStatus::Entregue);
        assert_eq!(classify(false, d(2025, 3, 9), today), ObligationStatus::Atrasado);
        assert_eq!(classify(false, d(2025, 3, 10), today), ObligationStatus::Pendente);
    }

    #[test]
    fn priority_grows_as_due_date_approaches() {
        assert_eq!(due_priority(0), Priority::Urgent);
        assert_eq!(due_priority(1), Priority::Urgent);
        assert_eq!(due_priority(3), Priority::High);
        assert_eq!(due_priority(5), Priority::Medium);
        assert_eq!(due_priority(7), Priority::Low);
    }
}
