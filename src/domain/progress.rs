// src/domain/progress.rs

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::dispatch::{DispatchStatus, SubtaskTotals};

pub fn totals(statuses: &[DispatchStatus]) -> SubtaskTotals {
    statuses.iter().fold(
        SubtaskTotals { total: statuses.len(), ..Default::default() },
        |mut acc, status| {
            match status {
                DispatchStatus::Concluido => acc.completed += 1,
                DispatchStatus::EmAndamento => acc.in_progress += 1,
                DispatchStatus::NaoIniciado => acc.not_started += 1,
            }
            acc
        },
    )
}

/// Percentual concluído (2 casas) e status derivado das subtarefas.
pub fn compute(statuses: &[DispatchStatus]) -> (Decimal, DispatchStatus) {
    let t = totals(statuses);
    if t.total == 0 {
        return (Decimal::ZERO, DispatchStatus::NaoIniciado);
    }

    let pct = (Decimal::from(t.completed as u64) * Decimal::ONE_HUNDRED / Decimal::from(t.total as u64))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);

    let status = if t.completed == t.total {
        DispatchStatus::Concluido
    } else if t.completed == 0 && t.in_progress == 0 {
        DispatchStatus::NaoIniciado
    } else {
        DispatchStatus::EmAndamento
    };

    (pct, status)
}

#[cfg(test)]
mod tests {
    use super::*;
    use DispatchStatus::*;

    #[test]
    fn empty_dispatch_is_not_started() {
        assert_eq!(compute(&[]), (Decimal::ZERO, NaoIniciado));
    }

    #[test]
    fn partial_completion_rounds_to_two_places() {
        let (pct, status) = compute(&[Concluido, Concluido, NaoIniciado]);
        assert_eq!(pct.to_string(), "66.67");
        assert_eq!(status, EmAndamento);
    }

    #[test]
    fn all_done_is_concluded() {
        assert_eq!(compute(&[Concluido, Concluido]), (Decimal::ONE_HUNDRED, Concluido));
    }

    #[test]
    fn started_subtask_moves_dispatch_in_progress() {
        let (pct, status) = compute(&[EmAndamento, NaoIniciado]);
        assert_eq!(pct, Decimal::ZERO);
        assert_eq!(status, EmAndamento);
    }

    #[test]
    fn totals_count_each_status() {
        let t = totals(&[Concluido, EmAndamento, NaoIniciado, NaoIniciado]);
        assert_eq!((t.total, t.completed, t.in_progress, t.not_started), (4, 1, 1, 2));
    }
}
