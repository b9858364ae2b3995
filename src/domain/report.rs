// src/domain/report.rs

use std::collections::BTreeMap;

use rust_decimal::{Decimal, RoundingStrategy};

use crate::models::{
    obligation::ObligationStatus,
    report::{Breakdown, ReportRow, StatusCounts},
};

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

pub fn counts<'a>(rows: impl IntoIterator<Item = &'a ReportRow>) -> StatusCounts {
    let mut c = StatusCounts::default();
    for row in rows {
        c.total += 1;
        match row.status {
            ObligationStatus::Entregue => c.delivered += 1,
            ObligationStatus::Atrasado => c.overdue += 1,
            ObligationStatus::Pendente => c.pending += 1,
        }
    }
    c.compliance_rate = compliance_rate(c.delivered, c.total);
    c
}

/// Percentual entregue com 2 casas, arredondando a metade para longe do zero.
pub fn compliance_rate(delivered: usize, total: usize) -> Decimal {
    if total == 0 {
        return Decimal::ZERO;
    }
    (Decimal::from(delivered as u64) * Decimal::ONE_HUNDRED / Decimal::from(total as u64))
        .round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

/// Agrupa as linhas por chave; ordenado por total decrescente e depois pela chave.
pub fn breakdown<K, L>(rows: &[ReportRow], key: K, label: L) -> Vec<Breakdown>
where
    K: Fn(&ReportRow) -> String,
    L: Fn(&ReportRow) -> String,
{
    let mut groups: BTreeMap<String, (String, Vec<&ReportRow>)> = BTreeMap::new();
    for row in rows {
        groups
            .entry(key(row))
            .or_insert_with(|| (label(row), Vec::new()))
            .1
            .push(row);
    }

    let mut result: Vec<Breakdown> = groups
        .into_iter()
        .map(|(key, (label, members))| {
            let c = counts(members.iter().copied());
            Breakdown {
                key,
                label,
                total: c.total,
                delivered: c.delivered,
                pending: c.pending,
                overdue: c.overdue,
            }
        })
        .collect();

    result.sort_by(|a, b| b.total.cmp(&a.total).then_with(|| a.key.cmp(&b.key)));
    result
}

/// Atraso médio (dias) entre vencimento e primeira entrega das obrigações entregues.
pub fn avg_delivery_delay(rows: &[ReportRow]) -> f64 {
    let delays: Vec<i64> = rows
        .iter()
        .filter_map(|r| r.first_delivery_date.map(|d| (d - r.due_date).num_days()))
        .collect();
    if delays.is_empty() {
        return 0.0;
    }
    round2(delays.iter().sum::<i64>() as f64 / delays.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::company::Recurrence;
    use chrono::NaiveDate;

    fn row(company: &str, status: ObligationStatus, delivered_on: Option<u32>) -> ReportRow {
        let due = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        ReportRow {
            obligation_id: 1,
            company_id: 1,
            company: company.into(),
            company_cnpj: None,
            state_id: 1,
            state_code: "SP".into(),
            obligation_type_id: 1,
            obligation_type: "Federal".into(),
            recurrence: Recurrence::Mensal,
            obligation_name: "SPED".into(),
            competence: "02/2025".into(),
            due_date: due,
            delivery_deadline: None,
            responsible_user_id: None,
            responsible_username: None,
            submissions_count: delivered_on.is_some() as i64,
            has_approved_submission: status == ObligationStatus::Entregue,
            first_delivery_date: delivered_on.map(|d| NaiveDate::from_ymd_opt(2025, 3, d).unwrap()),
            last_delivery_date: None,
            status,
        }
    }

    #[test]
    fn counts_compute_compliance_rate() {
        let rows = [
            row("A", ObligationStatus::Entregue, Some(8)),
            row("A", ObligationStatus::Atrasado, None),
            row("B", ObligationStatus::Pendente, None),
        ];
        let c = counts(&rows);
        assert_eq!((c.total, c.delivered, c.overdue, c.pending), (3, 1, 1, 1));
        assert_eq!(c.compliance_rate, Decimal::new(3333, 2));
    }

    #[test]
    fn compliance_rate_rounds_half_away_from_zero() {
        // 1/8 = 12,5%; 1/16 = 6,25%; 1/32 = 3,125% -> 3,13
        assert_eq!(compliance_rate(1, 8), Decimal::new(125, 1));
        assert_eq!(compliance_rate(1, 32), Decimal::new(313, 2));
        assert_eq!(compliance_rate(2, 3), Decimal::new(6667, 2));
        assert_eq!(compliance_rate(0, 0), Decimal::ZERO);
    }

    #[test]
    fn breakdown_orders_by_total() {
        let rows = vec![
            row("B", ObligationStatus::Pendente, None),
            row("A", ObligationStatus::Entregue, Some(9)),
            row("A", ObligationStatus::Atrasado, None),
        ];
        let groups = breakdown(&rows, |r| r.company.clone(), |r| r.company.clone());
        assert_eq!(groups[0].key, "A");
        assert_eq!((groups[0].total, groups[0].delivered, groups[0].overdue), (2, 1, 1));
        assert_eq!(groups[1].key, "B");
    }

    #[test]
    fn delay_is_negative_when_delivered_early() {
        let rows = vec![
            row("A", ObligationStatus::Entregue, Some(8)),
            row("A", ObligationStatus::Entregue, Some(14)),
        ];
        assert_eq!(avg_delivery_delay(&rows), 1.0);
    }
}
