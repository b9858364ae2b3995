// src/domain/recurrence.rs

use std::collections::HashSet;

use chrono::NaiveDate;

use crate::{
    domain::competence::{add_months_clamped, Competence},
    models::company::Recurrence,
};

pub const CONFLICT_REASON: &str = "Já existe obrigação para esta competência";

impl Recurrence {
    /// Intervalo em meses; `None` para obrigações de data específica.
    pub fn interval_months(&self) -> Option<u32> {
        match self {
            Recurrence::Mensal => Some(1),
            Recurrence::Bimestral => Some(2),
            Recurrence::Trimestral => Some(3),
            Recurrence::Semestral => Some(6),
            Recurrence::Anual => Some(12),
            Recurrence::Especifico => None,
        }
    }
}

/// Um período de obrigação: competência e datas associadas.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Period {
    pub competence: Competence,
    pub due_date: NaiveDate,
    pub delivery_deadline: Option<NaiveDate>,
}

impl Period {
    /// Período deslocado `months` meses a partir deste; cada data é calculada
    /// a partir da base, então o dia original é preservado quando o mês permite.
    pub fn shifted(&self, months: u32) -> Period {
        Period {
            competence: self.competence.add_months(months),
            due_date: add_months_clamped(self.due_date, months),
            delivery_deadline: self.delivery_deadline.map(|d| add_months_clamped(d, months)),
        }
    }
}

/// Projeta `count` períodos após `base`, um a cada `interval` meses.
pub fn project(base: &Period, interval: u32, count: u32) -> Vec<Period> {
    (1..=count).map(|step| base.shifted(step * interval)).collect()
}

/// Projeta a partir de `base` até que o vencimento ultrapasse `until`.
pub fn project_until(base: &Period, interval: u32, until: NaiveDate) -> Vec<Period> {
    let mut periods = Vec::new();
    if interval == 0 {
        return periods;
    }
    let mut step = 1;
    loop {
        let next = base.shifted(step * interval);
        if next.due_date > until {
            break;
        }
        periods.push(next);
        step += 1;
    }
    periods
}

/// Indica, para cada período, se a competência já está ocupada.
pub fn flag_conflicts<'a>(
    periods: &'a [Period],
    existing: &'a HashSet<Competence>,
) -> impl Iterator<Item = (&'a Period, bool)> + 'a {
    periods.iter().map(move |p| (p, existing.contains(&p.competence)))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn base() -> Period {
        Period {
            competence: Competence::parse("01/2025").unwrap(),
            due_date: d(2025, 2, 28),
            delivery_deadline: Some(d(2025, 1, 31)),
        }
    }

    #[test]
    fn monthly_projection_preserves_day_offsets() {
        let periods = project(&base(), 1, 3);
        let competences: Vec<String> = periods.iter().map(|p| p.competence.to_string()).collect();
        assert_eq!(competences, ["02/2025", "03/2025", "04/2025"]);

        assert_eq!(periods[0].due_date, d(2025, 3, 28));
        // O prazo de entrega volta ao dia 31 quando o mês comporta
        assert_eq!(periods[0].delivery_deadline, Some(d(2025, 2, 28)));
        assert_eq!(periods[1].delivery_deadline, Some(d(2025, 3, 31)));
        assert_eq!(periods[2].delivery_deadline, Some(d(2025, 4, 30)));
    }

    #[test]
    fn projection_is_deterministic() {
        assert_eq!(project(&base(), 3, 4), project(&base(), 3, 4));
    }

    #[test]
    fn quarterly_interval_skips_months() {
        let periods = project(&base(), 3, 2);
        assert_eq!(periods[0].competence.to_string(), "04/2025");
        assert_eq!(periods[1].competence.to_string(), "07/2025");
    }

    #[test]
    fn specific_date_types_have_no_interval() {
        assert_eq!(Recurrence::Especifico.interval_months(), None);
        assert_eq!(Recurrence::Anual.interval_months(), Some(12));
    }

    #[test]
    fn project_until_stops_at_horizon() {
        let periods = project_until(&base(), 1, d(2025, 5, 1));
        let competences: Vec<String> = periods.iter().map(|p| p.competence.to_string()).collect();
        assert_eq!(competences, ["02/2025", "03/2025"]);
    }

    #[test]
    fn flags_existing_competences() {
        let periods = project(&base(), 1, 3);
        let existing: HashSet<Competence> = [Competence::parse("03/2025").unwrap()].into();
        let flags: Vec<bool> = flag_conflicts(&periods, &existing).map(|(_, c)| c).collect();
        assert_eq!(flags, [false, true, false]);
    }
}
