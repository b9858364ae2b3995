// src/domain/competence.rs

use std::fmt;

use chrono::{Datelike, Months, NaiveDate};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Competência inválida: '{0}' (esperado MM/AAAA)")]
pub struct InvalidCompetence(pub String);

/// Período de referência de uma obrigação (mês/ano), escrito como `MM/AAAA`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Competence {
    year: i32,
    month: u32,
}

impl Competence {
    pub fn new(month: u32, year: i32) -> Result<Self, InvalidCompetence> {
        if !(1..=12).contains(&month) || !(1900..=9999).contains(&year) {
            return Err(InvalidCompetence(format!("{:02}/{}", month, year)));
        }
        Ok(Self { year, month })
    }

    /// Aceita apenas `MM/AAAA` com dois dígitos de mês e quatro de ano.
    pub fn parse(value: &str) -> Result<Self, InvalidCompetence> {
        let invalid = || InvalidCompetence(value.to_string());
        let (month, year) = value.trim().split_once('/').ok_or_else(invalid)?;

        if month.len() != 2 || year.len() != 4 {
            return Err(invalid());
        }
        if !month.bytes().chain(year.bytes()).all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }

        let month: u32 = month.parse().map_err(|_| invalid())?;
        let year: i32 = year.parse().map_err(|_| invalid())?;
        Self::new(month, year).map_err(|_| invalid())
    }

    /// Converte formatos comuns de planilha (`MM/AAAA`, `AAAA-MM`, `AAAA-MM-DD`, `MMAAAA`).
    pub fn parse_lenient(value: &str) -> Result<Self, InvalidCompetence> {
        let value = value.trim();
        if value.contains('/') {
            let (month, year) = value.split_once('/').ok_or_else(|| InvalidCompetence(value.into()))?;
            let month: u32 = month.trim().parse().map_err(|_| InvalidCompetence(value.into()))?;
            let year: i32 = year.trim().parse().map_err(|_| InvalidCompetence(value.into()))?;
            return Self::new(month, year).map_err(|_| InvalidCompetence(value.into()));
        }
        if value.contains('-') {
            let (year, month) = value
                .get(..4)
                .zip(value.get(5..7))
                .ok_or_else(|| InvalidCompetence(value.into()))?;
            let year: i32 = year.parse().map_err(|_| InvalidCompetence(value.into()))?;
            let month: u32 = month.parse().map_err(|_| InvalidCompetence(value.into()))?;
            return Self::new(month, year).map_err(|_| InvalidCompetence(value.into()));
        }
        if value.len() == 6 && value.bytes().all(|b| b.is_ascii_digit()) {
            return Self::from_period(value);
        }
        Err(InvalidCompetence(value.to_string()))
    }

    /// Período compacto `MMAAAA` usado nos nomes de arquivo.
    pub fn from_period(period: &str) -> Result<Self, InvalidCompetence> {
        if period.len() != 6 || !period.bytes().all(|b| b.is_ascii_digit()) {
            return Err(InvalidCompetence(period.to_string()));
        }
        Self::parse(&format!("{}/{}", &period[..2], &period[2..]))
    }

    pub fn from_date(date: NaiveDate) -> Self {
        Self { year: date.year(), month: date.month() }
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn add_months(&self, months: u32) -> Self {
        let index = self.year * 12 + (self.month as i32 - 1) + months as i32;
        Self { year: index.div_euclid(12), month: index.rem_euclid(12) as u32 + 1 }
    }

    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }
}

impl fmt::Display for Competence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}/{}", self.month, self.year)
    }
}

/// Soma meses a uma data, limitando o dia ao último dia do mês de destino
/// (31/01 + 1 mês = 28/02 ou 29/02).
pub fn add_months_clamped(date: NaiveDate, months: u32) -> NaiveDate {
    date.checked_add_months(Months::new(months)).unwrap_or(date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn parses_strict_format() {
        let c = Competence::parse("03/2025").unwrap();
        assert_eq!((c.month(), c.year()), (3, 2025));
        assert_eq!(c.to_string(), "03/2025");
    }

    #[test]
    fn rejects_malformed_competence() {
        for bad in ["3/2025", "13/2025", "00/2025", "03-2025", "03/25", "ab/2025", ""] {
            assert!(Competence::parse(bad).is_err(), "{bad} deveria falhar");
        }
    }

    #[test]
    fn lenient_parse_accepts_spreadsheet_formats() {
        let expected = Competence::new(4, 2024).unwrap();
        assert_eq!(Competence::parse_lenient("4/2024").unwrap(), expected);
        assert_eq!(Competence::parse_lenient("2024-04").unwrap(), expected);
        assert_eq!(Competence::parse_lenient("2024-04-30").unwrap(), expected);
        assert_eq!(Competence::parse_lenient("042024").unwrap(), expected);
    }

    #[test]
    fn add_months_rolls_over_the_year() {
        let c = Competence::parse("11/2024").unwrap();
        assert_eq!(c.add_months(1).to_string(), "12/2024");
        assert_eq!(c.add_months(2).to_string(), "01/2025");
        assert_eq!(c.add_months(14).to_string(), "01/2026");
    }

    #[test]
    fn clamps_day_to_end_of_month() {
        assert_eq!(add_months_clamped(d(2025, 1, 31), 1), d(2025, 2, 28));
        assert_eq!(add_months_clamped(d(2024, 1, 31), 1), d(2024, 2, 29));
        assert_eq!(add_months_clamped(d(2025, 1, 31), 3), d(2025, 4, 30));
        assert_eq!(add_months_clamped(d(2025, 1, 15), 12), d(2026, 1, 15));
    }
}
