// src/client/format.rs

//! Formatação para exibição.

use crate::domain::cnpj;

/// CNPJ com máscara `XX.XXX.XXX/XXXX-XX`.
pub fn format_cnpj(raw: &str) -> String {
    cnpj::format(raw)
}

/// `AAAA-MM-DD` para `DD/MM/AAAA` por divisão da string, sem conversão de
/// fuso horário. Valores fora do formato são devolvidos como vieram.
pub fn format_date(value: &str) -> String {
    let date_part = value.split(['T', ' ']).next().unwrap_or(value);
    let parts: Vec<&str> = date_part.split('-').collect();
    match parts.as_slice() {
        [year, month, day] if year.len() == 4 && month.len() == 2 && day.len() == 2 => {
            format!("{day}/{month}/{year}")
        }
        _ => value.to_string(),
    }
}

/// Competência já vem como `MM/AAAA`.
pub fn format_competence(value: &str) -> &str {
    value
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cnpj_is_masked() {
        assert_eq!(format_cnpj("12345678000190"), "12.345.678/0001-90");
    }

    #[test]
    fn dates_do_not_shift() {
        assert_eq!(format_date("2025-03-05"), "05/03/2025");
        assert_eq!(format_date("2025-01-01T00:00:00Z"), "01/01/2025");
        assert_eq!(format_date("ontem"), "ontem");
    }

    #[test]
    fn competence_passes_through() {
        assert_eq!(format_competence("03/2025"), "03/2025");
    }
}
