// src/domain/cnpj.rs

/// Mantém apenas os dígitos (remove a máscara).
pub fn digits(raw: &str) -> String {
    raw.chars().filter(char::is_ascii_digit).collect()
}

/// CNPJ normalizado com 14 dígitos, ou `None` se o tamanho não confere.
pub fn normalize(raw: &str) -> Option<String> {
    let d = digits(raw);
    (d.len() == 14).then_some(d)
}

/// Aplica a máscara `XX.XXX.XXX/XXXX-XX`; valores que não têm 14 dígitos
/// são devolvidos como vieram.
pub fn format(raw: &str) -> String {
    match normalize(raw) {
        Some(d) => format!("{}.{}.{}/{}-{}", &d[0..2], &d[2..5], &d[5..8], &d[8..12], &d[12..14]),
        None => raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn masks_fourteen_digits() {
        assert_eq!(format("12345678000190"), "12.345.678/0001-90");
    }

    #[test]
    fn masked_input_is_reformatted() {
        assert_eq!(format("12.345.678/0001-90"), "12.345.678/0001-90");
        assert_eq!(normalize("12.345.678/0001-90").as_deref(), Some("12345678000190"));
    }

    #[test]
    fn short_values_are_left_untouched() {
        assert_eq!(format("123"), "123");
        assert_eq!(normalize("123"), None);
    }
}
