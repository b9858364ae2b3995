// src/common/csv.rs
//
// Leitura e escrita mínimas de planilhas CSV (RFC 4180, separador `,` ou `;`).

/// Separador detectado pela primeira linha: `;` quando aparece mais que `,`.
fn detect_delimiter(text: &str) -> char {
    let header = text.lines().next().unwrap_or_default();
    let semicolons = header.matches(';').count();
    let commas = header.matches(',').count();
    if semicolons > commas { ';' } else { ',' }
}

/// Converte o texto em linhas de campos. Linhas totalmente vazias são mantidas
/// como `vec![""]` para preservar a numeração.
pub fn parse(text: &str) -> Vec<Vec<String>> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let delimiter = detect_delimiter(text);

    let mut rows = Vec::new();
    let mut row = Vec::new();
    let mut field = String::new();
    let mut in_quotes = false;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    field.push('"');
                    chars.next();
                } else {
                    in_quotes = false;
                }
            }
            '"' if field.is_empty() => in_quotes = true,
            c if c == delimiter && !in_quotes => row.push(std::mem::take(&mut field)),
            '\r' if !in_quotes => {}
            '\n' if !in_quotes => {
                row.push(std::mem::take(&mut field));
                rows.push(std::mem::take(&mut row));
            }
            c => field.push(c),
        }
    }

    if !field.is_empty() || !row.is_empty() {
        row.push(field);
        rows.push(row);
    }
    rows
}

/// Campo da linha já aparado; vazio vira `None`.
pub fn cell(row: &[String], index: usize) -> Option<&str> {
    row.get(index).map(|v| v.trim()).filter(|v| !v.is_empty())
}

pub fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|v| v.trim().is_empty())
}

fn escape(field: &str) -> String {
    if field.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

pub fn write_row<S: AsRef<str>>(fields: &[S]) -> String {
    let mut line = fields.iter().map(|f| escape(f.as_ref())).collect::<Vec<_>>().join(",");
    line.push_str("\r\n");
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_quoted_fields_and_crlf() {
        let rows = parse("name,notes\r\nACME,\"a, b\"\r\n\"Beta \"\"SA\"\"\",x\r\n");
        assert_eq!(rows.len(), 3);
        assert_eq!(rows[1], vec!["ACME", "a, b"]);
        assert_eq!(rows[2], vec!["Beta \"SA\"", "x"]);
    }

    #[test]
    fn detects_semicolon_separator_and_bom() {
        let rows = parse("\u{feff}company;cnpj\nACME;12345678000190");
        assert_eq!(rows[0], vec!["company", "cnpj"]);
        assert_eq!(rows[1], vec!["ACME", "12345678000190"]);
    }

    #[test]
    fn keeps_blank_lines_for_row_numbers() {
        let rows = parse("a,b\n\n1,2\n");
        assert_eq!(rows.len(), 3);
        assert!(is_blank_row(&rows[1]));
        assert_eq!(cell(&rows[2], 1), Some("2"));
        assert_eq!(cell(&rows[2], 5), None);
    }

    #[test]
    fn writes_escaped_rows() {
        assert_eq!(write_row(&["a", "b,c", "d\"e"]), "a,\"b,c\",\"d\"\"e\"\r\n");
    }
}
