// src/common/xlsx.rs

//! Planilhas `.xlsx`: escrita com `rust_xlsxwriter`, leitura com `calamine`.
//! Só a primeira aba é lida e toda célula vira texto, como numa linha de CSV.

use std::io::Cursor;

use anyhow::anyhow;
use calamine::{Data, DataType, Reader, Xlsx};
use rust_xlsxwriter::{Format, Workbook};

use crate::common::{csv, error::AppError};

pub const CONTENT_TYPE: &str = "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

// Um .xlsx é um zip
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";

fn extension(filename: &str) -> Option<String> {
    filename.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

pub fn is_xlsx(filename: &str, bytes: &[u8]) -> bool {
    extension(filename).as_deref() == Some("xlsx") || bytes.starts_with(ZIP_MAGIC)
}

/// Gera um arquivo com uma aba: cabeçalho em negrito e as linhas como texto.
pub fn write_sheet<H, C>(sheet_name: &str, header: &[H], rows: &[Vec<C>]) -> Result<Vec<u8>, AppError>
where
    H: AsRef<str>,
    C: AsRef<str>,
{
    let write = || -> Result<Vec<u8>, rust_xlsxwriter::XlsxError> {
        let mut workbook = Workbook::new();
        let bold = Format::new().set_bold();
        let sheet = workbook.add_worksheet();
        sheet.set_name(sheet_name)?;

        for (col, title) in header.iter().enumerate() {
            sheet.write_string_with_format(0, col as u16, title.as_ref(), &bold)?;
        }
        for (i, row) in rows.iter().enumerate() {
            for (col, value) in row.iter().enumerate() {
                let value = value.as_ref();
                if !value.is_empty() {
                    sheet.write_string(i as u32 + 1, col as u16, value)?;
                }
            }
        }
        sheet.autofit();
        workbook.save_to_buffer()
    };
    write().map_err(|e| AppError::InternalServerError(anyhow!("Falha ao gerar planilha: {e}")))
}

/// Texto da célula. Números inteiros perdem o `.0` (CNPJ digitado como número)
/// e datas saem em `AAAA-MM-DD`.
fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.trim().to_string(),
        Data::Float(f) if f.fract() == 0.0 && f.abs() < 1e15 => format!("{}", *f as i64),
        Data::DateTime(_) | Data::DateTimeIso(_) => cell
            .as_date()
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| cell.to_string()),
        other => other.to_string(),
    }
}

fn unreadable(e: calamine::XlsxError) -> AppError {
    tracing::warn!("Planilha .xlsx ilegível: {}", e);
    AppError::field("file", "Não foi possível ler a planilha .xlsx.")
}

/// Todas as linhas da primeira aba, cabeçalho incluído.
pub fn read_rows(bytes: &[u8]) -> Result<Vec<Vec<String>>, AppError> {
    let mut workbook: Xlsx<_> = Xlsx::new(Cursor::new(bytes)).map_err(unreadable)?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range.map_err(unreadable)?,
        None => return Ok(Vec::new()),
    };

    // O range começa na primeira célula usada; colunas vazias à esquerda voltam
    // como campos vazios para manter as posições.
    let pad = range.start().map_or(0, |(_, col)| col as usize);
    Ok(range
        .rows()
        .map(|row| std::iter::repeat_n(String::new(), pad).chain(row.iter().map(cell_text)).collect())
        .collect())
}

/// Linhas de uma planilha enviada: `.xlsx` pelo nome ou pelo conteúdo, CSV
/// nos demais casos.
pub fn upload_rows(filename: &str, bytes: &[u8]) -> Result<Vec<Vec<String>>, AppError> {
    if is_xlsx(filename, bytes) {
        return read_rows(bytes);
    }
    if extension(filename).as_deref() == Some("xls") {
        return Err(AppError::field(
            "file",
            "Formato .xls não é suportado. Salve a planilha como .xlsx ou .csv.",
        ));
    }
    Ok(csv::parse(&String::from_utf8_lossy(bytes)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn written_sheet_reads_back() {
        let rows = vec![
            vec!["Empresa Ação Ltda", "12345678000190", "SP"],
            vec!["Outra", "", "RJ"],
        ];
        let bytes = write_sheet("Dados", &["empresa", "cnpj", "uf"], &rows).unwrap();
        assert!(bytes.starts_with(ZIP_MAGIC));

        let back = read_rows(&bytes).unwrap();
        assert_eq!(back[0], ["empresa", "cnpj", "uf"]);
        assert_eq!(back[1], ["Empresa Ação Ltda", "12345678000190", "SP"]);
        assert_eq!(back[2], ["Outra", "", "RJ"]);
    }

    #[test]
    fn numeric_and_date_cells_become_plain_text() {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.write_string(0, 0, "cnpj").unwrap();
        sheet.write_string(0, 1, "delivery_date").unwrap();
        sheet.write_number(1, 0, 12345678000190.0).unwrap();
        let date = rust_xlsxwriter::ExcelDateTime::from_ymd(2025, 2, 18).unwrap();
        let date_format = Format::new().set_num_format("dd/mm/yyyy");
        sheet.write_datetime_with_format(1, 1, &date, &date_format).unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        let rows = read_rows(&bytes).unwrap();
        assert_eq!(rows[1], ["12345678000190", "2025-02-18"]);
    }

    #[test]
    fn upload_picks_reader_by_name_or_content() {
        let xlsx = write_sheet("Dados", &["a"], &[vec!["1"]]).unwrap();
        // Sem extensão: reconhecido pela assinatura do zip
        assert_eq!(upload_rows("planilha", &xlsx).unwrap()[1], ["1"]);

        let rows = upload_rows("dados.csv", "a;b\n1;2\n".as_bytes()).unwrap();
        assert_eq!(rows.len(), 2);

        assert!(matches!(upload_rows("antiga.xls", b"\xd0\xcf\x11\xe0"), Err(AppError::FieldErrors(_))));
        assert!(matches!(upload_rows("quebrada.xlsx", b"nao e zip"), Err(AppError::FieldErrors(_))));
    }
}
