pub mod approvals;
pub mod auth;
pub mod dispatches;
pub mod imports;
pub mod notifications;
pub mod obligations;
pub mod planning;
pub mod reference;
pub mod reports;
pub mod submissions;
pub mod users;

use axum::{
    http::header,
    response::{IntoResponse, Response},
};

/// `Content-Disposition` com nome ASCII e a forma `filename*` em UTF-8.
pub fn content_disposition(filename: &str) -> String {
    let ascii: String = filename
        .chars()
        .map(|c| if c.is_ascii_graphic() && c != '"' && c != '\\' || c == ' ' { c } else { '_' })
        .collect();
    let mut encoded = String::new();
    for byte in filename.bytes() {
        if byte.is_ascii_alphanumeric() || b".-_~".contains(&byte) {
            encoded.push(byte as char);
        } else {
            encoded.push_str(&format!("%{byte:02X}"));
        }
    }
    format!("attachment; filename=\"{ascii}\"; filename*=UTF-8''{encoded}")
}

/// Resposta binária para download.
pub fn file_response(filename: &str, content_type: &str, bytes: Vec<u8>) -> Response {
    (
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_DISPOSITION, content_disposition(filename)),
        ],
        bytes,
    )
        .into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn disposition_keeps_ascii_and_encodes_utf8() {
        assert_eq!(
            content_disposition("recibo.pdf"),
            "attachment; filename=\"recibo.pdf\"; filename*=UTF-8''recibo.pdf"
        );
        assert_eq!(
            content_disposition("relatório final.csv"),
            "attachment; filename=\"relat_rio final.csv\"; filename*=UTF-8''relat%C3%B3rio%20final.csv"
        );
    }
}
