//! CSV export of the filtered record set.
//!
//! The file starts with a UTF-8 byte order mark so spreadsheet tools pick the
//! right encoding for the accented labels.

use chrono::NaiveDate;
use thiserror::Error;

use crate::models::decision::DecisionRecord;

const BOM: &[u8] = b"\xEF\xBB\xBF";

const HEADERS: [&str; 13] = [
    "Data",
    "Nome",
    "Decisão",
    "Estado Civil",
    "Data de Nascimento",
    "Email",
    "Cidade",
    "Estado",
    "Bairro",
    "Celular",
    "Celebração",
    "Celebração Extra",
    "Status",
];

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("CSV buffer error: {0}")]
    Buffer(String),
}

pub fn export_filename(today: NaiveDate) -> String {
    format!("decisoes_{}.csv", today.format("%d-%m-%Y"))
}

pub fn export_csv(records: &[&DecisionRecord]) -> Result<Vec<u8>, ExportError> {
    let mut writer = csv::Writer::from_writer(BOM.to_vec());
    writer.write_record(HEADERS)?;

    for record in records {
        writer.write_record([
            format_date(Some(record.data_decisao)),
            record.nome.clone(),
            record.decisao.as_str().to_string(),
            record
                .estado_civil
                .map(|e| e.as_str().to_string())
                .unwrap_or_default(),
            format_date(record.nascimento),
            text(&record.email),
            text(&record.cidade),
            text(&record.estado),
            text(&record.bairro),
            text(&record.celular),
            record
                .celebracao
                .map(|c| c.as_str().to_string())
                .unwrap_or_default(),
            text(&record.celebracao_extra),
            record.status.as_str().to_string(),
        ])?;
    }

    writer
        .into_inner()
        .map_err(|e| ExportError::Buffer(e.error().to_string()))
}

fn format_date(date: Option<NaiveDate>) -> String {
    date.map(|d| d.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

fn text(value: &Option<String>) -> String {
    value.clone().unwrap_or_default()
}
