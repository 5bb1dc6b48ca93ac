use chrono::NaiveDate;
use thiserror::Error;

use caixa_core::LedgerEntry;

use crate::table::{entry_row, COLUMN_TITLES};

/// Field separator expected by the spreadsheet tools the report targets.
pub const CSV_DELIMITER: u8 = b';';

/// UTF-8 byte-order marker; spreadsheet tools use it to detect the encoding.
const BOM: &[u8] = b"\xef\xbb\xbf";

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("failed to write report: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders the result set as a `;`-delimited document.
///
/// A field is quoted exactly when it contains a quote, the delimiter, or a
/// line break, with internal quotes doubled — reading the document back with
/// a `;` reader reproduces the field values bit for bit.
pub fn export_csv(entries: &[LedgerEntry]) -> Result<Vec<u8>, ExportError> {
    let mut buf = Vec::from(BOM);
    {
        let mut writer = csv::WriterBuilder::new()
            .delimiter(CSV_DELIMITER)
            .from_writer(&mut buf);
        writer.write_record(COLUMN_TITLES)?;
        for entry in entries {
            writer.write_record(&entry_row(entry))?;
        }
        writer.flush()?;
    }
    Ok(buf)
}

/// Download name for the exported document, dated to the day.
pub fn export_file_name(today: NaiveDate) -> String {
    format!("relatorio-caixa-{}.csv", today.format("%Y-%m-%d"))
}
