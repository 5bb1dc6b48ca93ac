pub mod export;
pub mod table;

pub use export::{export_csv, export_file_name, ExportError, CSV_DELIMITER};
pub use table::{entry_row, render_table, report_totals, ReportRow, ReportTotals};
