use caixa_core::{LedgerEntry, Money, Summary};

pub const COLUMN_TITLES: [&str; 6] =
    ["Data", "Tipo", "Categoria", "Descricao", "Pagamento", "Valor"];

/// One exported/displayed line: timestamp, type label, category, description,
/// payment label, amount.
pub type ReportRow = [String; 6];

/// Totals shown alongside the report table. Computed by the same fold as the
/// on-screen summary cards, so the two can never disagree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportTotals {
    pub total_in: Money,
    pub total_out: Money,
    pub net: Money,
}

pub fn report_totals(entries: &[LedgerEntry]) -> ReportTotals {
    let summary = Summary::from_entries(entries);
    ReportTotals {
        total_in: summary.total_in,
        total_out: summary.total_out,
        net: summary.balance,
    }
}

pub fn entry_row(entry: &LedgerEntry) -> ReportRow {
    [
        entry.created_at.format("%d/%m/%Y %H:%M").to_string(),
        entry.entry_type.label().to_string(),
        entry.category.clone().unwrap_or_default(),
        entry.description.clone(),
        entry.payment_method.map(|pm| pm.label().to_string()).unwrap_or_default(),
        entry.amount.to_string(),
    ]
}

/// Print-ready rendition of the filtered result set with its totals.
pub fn render_table(entries: &[LedgerEntry]) -> String {
    let rows: Vec<ReportRow> = entries.iter().map(entry_row).collect();

    let mut widths: Vec<usize> = COLUMN_TITLES.iter().map(|t| t.chars().count()).collect();
    for row in &rows {
        for (i, field) in row.iter().enumerate() {
            widths[i] = widths[i].max(field.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &COLUMN_TITLES.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }

    let totals = report_totals(entries);
    out.push('\n');
    out.push_str(&format!("Entradas: {}\n", totals.total_in));
    out.push_str(&format!("Saídas:   {}\n", totals.total_out));
    out.push_str(&format!("Saldo:    {}\n", totals.net));
    out
}

fn push_row(out: &mut String, row: &[String; 6], widths: &[usize]) {
    for (i, field) in row.iter().enumerate() {
        let pad = widths[i] - field.chars().count();
        out.push_str(field);
        for _ in 0..pad {
            out.push(' ');
        }
        if i < row.len() - 1 {
            out.push_str("  ");
        }
    }
    out.push('\n');
}
