use comfy_table::{Cell, CellAlignment, Table};

use crate::document::{ReportDocument, ReportSummary};
use crate::money::format_money;

/// Render a report as plain text for printing.
pub fn render_text(doc: &ReportDocument) -> String {
    let mut out = String::new();

    out.push_str(&doc.header.company_name.to_uppercase());
    out.push('\n');
    if let Some(project) = &doc.header.project_name {
        out.push_str(project);
        out.push('\n');
    }
    if let Some(client) = &doc.header.client {
        out.push_str(client);
        out.push('\n');
    }
    out.push_str(&doc.title);
    out.push('\n');
    out.push_str(&format!("Issue date: {}\n", doc.header.issued_on.format("%Y-%m-%d")));
    if let Some(budget) = doc.header.budget {
        out.push_str(&format!("Contract budget: {}\n", format_money(budget)));
    }
    out.push('\n');

    if let Some(summary) = &doc.summary {
        out.push_str(&summary_table(summary).to_string());
        out.push_str("\n\n");
    }
    out.push_str(&rows_table(doc).to_string());
    out.push_str("\n\n");

    for line in &doc.signatures {
        out.push_str("______________________________\n");
        out.push_str(line);
        out.push_str("\n\n");
    }
    out.push_str(&doc.generated_line());
    out.push('\n');
    out
}

fn summary_table(s: &ReportSummary) -> Table {
    let mut table = Table::new();
    table.set_header(vec!["Total income", "Total expense", "Balance"]);
    table.add_row(vec![
        Cell::new(format!("+ {}", format_money(s.income))),
        Cell::new(format!("- {}", format_money(s.expense))),
        Cell::new(format_money(s.balance)),
    ]);
    if let Some(pct) = s.collection_percentage {
        table.add_row(vec![Cell::new("Collected"), Cell::new(format!("{pct:.2}%")), Cell::new("")]);
    }
    table
}

fn rows_table(doc: &ReportDocument) -> Table {
    let with_balance = doc.figures.includes_balances();
    let mut header = vec!["Date", "Project", "Description", "Charge", "Credit"];
    if with_balance {
        header.push("Balance");
    }

    let mut table = Table::new();
    table.set_header(header.clone());

    for row in &doc.rows {
        let description = match &row.notes {
            Some(notes) => format!("{}\n{}", row.description, notes),
            None => row.description.clone(),
        };
        let mut cells = vec![
            Cell::new(row.date.format("%Y-%m-%d")),
            Cell::new(row.project.to_uppercase()),
            Cell::new(description),
            money_cell(row.charge.map(format_money)),
            money_cell(row.credit.map(format_money)),
        ];
        if with_balance {
            cells.push(money_cell(row.balance.map(format_money)));
        }
        table.add_row(cells);
    }

    if doc.rows.is_empty() {
        let mut empty = vec![""; header.len()];
        empty[0] = "No transactions recorded.";
        table.add_row(empty);
    }
    table
}

fn money_cell(value: Option<String>) -> Cell {
    Cell::new(value.unwrap_or_default()).set_alignment(CellAlignment::Right)
}
