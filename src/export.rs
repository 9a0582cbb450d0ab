use crate::categories::{ExpenseView, ResolvedExpense};
use crate::errors::ClientError;
use crate::filters::total;
use crate::models::{Category, format_amount};
use crate::stats::category_breakdown;
use chrono::{DateTime, Utc};
use printpdf::{BuiltinFont, IndirectFontRef, Mm, PdfDocument, PdfDocumentReference, PdfLayerReference};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::io::BufWriter;

pub const CSV_HEADER: &str = "Date,Description,Category,Amount,Currency";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportFormat {
    #[default]
    Csv,
    Pdf,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportScope {
    All,
    #[default]
    Filtered,
}

#[derive(Debug)]
pub struct ExportFile {
    pub file_name: String,
    pub content_type: &'static str,
    pub bytes: Vec<u8>,
}

pub fn export(
    format: ExportFormat,
    expenses: &[ResolvedExpense<'_>],
    categories: &[Category],
    now: DateTime<Utc>,
) -> Result<ExportFile, ClientError> {
    if expenses.is_empty() {
        return Err(ClientError::validation("No data to export"));
    }
    let stamp = now.format("%Y-%m-%d");
    let file = match format {
        ExportFormat::Csv => ExportFile {
            file_name: format!("expenses_{stamp}.csv"),
            content_type: "text/csv",
            bytes: to_csv(expenses).into_bytes(),
        },
        ExportFormat::Json => ExportFile {
            file_name: format!("expenses_{stamp}.json"),
            content_type: "application/json",
            bytes: to_json_bundle(expenses, categories, now)?.into_bytes(),
        },
        ExportFormat::Pdf => ExportFile {
            file_name: format!("expense_report_{stamp}.pdf"),
            content_type: "application/pdf",
            bytes: to_pdf(expenses, now)?,
        },
    };
    Ok(file)
}

/// Header plus one line per expense, joined by `\n` without a trailing
/// newline.
pub fn to_csv(expenses: &[ResolvedExpense<'_>]) -> String {
    let mut lines = Vec::with_capacity(expenses.len() + 1);
    lines.push(CSV_HEADER.to_string());
    for resolved in expenses {
        let expense = resolved.expense;
        lines.push(format!(
            "{},{},{},{},{}",
            expense.date.format("%Y-%m-%d"),
            quote(&expense.description),
            quote(resolved.category.name()),
            format_amount(expense.amount),
            expense.currency,
        ));
    }
    lines.join("\n")
}

/// Quoted field on a single line: line breaks become spaces.
fn quote(field: &str) -> String {
    let flat = field.replace("\r\n", " ").replace(['\r', '\n'], " ");
    format!("\"{}\"", flat.replace('"', "\"\""))
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportBundle<'a> {
    export_date: DateTime<Utc>,
    #[serde(with = "rust_decimal::serde::float")]
    total_expenses: Decimal,
    transaction_count: usize,
    expenses: Vec<ExpenseView<'a>>,
    categories: &'a [Category],
}

pub fn to_json_bundle(
    expenses: &[ResolvedExpense<'_>],
    categories: &[Category],
    now: DateTime<Utc>,
) -> Result<String, ClientError> {
    let bundle = ExportBundle {
        export_date: now,
        total_expenses: total(expenses.iter().map(|r| r.expense)),
        transaction_count: expenses.len(),
        expenses: expenses.iter().map(ResolvedExpense::view).collect(),
        categories,
    };
    Ok(serde_json::to_string_pretty(&bundle)?)
}

const PAGE_WIDTH: f32 = 210.0;
const PAGE_HEIGHT: f32 = 297.0;
const TOP: f32 = 275.0;
const BOTTOM: f32 = 20.0;
const COLUMNS: [f32; 5] = [14.0, 38.0, 108.0, 150.0, 178.0];

struct PdfWriter {
    doc: PdfDocumentReference,
    layer: PdfLayerReference,
    font: IndirectFontRef,
    bold: IndirectFontRef,
    y: f32,
}

impl PdfWriter {
    fn new(title: &str) -> Result<Self, ClientError> {
        let (doc, page, layer) = PdfDocument::new(title, Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
        let layer = doc.get_page(page).get_layer(layer);
        let font = doc.add_builtin_font(BuiltinFont::Helvetica).map_err(pdf_error)?;
        let bold = doc
            .add_builtin_font(BuiltinFont::HelveticaBold)
            .map_err(pdf_error)?;
        Ok(Self {
            doc,
            layer,
            font,
            bold,
            y: TOP,
        })
    }

    fn line(&mut self, text: &str, size: f32, x: f32, bold: bool) {
        let font = if bold { &self.bold } else { &self.font };
        self.layer.use_text(text, size, Mm(x), Mm(self.y), font);
    }

    fn advance(&mut self, step: f32) {
        self.y -= step;
        if self.y < BOTTOM {
            let (page, layer) = self.doc.add_page(Mm(PAGE_WIDTH), Mm(PAGE_HEIGHT), "Layer 1");
            self.layer = self.doc.get_page(page).get_layer(layer);
            self.y = TOP;
        }
    }

    fn row(&mut self, cells: [&str; 5], bold: bool) {
        for (cell, x) in cells.iter().zip(COLUMNS) {
            self.line(cell, 8.0, x, bold);
        }
        self.advance(6.0);
    }

    fn finish(self) -> Result<Vec<u8>, ClientError> {
        let mut writer = BufWriter::new(Vec::<u8>::new());
        self.doc.save(&mut writer).map_err(pdf_error)?;
        writer.into_inner().map_err(|err| ClientError::Storage(err.to_string()))
    }
}

fn pdf_error(err: impl std::fmt::Display) -> ClientError {
    ClientError::Storage(format!("pdf generation failed: {err}"))
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let mut short: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    short.push_str("...");
    short
}

/// Report with summary totals, category breakdown and the full table.
pub fn to_pdf(expenses: &[ResolvedExpense<'_>], now: DateTime<Utc>) -> Result<Vec<u8>, ClientError> {
    let mut pdf = PdfWriter::new("Expense Report")?;

    pdf.line("Expense Report", 20.0, 14.0, true);
    pdf.advance(10.0);
    pdf.line(
        &format!("Generated on: {}", now.format("%Y-%m-%d %H:%M")),
        12.0,
        14.0,
        false,
    );
    pdf.advance(10.0);

    let sum = total(expenses.iter().map(|r| r.expense));
    pdf.line(&format!("Total Expenses: ${}", format_amount(sum)), 12.0, 14.0, false);
    pdf.advance(10.0);
    pdf.line(
        &format!("Number of Transactions: {}", expenses.len()),
        12.0,
        14.0,
        false,
    );
    pdf.advance(13.0);

    pdf.line("Category Breakdown:", 12.0, 14.0, true);
    pdf.advance(10.0);
    for entry in category_breakdown(expenses) {
        pdf.line(
            &format!(
                "{}: ${} ({:.1}%)",
                entry.name,
                format_amount(entry.amount),
                entry.percentage
            ),
            12.0,
            20.0,
            false,
        );
        pdf.advance(8.0);
    }
    pdf.advance(10.0);

    pdf.row(["Date", "Description", "Category", "Amount", "Currency"], true);
    for resolved in expenses {
        let expense = resolved.expense;
        let date = expense.date.format("%Y-%m-%d").to_string();
        let description = truncate(&expense.description, 38);
        let category = truncate(resolved.category.name(), 22);
        let amount = format!("${}", format_amount(expense.amount));
        pdf.row(
            [
                date.as_str(),
                description.as_str(),
                category.as_str(),
                amount.as_str(),
                expense.currency.as_str(),
            ],
            false,
        );
    }

    pdf.finish()
}
