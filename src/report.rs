//! Renders the dashboard and the transaction table for the terminal, or as JSON or CSV.

use crate::model::{Amount, Transaction};
use crate::stats::{BarBase, DashboardStats};
use crate::Result;
use anyhow::Context;
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Write;

const BAR_WIDTH: usize = 20;
const BAR_FILLED: char = '█';
const BAR_EMPTY: char = '░';
const UNKNOWN_DATE: &str = "unknown";

/// The output format of a report.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Aligned text for reading in a terminal.
    #[default]
    Table,
    /// Pretty-printed JSON.
    Json,
    /// Comma-separated values with a header row.
    Csv,
}

serde_plain::derive_display_from_serialize!(OutputFormat);
serde_plain::derive_fromstr_from_deserialize!(OutputFormat);

#[derive(Serialize)]
struct DashboardJson<'a> {
    #[serde(flatten)]
    stats: &'a DashboardStats,
    bar_base: BarBase,
    bars: Vec<BarJson<'a>>,
}

#[derive(Serialize)]
struct BarJson<'a> {
    name: &'a str,
    percent: f64,
}

/// Renders the income, expense and balance cards followed by one bar per category.
pub fn render_dashboard(
    stats: &DashboardStats,
    base: BarBase,
    format: OutputFormat,
) -> Result<String> {
    match format {
        OutputFormat::Table => dashboard_table(stats, base),
        OutputFormat::Json => {
            let json = DashboardJson {
                stats,
                bar_base: base,
                bars: stats
                    .category_totals
                    .iter()
                    .map(|c| BarJson {
                        name: &c.name,
                        percent: percent_f64(stats.share(c.total, base)),
                    })
                    .collect(),
            };
            serde_json::to_string_pretty(&json).context("Unable to serialize the dashboard")
        }
        OutputFormat::Csv => {
            let mut rows = vec![
                csv_row(["summary", "income", &plain(stats.income), ""]),
                csv_row(["summary", "expense", &plain(stats.expense), ""]),
                csv_row(["summary", "balance", &plain(stats.balance), ""]),
            ];
            for c in &stats.category_totals {
                let percent = stats.share(c.total, base).round_dp(2).normalize().to_string();
                rows.push(csv_row(["category", &c.name, &plain(c.total), &percent]));
            }
            write_csv(["kind", "name", "total", "percent"], rows)
        }
    }
}

fn dashboard_table(stats: &DashboardStats, base: BarBase) -> Result<String> {
    let cards = [
        ("TOTAL INCOME", stats.income),
        ("TOTAL EXPENSE", stats.expense),
        ("NET BALANCE", stats.balance),
    ];
    let amount_width = cards
        .iter()
        .map(|(_, a)| a.with_symbol().chars().count())
        .max()
        .unwrap_or_default();

    let mut out = String::new();
    for (label, amount) in cards {
        writeln!(out, "{label:<15}{:>amount_width$}", amount.with_symbol())?;
    }

    out.push('\n');
    if stats.category_totals.is_empty() {
        out.push_str("No category totals yet.\n");
        return Ok(out);
    }

    writeln!(out, "Categories (bars relative to total {base})")?;
    let name_width = stats
        .category_totals
        .iter()
        .map(|c| c.name.chars().count())
        .max()
        .unwrap_or_default();
    let total_width = stats
        .category_totals
        .iter()
        .map(|c| c.total.with_symbol().chars().count())
        .max()
        .unwrap_or_default();
    for c in &stats.category_totals {
        let share = stats.share(c.total, base);
        writeln!(
            out,
            "{:<name_width$}  {}  {:>total_width$}  {:>4}",
            c.name,
            bar(share),
            c.total.with_symbol(),
            format!("{}%", share.round_dp(0).normalize()),
        )?;
    }
    Ok(out)
}

/// A fixed-width bar filled in proportion to `percent` (0 to 100).
fn bar(percent: Decimal) -> String {
    let filled = (percent * Decimal::from(BAR_WIDTH) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or_default()
        .min(BAR_WIDTH);
    let mut s = String::with_capacity(BAR_WIDTH * 3);
    s.extend(std::iter::repeat(BAR_FILLED).take(filled));
    s.extend(std::iter::repeat(BAR_EMPTY).take(BAR_WIDTH - filled));
    s
}

/// Renders the transaction table, one row per transaction in the order given.
pub fn render_transactions(transactions: &[&Transaction], format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Table => transactions_table(transactions),
        OutputFormat::Json => serde_json::to_string_pretty(transactions)
            .context("Unable to serialize the transactions"),
        OutputFormat::Csv => {
            let rows = transactions
                .iter()
                .map(|t| {
                    csv_row([
                        t.id().as_str(),
                        &t.created_at().map(|d| d.to_rfc3339()).unwrap_or_default(),
                        t.title(),
                        t.category(),
                        &t.r#type().to_string(),
                        &plain(t.amount()),
                    ])
                })
                .collect();
            write_csv(["id", "date", "title", "category", "type", "amount"], rows)
        }
    }
}

fn transactions_table(transactions: &[&Transaction]) -> Result<String> {
    if transactions.is_empty() {
        return Ok("No transactions.\n".to_string());
    }

    let rows: Vec<[String; 5]> = transactions
        .iter()
        .map(|t| {
            [
                display_date(t),
                t.title().to_string(),
                t.category().to_string(),
                t.amount().signed(t.is_expense()),
                t.id().to_string(),
            ]
        })
        .collect();
    let headers = ["DATE", "TITLE", "CATEGORY", "AMOUNT", "ID"];

    let mut widths = headers.map(|h| h.chars().count());
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }
    let [w_date, w_title, w_category, w_amount, _] = widths;

    let mut out = String::new();
    writeln!(
        out,
        "{:<w_date$}  {:<w_title$}  {:<w_category$}  {:>w_amount$}  {}",
        headers[0], headers[1], headers[2], headers[3], headers[4]
    )?;
    for [date, title, category, amount, id] in &rows {
        writeln!(
            out,
            "{date:<w_date$}  {title:<w_title$}  {category:<w_category$}  {amount:>w_amount$}  {id}"
        )?;
    }
    Ok(out)
}

/// The UTC calendar date of a transaction, or `unknown` when the server did not send one.
pub fn display_date(transaction: &Transaction) -> String {
    transaction
        .created_at()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

fn plain(amount: Amount) -> String {
    amount.value().normalize().to_string()
}

fn percent_f64(percent: Decimal) -> f64 {
    percent.round_dp(2).to_f64().unwrap_or_default()
}

fn csv_row<const N: usize>(cells: [&str; N]) -> Vec<String> {
    cells.map(str::to_string).to_vec()
}

fn write_csv<'a>(
    headers: impl IntoIterator<Item = &'a str>,
    rows: Vec<Vec<String>>,
) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    writer.write_record(headers)?;
    for row in rows {
        writer.write_record(&row)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("Unable to finish writing CSV: {e}"))?;
    String::from_utf8(bytes).context("CSV output was not valid UTF-8")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{Categories, TransactionType};
    use crate::stats::{compute_stats, CategorySortOrder};
    use chrono::{TimeZone, Utc};

    fn ledger() -> Vec<Transaction> {
        let at = Utc.with_ymd_and_hms(2025, 10, 1, 12, 0, 0).unwrap();
        vec![
            Transaction::new("1", "Satış", 100, TransactionType::Income, "Ciro/Satış", Some(at)),
            Transaction::new("2", "Kira", 40, TransactionType::Expense, "Kira", Some(at)),
            Transaction::new("3", "Kira ek", 10, TransactionType::Expense, "Kira", None),
        ]
    }

    fn stats() -> DashboardStats {
        compute_stats(&ledger(), &Categories::default(), CategorySortOrder::Declaration)
    }

    #[test]
    fn test_bar() {
        assert_eq!(bar(Decimal::ZERO), "░".repeat(20));
        assert_eq!(bar(Decimal::ONE_HUNDRED), "█".repeat(20));
        assert_eq!(bar(Decimal::from(50)), format!("{}{}", "█".repeat(10), "░".repeat(10)));
        assert_eq!(bar(Decimal::from(1000)), "█".repeat(20));
    }

    #[test]
    fn test_dashboard_table() {
        let out = render_dashboard(&stats(), BarBase::Income, OutputFormat::Table).unwrap();
        assert!(out.contains("TOTAL INCOME"));
        assert!(out.contains("100.00 ₺"));
        assert!(out.contains("50.00 ₺"));
        assert!(out.contains("Categories (bars relative to total income)"));
        let kira = out.lines().find(|l| l.starts_with("Kira")).unwrap();
        assert!(kira.contains(" 50%"));
        assert!(kira.contains(&format!("{}{}", "█".repeat(10), "░".repeat(10))));
    }

    #[test]
    fn test_dashboard_table_empty() {
        let out = render_dashboard(
            &DashboardStats::default(),
            BarBase::Income,
            OutputFormat::Table,
        )
        .unwrap();
        assert!(out.contains("No category totals yet."));
        assert!(out.contains("0.00 ₺"));
    }

    #[test]
    fn test_dashboard_json() {
        let out = render_dashboard(&stats(), BarBase::Expense, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["income"], 100);
        assert_eq!(value["expense"], 50);
        assert_eq!(value["balance"], 50);
        assert_eq!(value["bar_base"], "expense");
        assert_eq!(value["category_totals"][1]["name"], "Kira");
        assert_eq!(value["bars"][0]["percent"], 100.0);
        assert_eq!(value["bars"][1]["percent"], 100.0);
    }

    #[test]
    fn test_dashboard_csv() {
        let out = render_dashboard(&stats(), BarBase::Income, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "kind,name,total,percent");
        assert_eq!(lines[1], "summary,income,100,");
        assert_eq!(lines[3], "summary,balance,50,");
        assert_eq!(lines[5], "category,Kira,50,50");
    }

    #[test]
    fn test_transactions_table() {
        let transactions = ledger();
        let items: Vec<&Transaction> = transactions.iter().rev().collect();
        let out = render_transactions(&items, OutputFormat::Table).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert!(lines[0].starts_with("DATE"));
        assert!(lines[1].starts_with("unknown"));
        assert!(lines[1].contains("-10.00 ₺"));
        assert!(lines[3].starts_with("2025-10-01"));
        assert!(lines[3].contains("+100.00 ₺"));
        assert!(lines[3].ends_with('1'));
    }

    #[test]
    fn test_transactions_empty() {
        let out = render_transactions(&[], OutputFormat::Table).unwrap();
        assert_eq!(out, "No transactions.\n");
    }

    #[test]
    fn test_transactions_csv() {
        let transactions = ledger();
        let items: Vec<&Transaction> = transactions.iter().collect();
        let out = render_transactions(&items, OutputFormat::Csv).unwrap();
        let lines: Vec<&str> = out.lines().collect();
        assert_eq!(lines[0], "id,date,title,category,type,amount");
        assert_eq!(
            lines[1],
            "1,2025-10-01T12:00:00+00:00,Satış,Ciro/Satış,income,100"
        );
        assert_eq!(lines[3], "3,,Kira ek,Kira,expense,10");
    }

    #[test]
    fn test_transactions_json() {
        let transactions = ledger();
        let items: Vec<&Transaction> = transactions.iter().collect();
        let out = render_transactions(&items, OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value[0]["id"], "1");
        assert_eq!(value[0]["type"], "income");
        assert!(value[2].get("created_at").is_none());
    }
}
