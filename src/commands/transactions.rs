//! Handlers for `kasa list`, `kasa add` and `kasa delete`.
//!
//! Writes are followed by a full reload so that the totals reported afterwards always come from
//! the server's view of the ledger.

use crate::app::App;
use crate::commands::Out;
use crate::filter::{filter_transactions, Filter};
use crate::model::{NewTransaction, Transaction, TransactionId, TransactionType};
use crate::report::{self, OutputFormat};
use crate::stats::{compute_stats, DashboardStats};
use crate::Result;
use anyhow::Context;
use std::io::{BufRead, Write};
use tracing::info;

/// Handles `kasa list`: reloads and shows the transactions selected by `filter`, most recent
/// first.
pub async fn list(
    app: &mut App,
    filter: Filter,
    format: OutputFormat,
) -> Result<Out<Vec<Transaction>>> {
    let transactions = app.reload().await?;
    let selected = filter_transactions(transactions.data(), filter);
    let rendered = report::render_transactions(&selected, format)?;
    let message = format!(
        "Showing {} of {} transactions ({filter})",
        selected.len(),
        transactions.len()
    );
    let structure = selected.into_iter().cloned().collect();
    Ok(Out::new(message, structure).with_report(rendered))
}

/// Handles `kasa add`. The transaction is checked locally before it is sent.
pub async fn add(app: &mut App, transaction: NewTransaction) -> Result<Out<DashboardStats>> {
    transaction.validate(&app.config().categories())?;

    let result = match app.ledger() {
        Ok(mut ledger) => ledger.add_transaction(&transaction).await,
        Err(e) => Err(e),
    };
    app.guard(result)
        .await
        .with_context(|| format!("Unable to add '{}'", transaction.title()))?;
    info!("Added '{}'", transaction.title());

    let stats = refreshed_stats(app).await?;
    let message = format!(
        "Added '{}' ({}), balance is now {}",
        transaction.title(),
        transaction
            .amount()
            .signed(transaction.r#type() == TransactionType::Expense),
        stats.balance.with_symbol()
    );
    Ok(Out::new(message, stats))
}

/// Handles `kasa delete`.
pub async fn delete(app: &mut App, id: &TransactionId) -> Result<Out<DashboardStats>> {
    let result = match app.ledger() {
        Ok(mut ledger) => ledger.delete_transaction(id).await,
        Err(e) => Err(e),
    };
    app.guard(result)
        .await
        .with_context(|| format!("Unable to delete transaction {id}"))?;
    info!("Deleted transaction {id}");

    let stats = refreshed_stats(app).await?;
    let message = format!(
        "Deleted transaction {id}, balance is now {}",
        stats.balance.with_symbol()
    );
    Ok(Out::new(message, stats))
}

/// Asks on stderr whether transaction `id` should really be deleted and reads the answer from
/// `input`. Only an explicit yes (`y`, `yes`, `e`, `evet`) counts; anything else keeps the record.
pub fn confirm_delete(id: &TransactionId, mut input: impl BufRead) -> Result<bool> {
    eprint!("Delete transaction {id}? [y/N] ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    input
        .read_line(&mut line)
        .context("Unable to read the confirmation")?;
    let answer = line.trim().to_lowercase();
    Ok(matches!(answer.as_str(), "y" | "yes" | "e" | "evet"))
}

async fn refreshed_stats(app: &mut App) -> Result<DashboardStats> {
    let transactions = app.reload().await?;
    let config = app.config();
    Ok(compute_stats(
        transactions.data(),
        &config.categories(),
        config.category_sort(),
    ))
}
