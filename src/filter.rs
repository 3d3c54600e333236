use crate::model::{Transaction, TransactionType};
use serde::{Deserialize, Serialize};

/// Which transactions the table shows.
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
#[serde(rename_all = "snake_case")]
pub enum Filter {
    #[default]
    All,
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(Filter);
serde_plain::derive_fromstr_from_deserialize!(Filter);

impl Filter {
    pub fn matches(self, transaction: &Transaction) -> bool {
        match self {
            Filter::All => true,
            Filter::Income => transaction.r#type() == TransactionType::Income,
            Filter::Expense => transaction.r#type() == TransactionType::Expense,
        }
    }
}

/// Returns the transactions selected by `filter`, most recently received first. The input is
/// left untouched.
pub fn filter_transactions(transactions: &[Transaction], filter: Filter) -> Vec<&Transaction> {
    transactions
        .iter()
        .rev()
        .filter(|t| filter.matches(t))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ledger() -> Vec<Transaction> {
        vec![
            Transaction::new("1", "Ciro", 100, TransactionType::Income, "Ciro/Satış", None),
            Transaction::new("2", "Kira", 40, TransactionType::Expense, "Kira", None),
            Transaction::new("3", "Kira ek", 10, TransactionType::Expense, "Kira", None),
        ]
    }

    fn ids(items: &[&Transaction]) -> Vec<String> {
        items.iter().map(|t| t.id().to_string()).collect()
    }

    #[test]
    fn test_all_is_reversed() {
        let transactions = ledger();
        let filtered = filter_transactions(&transactions, Filter::All);
        assert_eq!(filtered.len(), transactions.len());
        assert_eq!(ids(&filtered), vec!["3", "2", "1"]);
    }

    #[test]
    fn test_income_only() {
        let transactions = ledger();
        let filtered = filter_transactions(&transactions, Filter::Income);
        assert_eq!(ids(&filtered), vec!["1"]);
        assert!(filtered.iter().all(|t| t.is_income()));
    }

    #[test]
    fn test_expense_returns_both_kira_items_newest_first() {
        let transactions = ledger();
        let filtered = filter_transactions(&transactions, Filter::Expense);
        assert_eq!(ids(&filtered), vec!["3", "2"]);
    }

    #[test]
    fn test_input_is_not_mutated() {
        let transactions = ledger();
        let before = transactions.clone();
        let _ = filter_transactions(&transactions, Filter::All);
        assert_eq!(transactions, before);
    }

    #[test]
    fn test_empty_input() {
        assert!(filter_transactions(&[], Filter::Expense).is_empty());
    }
}
