//! Derives the dashboard figures from a list of transactions.
//!
//! Income and expense totals are split by transaction type, while the category breakdown is not:
//! an income and an expense filed under the same category land in the same bucket. Everything is
//! recomputed from scratch on every call.

use crate::model::{Amount, Categories, Transaction};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// The order in which category totals are listed.
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
pub enum CategorySortOrder {
    /// The order of the configured category list.
    #[default]
    Declaration,
    /// Largest total first. Equal totals keep their declaration order.
    Descending,
}

serde_plain::derive_display_from_serialize!(CategorySortOrder);
serde_plain::derive_fromstr_from_deserialize!(CategorySortOrder);

/// The total that category bars are measured against.
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
pub enum BarBase {
    #[default]
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(BarBase);
serde_plain::derive_fromstr_from_deserialize!(BarBase);

/// The summed amount of one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryTotal {
    pub name: String,
    pub total: Amount,
}

/// The figures shown on the dashboard.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DashboardStats {
    pub income: Amount,
    pub expense: Amount,
    pub balance: Amount,
    /// Categories with a total above zero.
    pub category_totals: Vec<CategoryTotal>,
}

impl DashboardStats {
    /// The total that bars are divided by for the given `base`.
    pub fn base_total(&self, base: BarBase) -> Amount {
        match base {
            BarBase::Income => self.income,
            BarBase::Expense => self.expense,
        }
    }

    /// The width of a category bar as a percentage of the chosen base total.
    pub fn share(&self, category_total: Amount, base: BarBase) -> Decimal {
        bar_share(category_total, self.base_total(base))
    }
}

/// Computes income, expense, balance and the per-category totals.
///
/// Category totals cover every category in `categories`, summed across transactions of both
/// types, and only those above zero are kept. Transactions whose category is not in the list still
/// count toward income and expense.
pub fn compute_stats(
    transactions: &[Transaction],
    categories: &Categories,
    sort_order: CategorySortOrder,
) -> DashboardStats {
    let income: Amount = transactions
        .iter()
        .filter(|t| t.is_income())
        .map(Transaction::amount)
        .sum();
    let expense: Amount = transactions
        .iter()
        .filter(|t| t.is_expense())
        .map(Transaction::amount)
        .sum();

    let mut category_totals: Vec<CategoryTotal> = categories
        .iter()
        .map(|name| CategoryTotal {
            name: name.to_string(),
            total: transactions
                .iter()
                .filter(|t| t.category() == name)
                .map(Transaction::amount)
                .sum(),
        })
        .filter(|c| c.total.is_positive())
        .collect();

    if sort_order == CategorySortOrder::Descending {
        // sort_by is stable
        category_totals.sort_by(|a, b| b.total.cmp(&a.total));
    }

    DashboardStats {
        income,
        expense,
        balance: income - expense,
        category_totals,
    }
}

/// `total` as a percentage of `base`, capped at 100. A zero base is replaced by 1.
pub fn bar_share(total: Amount, base: Amount) -> Decimal {
    let divisor = if base.is_zero() {
        Decimal::ONE
    } else {
        base.value()
    };
    // a quotient too large to represent is far past the cap
    total
        .value()
        .checked_div(divisor)
        .and_then(|ratio| ratio.checked_mul(Decimal::ONE_HUNDRED))
        .unwrap_or(Decimal::ONE_HUNDRED)
        .min(Decimal::ONE_HUNDRED)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{TransactionType, Transactions};
    use std::str::FromStr;

    fn tx(id: u32, r#type: TransactionType, amount: i64, category: &str) -> Transaction {
        Transaction::new(id.to_string(), format!("t{id}"), amount, r#type, category, None)
    }

    fn scenario() -> Vec<Transaction> {
        vec![
            tx(1, TransactionType::Income, 100, "Ciro/Satış"),
            tx(2, TransactionType::Expense, 40, "Kira"),
            tx(3, TransactionType::Expense, 10, "Kira"),
        ]
    }

    fn names(stats: &DashboardStats) -> Vec<&str> {
        stats.category_totals.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_list() {
        let stats = compute_stats(&[], &Categories::default(), CategorySortOrder::Declaration);
        assert_eq!(stats, DashboardStats::default());
        assert!(stats.category_totals.is_empty());
        assert!(stats.balance.is_zero());
    }

    #[test]
    fn test_scenario_totals() {
        let stats = compute_stats(
            &scenario(),
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(stats.income, Amount::from(100));
        assert_eq!(stats.expense, Amount::from(50));
        assert_eq!(stats.balance, Amount::from(50));
        assert_eq!(
            stats.category_totals,
            vec![
                CategoryTotal {
                    name: "Ciro/Satış".to_string(),
                    total: Amount::from(100)
                },
                CategoryTotal {
                    name: "Kira".to_string(),
                    total: Amount::from(50)
                },
            ]
        );
    }

    #[test]
    fn test_numeric_string_amount_is_coerced() {
        let json = r#"[{"id": 1, "title": "Market", "amount": "30", "type": "expense",
            "category": "Mutfak/Gıda"}]"#;
        let transactions = Transactions::from_json(json).unwrap();
        let stats = compute_stats(
            transactions.data(),
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(stats.expense, Amount::from(30));
        assert_eq!(stats.balance, Amount::from(-30));
    }

    #[test]
    fn test_malformed_amount_contributes_zero() {
        let json = r#"[
            {"id": 1, "title": "a", "amount": "abc", "type": "expense", "category": "Kira"},
            {"id": 2, "title": "b", "amount": 25, "type": "expense", "category": "Kira"}
        ]"#;
        let transactions = Transactions::from_json(json).unwrap();
        let stats = compute_stats(
            transactions.data(),
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(stats.expense, Amount::from(25));
        assert_eq!(stats.category_totals[0].total, Amount::from(25));
    }

    #[test]
    fn test_category_totals_ignore_type() {
        let transactions = vec![
            tx(1, TransactionType::Income, 70, "Kira"),
            tx(2, TransactionType::Expense, 30, "Kira"),
        ];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(stats.income, Amount::from(70));
        assert_eq!(stats.expense, Amount::from(30));
        assert_eq!(stats.category_totals.len(), 1);
        assert_eq!(stats.category_totals[0].total, Amount::from(100));
    }

    #[test]
    fn test_zero_categories_are_absent() {
        let transactions = vec![
            tx(1, TransactionType::Expense, 0, "Elektrik"),
            tx(2, TransactionType::Expense, 5, "Su/Doğalgaz"),
        ];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(names(&stats), vec!["Su/Doğalgaz"]);
    }

    #[test]
    fn test_unlisted_category_counts_only_toward_totals() {
        let transactions = vec![tx(1, TransactionType::Expense, 12, "Vergi")];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(stats.expense, Amount::from(12));
        assert!(stats.category_totals.is_empty());
    }

    #[test]
    fn test_declaration_order() {
        let transactions = vec![
            tx(1, TransactionType::Expense, 5, "Diğer"),
            tx(2, TransactionType::Expense, 500, "Maaş"),
            tx(3, TransactionType::Income, 50, "Ciro/Satış"),
        ];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        assert_eq!(names(&stats), vec!["Ciro/Satış", "Maaş", "Diğer"]);
    }

    #[test]
    fn test_descending_order_is_stable_on_ties() {
        let transactions = vec![
            tx(1, TransactionType::Expense, 5, "Diğer"),
            tx(2, TransactionType::Expense, 500, "Maaş"),
            tx(3, TransactionType::Expense, 5, "Elektrik"),
            tx(4, TransactionType::Income, 50, "Ciro/Satış"),
        ];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Descending,
        );
        assert_eq!(names(&stats), vec!["Maaş", "Ciro/Satış", "Elektrik", "Diğer"]);
    }

    #[test]
    fn test_income_plus_expense_is_total() {
        let transactions = vec![
            tx(1, TransactionType::Income, 120, "Ciro/Satış"),
            tx(2, TransactionType::Expense, 35, "Mal Alımı"),
            tx(3, TransactionType::Income, 15, "Diğer"),
            tx(4, TransactionType::Expense, 60, "Maaş"),
        ];
        let stats = compute_stats(
            &transactions,
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        let total: Amount = transactions.iter().map(Transaction::amount).sum();
        assert_eq!(stats.income + stats.expense, total);
        assert_eq!(stats.balance, stats.income - stats.expense);
    }

    #[test]
    fn test_idempotent() {
        let transactions = scenario();
        let categories = Categories::default();
        let first = compute_stats(&transactions, &categories, CategorySortOrder::Descending);
        let second = compute_stats(&transactions, &categories, CategorySortOrder::Descending);
        assert_eq!(first, second);
    }

    #[test]
    fn test_bar_share() {
        assert_eq!(
            bar_share(Amount::from(25), Amount::from(100)),
            Decimal::from(25)
        );
        // capped
        assert_eq!(
            bar_share(Amount::from(300), Amount::from(100)),
            Decimal::ONE_HUNDRED
        );
        // zero base divides by one
        assert_eq!(
            bar_share(Amount::new(Decimal::from_str("0.5").unwrap()), Amount::ZERO),
            Decimal::from(50)
        );
        assert_eq!(bar_share(Amount::from(3), Amount::ZERO), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_share_uses_configured_base() {
        let stats = compute_stats(
            &scenario(),
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        let kira = stats.category_totals[1].total;
        assert_eq!(stats.share(kira, BarBase::Income), Decimal::from(50));
        assert_eq!(stats.share(kira, BarBase::Expense), Decimal::ONE_HUNDRED);
    }

    #[test]
    fn test_huge_amounts_saturate() {
        let body = r#"[
            {"id": 1, "title": "a", "amount": "50000000000000000000000000000", "type": "income", "category": "Ciro/Satış"},
            {"id": 2, "title": "b", "amount": "50000000000000000000000000000", "type": "income", "category": "Ciro/Satış"},
            {"id": 3, "title": "c", "amount": 10, "type": "expense", "category": "Kira"}
        ]"#;
        let transactions = Transactions::from_json(body).unwrap();
        let stats = compute_stats(
            transactions.data(),
            &Categories::default(),
            CategorySortOrder::Descending,
        );
        assert_eq!(stats.income, Amount::new(Decimal::MAX));
        assert_eq!(stats.category_totals[0].total, Amount::new(Decimal::MAX));
        assert_eq!(stats.balance, Amount::new(Decimal::MAX - Decimal::from(10)));
    }

    #[test]
    fn test_share_of_tiny_base_is_capped() {
        let body = r#"[
            {"id": 1, "title": "a", "amount": "0.0001", "type": "income", "category": "Ciro/Satış"},
            {"id": 2, "title": "b", "amount": "10000000000000000000000000", "type": "expense", "category": "Kira"}
        ]"#;
        let transactions = Transactions::from_json(body).unwrap();
        let stats = compute_stats(
            transactions.data(),
            &Categories::default(),
            CategorySortOrder::Declaration,
        );
        let kira = stats.category_totals[1].total;
        assert_eq!(stats.share(kira, BarBase::Income), Decimal::ONE_HUNDRED);
        assert_eq!(
            bar_share(Amount::new(Decimal::MAX), Amount::new(Decimal::from_str("0.5").unwrap())),
            Decimal::ONE_HUNDRED
        );
    }

    #[test]
    fn test_sort_order_parse() {
        assert_eq!(
            CategorySortOrder::from_str("descending").unwrap(),
            CategorySortOrder::Descending
        );
        assert_eq!(BarBase::Expense.to_string(), "expense");
    }
}
