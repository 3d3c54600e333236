//! Types that represent the ledger data model, such as `Transaction` and `Amount`.
mod amount;
mod category;
mod transaction;

pub use amount::{Amount, AmountError, CURRENCY_SYMBOL};
pub use category::{Categories, DEFAULT_CATEGORIES};
pub use transaction::{NewTransaction, Transaction, TransactionId, TransactionType, Transactions};
