use crate::model::{Amount, Categories};
use crate::Result;
use anyhow::{bail, ensure};
use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::convert::Infallible;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::warn;

/// The server-assigned identifier of a transaction. The API may send it as a number or a string;
/// either way it is only ever compared and echoed back.
#[derive(Debug, Clone, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TransactionId(String);

impl TransactionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for TransactionId {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for TransactionId {
    type Err = Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Self(s.trim().to_string()))
    }
}

impl Serialize for TransactionId {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&self.0)
    }
}

impl<'de> Deserialize<'de> for TransactionId {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        match Value::deserialize(deserializer)? {
            Value::String(s) => Ok(Self(s)),
            Value::Number(n) => Ok(Self(n.to_string())),
            other => Err(serde::de::Error::custom(format!(
                "expected a string or number for a transaction id, got {other}"
            ))),
        }
    }
}

/// Whether money came in or went out. The amount itself is always a magnitude.
#[derive(
    Debug,
    Clone,
    Copy,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    Default,
    Serialize,
    Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
pub enum TransactionType {
    #[default]
    Income,
    Expense,
}

serde_plain::derive_display_from_serialize!(TransactionType);
serde_plain::derive_fromstr_from_deserialize!(TransactionType);

/// A single ledger entry as returned by the API:
/// `{"id", "title", "amount", "type", "category", "created_at"}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub(crate) id: TransactionId,
    pub(crate) title: String,
    #[serde(default)]
    pub(crate) amount: Amount,
    #[serde(rename = "type")]
    pub(crate) r#type: TransactionType,
    pub(crate) category: String,
    #[serde(
        default,
        deserialize_with = "deserialize_timestamp",
        skip_serializing_if = "Option::is_none"
    )]
    pub(crate) created_at: Option<DateTime<Utc>>,
}

impl Transaction {
    pub fn new(
        id: impl Into<String>,
        title: impl Into<String>,
        amount: impl Into<Amount>,
        r#type: TransactionType,
        category: impl Into<String>,
        created_at: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            id: TransactionId::new(id),
            title: title.into(),
            amount: amount.into(),
            r#type,
            category: category.into(),
            created_at,
        }
    }

    pub fn id(&self) -> &TransactionId {
        &self.id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn r#type(&self) -> TransactionType {
        self.r#type
    }

    pub fn is_income(&self) -> bool {
        self.r#type == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.r#type == TransactionType::Expense
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// The creation time reported by the server. `None` means the server left it out, which is a
    /// data problem; it is never replaced with the current time.
    pub fn created_at(&self) -> Option<DateTime<Utc>> {
        self.created_at
    }
}

/// The transactions returned by the API, in arrival order.
#[derive(Default, Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Transactions(Vec<Transaction>);

impl Transactions {
    pub fn new(data: Vec<Transaction>) -> Self {
        Self(data)
    }

    /// Parses the body of a `GET /transactions` response.
    pub fn from_json(body: &str) -> Result<Self> {
        let transactions: Transactions = serde_json::from_str(body)?;
        transactions.report_missing_timestamps();
        Ok(transactions)
    }

    pub fn data(&self) -> &[Transaction] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn into_inner(self) -> Vec<Transaction> {
        self.0
    }

    /// Logs each record that arrived without a creation timestamp.
    pub(crate) fn report_missing_timestamps(&self) -> usize {
        let missing: Vec<&TransactionId> = self
            .0
            .iter()
            .filter(|t| t.created_at.is_none())
            .map(|t| &t.id)
            .collect();
        for id in &missing {
            warn!("Transaction {id} has no creation timestamp");
        }
        missing.len()
    }
}

impl From<Vec<Transaction>> for Transactions {
    fn from(value: Vec<Transaction>) -> Self {
        Self(value)
    }
}

/// The body of a `POST /transactions` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub(crate) title: String,
    pub(crate) amount: Amount,
    #[serde(rename = "type")]
    pub(crate) r#type: TransactionType,
    pub(crate) category: String,
}

impl NewTransaction {
    pub fn new(
        title: impl Into<String>,
        amount: impl Into<Amount>,
        r#type: TransactionType,
        category: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into().trim().to_string(),
            amount: amount.into(),
            r#type,
            category: category.into(),
        }
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn amount(&self) -> Amount {
        self.amount
    }

    pub fn r#type(&self) -> TransactionType {
        self.r#type
    }

    pub fn category(&self) -> &str {
        &self.category
    }

    /// Checks the entry before it is sent: the title must not be blank, the amount must not be
    /// negative, and the category must be one of `categories`.
    pub fn validate(&self, categories: &Categories) -> Result<()> {
        ensure!(!self.title.is_empty(), "A transaction needs a title");
        ensure!(
            !self.amount.is_negative(),
            "The amount must not be negative, use the transaction type for the direction"
        );
        if !categories.contains(&self.category) {
            let known: Vec<&str> = categories.iter().collect();
            bail!(
                "Unknown category '{}', expected one of: {}",
                self.category,
                known.join(", ")
            );
        }
        Ok(())
    }
}

/// Accepts RFC 3339 timestamps as well as the naive `YYYY-MM-DDTHH:MM:SS[.f]` form that many
/// Python backends emit, which is taken to be UTC. Anything else is treated as missing.
fn deserialize_timestamp<'de, D>(deserializer: D) -> std::result::Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    Ok(raw.and_then(|s| {
        let parsed = parse_timestamp(&s);
        if parsed.is_none() {
            warn!("Ignoring the unreadable timestamp '{s}'");
        }
        parsed
    }))
}

fn parse_timestamp(s: &str) -> Option<DateTime<Utc>> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(s, fmt).ok())
        .map(|naive| naive.and_utc())
}
