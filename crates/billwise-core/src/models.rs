//! Domain models for Billwise

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::{Error, Result};

/// Category used when a record has no (or an empty) category
pub const DEFAULT_CATEGORY: &str = "Other";

/// Merchant used when bill extraction cannot read one
pub const UNKNOWN_MERCHANT: &str = "Unknown";

/// Categories the bill extraction prompt asks the model to choose from
pub const KNOWN_CATEGORIES: &[&str] = &[
    "Groceries",
    "Transport",
    "Food",
    "Shopping",
    "Utilities",
    "Entertainment",
    "Healthcare",
    "Other",
];

/// Whether money went out or came in
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionType {
    #[default]
    Expense,
    Income,
}

impl TransactionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Expense => "expense",
            Self::Income => "income",
        }
    }
}

impl std::str::FromStr for TransactionType {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "expense" => Ok(Self::Expense),
            "income" => Ok(Self::Income),
            _ => Err(format!("Unknown transaction type: {}", s)),
        }
    }
}

impl std::fmt::Display for TransactionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A line item on a bill
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BillItem {
    #[serde(default)]
    pub name: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub price: f64,
}

/// One recorded purchase (or income event) in the ledger
///
/// Every field is optional on input so that partially-formed records from
/// storage or the API still load; the insights engine degrades gracefully
/// on whatever is missing. A field of the wrong JSON type is coerced or
/// dropped, never the whole record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Storage-assigned identifier
    #[serde(
        default,
        deserialize_with = "deserialize_optional_id",
        skip_serializing_if = "Option::is_none"
    )]
    pub id: Option<i64>,
    /// Magnitude of the purchase; absent counts as zero
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_text")]
    pub category: Option<String>,
    /// When the record was saved (ISO-8601); preferred over `date`
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub timestamp: Option<String>,
    /// Purchase date as printed on the bill (ISO-8601)
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub date: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_optional_text",
        skip_serializing_if = "Option::is_none"
    )]
    pub merchant: Option<String>,
    #[serde(
        default,
        deserialize_with = "deserialize_items",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub items: Vec<BillItem>,
    #[serde(
        rename = "type",
        default,
        deserialize_with = "deserialize_transaction_type"
    )]
    pub transaction_type: TransactionType,
}

impl TransactionRecord {
    /// Amount contributed to totals (missing amounts count as zero)
    pub fn amount(&self) -> f64 {
        self.total_amount.unwrap_or(0.0)
    }

    /// Category label, falling back to "Other" when missing or blank
    pub fn category_label(&self) -> &str {
        match self.category.as_deref().map(str::trim) {
            Some(c) if !c.is_empty() => c,
            _ => DEFAULT_CATEGORY,
        }
    }

    /// The date string used for time windows: `timestamp` first, then `date`
    pub fn date_field(&self) -> Option<&str> {
        self.timestamp
            .as_deref()
            .filter(|s| !s.trim().is_empty())
            .or(self.date.as_deref())
    }
}

/// A transaction to be saved (before the store assigns id and timestamp)
///
/// Accepts either `total_amount` or `amount`; the web form sends the latter.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NewTransaction {
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub total_amount: Option<f64>,
    #[serde(default, deserialize_with = "deserialize_optional_amount")]
    pub amount: Option<f64>,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default)]
    pub merchant: Option<String>,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(rename = "type", default)]
    pub transaction_type: TransactionType,
    #[serde(default)]
    pub items: Vec<BillItem>,
}

impl NewTransaction {
    /// The amount to store: `total_amount` wins over `amount`
    pub fn resolved_amount(&self) -> Option<f64> {
        self.total_amount.or(self.amount)
    }

    /// Reject amounts that cannot be a purchase magnitude
    pub fn validate(&self) -> Result<()> {
        if let Some(amount) = self.resolved_amount() {
            if !amount.is_finite() {
                return Err(Error::InvalidData("Amount must be a finite number".into()));
            }
            if amount < 0.0 {
                return Err(Error::InvalidData("Amount must not be negative".into()));
            }
        }
        Ok(())
    }

    /// Build the stored record once the store has picked an id and timestamp
    pub fn into_record(self, id: i64, timestamp: String) -> TransactionRecord {
        let total_amount = self.resolved_amount();
        TransactionRecord {
            id: Some(id),
            total_amount,
            category: self.category.filter(|c| !c.trim().is_empty()),
            timestamp: Some(timestamp),
            date: self.date.filter(|d| !d.trim().is_empty()),
            merchant: self.merchant.filter(|m| !m.trim().is_empty()),
            items: self.items,
            transaction_type: self.transaction_type,
        }
    }
}

impl From<BillData> for NewTransaction {
    fn from(bill: BillData) -> Self {
        Self {
            total_amount: Some(bill.total_amount),
            amount: None,
            date: Some(bill.date),
            merchant: Some(bill.merchant),
            category: Some(bill.category),
            transaction_type: TransactionType::Expense,
            items: bill.items,
        }
    }
}

/// Structured purchase data extracted from a bill image
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BillData {
    #[serde(default)]
    pub date: String,
    #[serde(default = "default_merchant")]
    pub merchant: String,
    #[serde(default = "default_category")]
    pub category: String,
    #[serde(default, deserialize_with = "deserialize_amount")]
    pub total_amount: f64,
    #[serde(default)]
    pub items: Vec<BillItem>,
}

fn default_merchant() -> String {
    UNKNOWN_MERCHANT.to_string()
}

fn default_category() -> String {
    DEFAULT_CATEGORY.to_string()
}

/// Current local time formatted the way stored timestamps are written
pub fn now_timestamp() -> String {
    chrono::Local::now()
        .naive_local()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

/// Models sometimes quote numbers ("12.50") or emit null; accept both
fn deserialize_optional_amount<'de, D>(deserializer: D) -> std::result::Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(amount_from_value))
}

fn deserialize_amount<'de, D>(deserializer: D) -> std::result::Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(deserialize_optional_amount(deserializer)?.unwrap_or(0.0))
}

fn amount_from_value(value: &serde_json::Value) -> Option<f64> {
    match value {
        serde_json::Value::Number(n) => n.as_f64(),
        serde_json::Value::String(s) => s
            .trim()
            .trim_start_matches(['$', '₹', '€', '£'])
            .replace(',', "")
            .parse::<f64>()
            .ok(),
        _ => None,
    }
    .filter(|v| v.is_finite())
}

/// Strings pass through; numbers and booleans keep their JSON text
fn deserialize_optional_text<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(v @ (serde_json::Value::Number(_) | serde_json::Value::Bool(_))) => Some(v.to_string()),
        _ => None,
    })
}

fn deserialize_optional_id<'de, D>(deserializer: D) -> std::result::Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Keeps the well-formed entries of an items array
fn deserialize_items<'de, D>(deserializer: D) -> std::result::Result<Vec<BillItem>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Array(entries)) => entries
            .into_iter()
            .filter_map(|entry| serde_json::from_value(entry).ok())
            .collect(),
        _ => Vec::new(),
    })
}

/// Unknown or missing types count as expenses
fn deserialize_transaction_type<'de, D>(deserializer: D) -> std::result::Result<TransactionType, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(value
        .as_ref()
        .and_then(serde_json::Value::as_str)
        .and_then(|s| s.parse().ok())
        .unwrap_or_default())
}
