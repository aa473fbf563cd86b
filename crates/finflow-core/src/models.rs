//! Core data models for the dashboard

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer, Serialize};

use super::types::TransactionType;

/// A single recorded financial movement
///
/// Records come from the bookkeeping API and are never modified locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    /// Identifier assigned by the source (numeric ids are kept as text)
    #[serde(deserialize_with = "de_id")]
    pub id: String,
    /// Booking date, `YYYY-MM-DD`
    #[serde(deserialize_with = "de_date")]
    pub date: NaiveDate,
    #[serde(default, deserialize_with = "de_text")]
    pub description: String,
    #[serde(default = "default_category", deserialize_with = "de_category")]
    pub category: String,
    pub amount: Decimal,
    #[serde(rename = "type", default, deserialize_with = "de_type")]
    pub kind: TransactionType,
}

impl Transaction {
    pub fn is_income(&self) -> bool {
        self.kind == TransactionType::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionType::Expense
    }
}

fn default_category() -> String {
    "Uncategorized".to_string()
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawId {
    Int(i64),
    Text(String),
}

fn de_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(match RawId::deserialize(deserializer)? {
        RawId::Int(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Accepts `2024-03-01` as well as timestamps such as `2024-03-01T00:00:00` or
/// `2024-03-01 00:00:00`; the time part is dropped.
fn de_date<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
    let raw = String::deserialize(deserializer)?;
    let day = raw.trim().get(..10).unwrap_or(raw.trim());
    NaiveDate::parse_from_str(day, "%Y-%m-%d")
        .map_err(|e| serde::de::Error::custom(format!("invalid date '{}': {}", raw, e)))
}

fn de_text<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

fn de_category<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Ok(Option::<String>::deserialize(deserializer)?
        .filter(|c| !c.trim().is_empty())
        .unwrap_or_else(default_category))
}

fn de_type<'de, D: Deserializer<'de>>(deserializer: D) -> Result<TransactionType, D::Error> {
    match Option::<String>::deserialize(deserializer)? {
        Some(raw) => raw.parse().map_err(serde::de::Error::custom),
        None => Ok(TransactionType::default()),
    }
}

/// Identity of the signed-in user as reported by the auth provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIdentity {
    pub id: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// Bearer credential for one data-fetch cycle
///
/// `Debug` never prints the token.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }

    /// Value for the `Authorization` header
    pub fn bearer(&self) -> String {
        format!("Bearer {}", self.0)
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(***)")
    }
}

/// An authenticated session
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub credential: Credential,
    pub user: UserIdentity,
}

impl Session {
    pub fn new(credential: Credential, user: UserIdentity) -> Self {
        Self { credential, user }
    }

    /// Label for greetings and logs
    pub fn display_name(&self) -> &str {
        self.user.email.as_deref().unwrap_or(&self.user.id)
    }
}
