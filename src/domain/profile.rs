use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::{BankAccount, Paise};

pub type UserId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    #[default]
    Low,
    Medium,
    High,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "Low",
            RiskLevel::Medium => "Medium",
            RiskLevel::High => "High",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "low" => Some(RiskLevel::Low),
            "medium" => Some(RiskLevel::Medium),
            "high" => Some(RiskLevel::High),
            _ => None,
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The user's profile node. Bank accounts live in their own collection and are
/// attached when the profile is loaded, never written back with it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    pub uid: UserId,
    pub name: String,
    pub email: String,
    pub wallet_balance: Paise,
    pub risk_level: RiskLevel,
    pub completed_lesson_ids: Vec<String>,
    pub joined_at: DateTime<Utc>,
    #[serde(skip)]
    pub bank_accounts: Vec<BankAccount>,
}

impl UserProfile {
    /// A fresh profile as created at signup.
    pub fn new(uid: impl Into<UserId>, name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            uid: uid.into(),
            name: name.into(),
            email: email.into(),
            wallet_balance: 0,
            risk_level: RiskLevel::default(),
            completed_lesson_ids: Vec::new(),
            joined_at: Utc::now(),
            bank_accounts: Vec::new(),
        }
    }

    /// Build a profile from whatever is stored for `uid`.
    ///
    /// Starts from the signup defaults and lays each stored field over them, so a
    /// partial or missing record still yields a complete profile. The uid always
    /// comes from the caller, not the stored record.
    pub fn from_stored(uid: &str, stored: Option<Value>) -> Result<Self> {
        let mut merged =
            serde_json::to_value(Self::new(uid, "", "")).context("Failed to encode profile")?;

        if let (Some(Value::Object(overrides)), Value::Object(base)) = (stored, &mut merged) {
            for (key, value) in overrides {
                if !value.is_null() {
                    base.insert(key, value);
                }
            }
            base.insert("uid".to_string(), Value::String(uid.to_string()));
        }

        serde_json::from_value(merged).context("Stored profile has invalid fields")
    }

    pub fn has_completed(&self, lesson_id: &str) -> bool {
        self.completed_lesson_ids.iter().any(|id| id == lesson_id)
    }

    pub fn primary_bank_account(&self) -> Option<&BankAccount> {
        self.bank_accounts.iter().find(|b| b.is_primary)
    }
}
