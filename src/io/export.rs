use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::{LedgerService, Portfolio};
use crate::domain::{Expense, UserProfile, paise_to_rupees};

/// Everything one user owns, as written by `export_snapshot_json`
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSnapshot {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub profile: UserProfile,
    pub portfolio: Portfolio,
    pub expenses: Vec<Expense>,
}

/// Writes a user's ledger data out as CSV or JSON
pub struct Exporter<'a> {
    service: &'a LedgerService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a LedgerService) -> Self {
        Self { service }
    }

    /// Export transaction history to CSV, oldest first
    pub async fn export_transactions_csv<W: Write>(&self, uid: &str, writer: W) -> Result<usize> {
        let transactions = self.service.list_transactions(uid).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record([
            "id",
            "date",
            "type",
            "status",
            "amount_paise",
            "amount_rupees",
            "bank_account_id",
            "option_id",
            "asset_name",
        ])?;

        let mut count = 0;
        for tx in &transactions {
            csv_writer.write_record([
                tx.id.clone(),
                tx.date.to_rfc3339(),
                tx.transaction_type.as_str().to_string(),
                tx.status.as_str().to_string(),
                tx.amount.to_string(),
                format!("{:.2}", paise_to_rupees(tx.amount)),
                tx.bank_account_id.clone().unwrap_or_default(),
                tx.option_id.clone().unwrap_or_default(),
                tx.asset_name.clone().unwrap_or_default(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export logged expenses to CSV, newest first
    pub async fn export_expenses_csv<W: Write>(&self, uid: &str, writer: W) -> Result<usize> {
        let expenses = self.service.list_expenses(uid).await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        csv_writer.write_record(["id", "date", "category", "amount_paise", "note"])?;

        for expense in &expenses {
            csv_writer.write_record([
                expense.id.clone(),
                expense.date.to_rfc3339(),
                expense.category.as_str().to_string(),
                expense.amount.to_string(),
                expense.note.clone().unwrap_or_default(),
            ])?;
        }

        csv_writer.flush()?;
        Ok(expenses.len())
    }

    /// Export profile, portfolio and expenses as one JSON document
    pub async fn export_snapshot_json<W: Write>(
        &self,
        uid: &str,
        mut writer: W,
    ) -> Result<UserSnapshot> {
        let profile = self.service.get_profile(uid).await?;
        let portfolio = self.service.get_portfolio(uid).await?;
        let expenses = self.service.list_expenses(uid).await?;

        let snapshot = UserSnapshot {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            profile,
            portfolio,
            expenses,
        };

        let json = serde_json::to_string_pretty(&snapshot)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(snapshot)
    }
}
