// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::{Result, bail};
use async_trait::async_trait;
use pocket_invest::application::{IdentityService, LedgerService};
use pocket_invest::config::StorageConfig;
use pocket_invest::domain::{AccountType, BankAccount, NewBankAccount, Paise};
use pocket_invest::storage::{BalanceAdjustment, Mutation, Store};
use serde_json::{Map, Value};
use tempfile::TempDir;

/// Helper to create services over a temporary database
pub async fn test_service() -> Result<(LedgerService, IdentityService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let config = StorageConfig::with_database(db_path.to_string_lossy());
    let service = LedgerService::init(&config).await?;
    let identity = IdentityService::new(service.store());
    Ok((service, identity, temp_dir))
}

pub fn sample_bank_details() -> NewBankAccount {
    NewBankAccount {
        account_holder_name: "Asha Rao".into(),
        account_number: "123456789012".into(),
        bank_name: "State Bank".into(),
        branch_name: "Koramangala".into(),
        account_type: AccountType::Savings,
    }
}

/// A registered user with one linked (primary) bank account
pub struct TestUser {
    pub uid: String,
    pub bank: BankAccount,
}

impl TestUser {
    pub async fn create(service: &LedgerService, identity: &IdentityService) -> Result<Self> {
        Self::create_named(service, identity, "asha@example.com").await
    }

    pub async fn create_named(
        service: &LedgerService,
        identity: &IdentityService,
        email: &str,
    ) -> Result<Self> {
        let session = identity.register("Asha", email, "secret123").await?;
        let bank = service
            .link_bank_account(&session.uid, sample_bank_details())
            .await?;
        Ok(Self {
            uid: session.uid,
            bank,
        })
    }

    /// Create the user and deposit `amount` into their wallet
    pub async fn funded(
        service: &LedgerService,
        identity: &IdentityService,
        amount: Paise,
    ) -> Result<Self> {
        let user = Self::create(service, identity).await?;
        service.deposit(&user.uid, amount, &user.bank.id).await?;
        Ok(user)
    }
}

/// A store whose backend is unreachable
pub struct FailingStore;

#[async_trait]
impl Store for FailingStore {
    async fn read(&self, _path: &str) -> Result<Option<Value>> {
        bail!("connection refused")
    }

    async fn write(&self, _path: &str, _value: Value) -> Result<()> {
        bail!("connection refused")
    }

    async fn update(&self, _path: &str, _fields: Map<String, Value>) -> Result<()> {
        bail!("connection refused")
    }

    async fn commit(&self, _mutations: Vec<Mutation>) -> Result<()> {
        bail!("connection refused")
    }

    async fn insert_unique(&self, _path: &str, _field: &str, _item: &str) -> Result<bool> {
        bail!("connection refused")
    }

    async fn adjust_balance(
        &self,
        _uid: &str,
        _delta: Paise,
        _mutations: Vec<Mutation>,
    ) -> Result<BalanceAdjustment> {
        bail!("connection refused")
    }
}
