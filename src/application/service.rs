use anyhow::Context;
use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value, json};
use std::sync::Arc;

use crate::config::StorageConfig;
use crate::domain::{
    BankAccount, Expense, ExpenseCategory, Faq, Goal, GoalStatus, IntegrityReport,
    InvestmentOption, Lesson, NewBankAccount, Paise, Projection, RiskLevel, Transaction,
    TransactionType, UserProfile, build_integrity_report, default_catalog, default_faqs,
    default_lessons, format_rupees, project,
};
use crate::storage::{BalanceAdjustment, Mutation, SqliteStore, Store, children_of, paths};

use super::{AppError, Portfolio};

/// Application service owning every wallet mutation and the user data around it.
/// This is the primary interface for any client (CLI, API, TUI, etc.).
#[derive(Clone)]
pub struct LedgerService {
    store: Arc<dyn Store>,
}

/// Result of a deposit, withdrawal or investment
#[derive(Debug, Clone)]
pub struct LedgerReceipt {
    pub transaction: Transaction,
    pub new_balance: Paise,
}

/// Result of moving wallet money into a goal
#[derive(Debug, Clone)]
pub struct GoalContribution {
    pub goal: Goal,
    pub amount: Paise,
    pub new_balance: Paise,
}

/// Details supplied when creating a goal
#[derive(Debug, Clone)]
pub struct NewGoal {
    pub name: String,
    pub target_amount: Paise,
    pub deadline: Option<NaiveDate>,
    pub icon: Option<String>,
}

/// Details supplied when logging an expense
#[derive(Debug, Clone)]
pub struct NewExpense {
    pub amount: Paise,
    pub category: ExpenseCategory,
    pub date: Option<DateTime<Utc>>,
    pub note: Option<String>,
}

/// Filter for querying transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub transaction_type: Option<TransactionType>,
    pub from_date: Option<DateTime<Utc>>,
    pub to_date: Option<DateTime<Utc>>,
    /// Keep only the most recent N
    pub limit: Option<usize>,
}

impl LedgerService {
    /// Create a new ledger service over the given store.
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Initialize a new database and seed the read-only catalogs.
    pub async fn init(config: &StorageConfig) -> Result<Self, AppError> {
        let store = SqliteStore::init(config).await?;
        let service = Self::new(Arc::new(store));
        service.seed_catalogs().await?;
        Ok(service)
    }

    /// Connect to an existing database.
    pub async fn connect(config: &StorageConfig) -> Result<Self, AppError> {
        let store = SqliteStore::connect(config, false).await?;
        Ok(Self::new(Arc::new(store)))
    }

    /// The store this service writes to, for collaborators sharing it.
    pub fn store(&self) -> Arc<dyn Store> {
        Arc::clone(&self.store)
    }

    /// Write the investment, lesson and FAQ catalogs.
    pub async fn seed_catalogs(&self) -> Result<(), AppError> {
        let mut mutations = Vec::new();
        for option in default_catalog() {
            mutations.push(Mutation::set(
                paths::investment_option(&option.id),
                encode(&option)?,
            ));
        }
        for lesson in default_lessons() {
            mutations.push(Mutation::set(paths::lesson(&lesson.id), encode(&lesson)?));
        }
        for faq in default_faqs() {
            mutations.push(Mutation::set(paths::child(paths::FAQS, &faq.id), encode(&faq)?));
        }

        let count = mutations.len();
        self.store.commit(mutations).await?;
        tracing::info!(count, "seeded catalogs");
        Ok(())
    }

    // ========================
    // Wallet operations
    // ========================

    /// Move money from a linked bank account into the wallet.
    pub async fn deposit(
        &self,
        uid: &str,
        amount: Paise,
        bank_account_id: &str,
    ) -> Result<LedgerReceipt, AppError> {
        validate_amount(amount)?;
        self.require_bank_account(uid, bank_account_id).await?;

        let (path, id) = self.new_child(&paths::transactions(uid));
        let transaction = Transaction::deposit(id, amount, bank_account_id.to_string());
        let new_balance = self
            .adjust_wallet(uid, amount, vec![Mutation::set(path, encode(&transaction)?)])
            .await?;

        tracing::info!(uid, amount, new_balance, "deposit recorded");
        Ok(LedgerReceipt {
            transaction,
            new_balance,
        })
    }

    /// Move money from the wallet back to a linked bank account.
    pub async fn withdraw(
        &self,
        uid: &str,
        amount: Paise,
        bank_account_id: &str,
    ) -> Result<LedgerReceipt, AppError> {
        validate_amount(amount)?;
        self.require_bank_account(uid, bank_account_id).await?;

        let (path, id) = self.new_child(&paths::transactions(uid));
        let transaction = Transaction::withdrawal(id, amount, bank_account_id.to_string());
        let new_balance = self
            .adjust_wallet(uid, -amount, vec![Mutation::set(path, encode(&transaction)?)])
            .await?;

        tracing::info!(uid, amount, new_balance, "withdrawal recorded");
        Ok(LedgerReceipt {
            transaction,
            new_balance,
        })
    }

    /// Invest wallet money into a catalog product.
    pub async fn invest(
        &self,
        uid: &str,
        amount: Paise,
        option_id: &str,
    ) -> Result<LedgerReceipt, AppError> {
        validate_amount(amount)?;
        let option = self.get_investment_option(option_id).await?;
        if amount < option.min_amount {
            return Err(AppError::InvalidAmount(format!(
                "{} requires at least {} paise",
                option.title, option.min_amount
            )));
        }

        let (path, id) = self.new_child(&paths::transactions(uid));
        let transaction = Transaction::investment(id, amount, &option);
        let new_balance = self
            .adjust_wallet(uid, -amount, vec![Mutation::set(path, encode(&transaction)?)])
            .await?;

        tracing::info!(uid, amount, option_id, new_balance, "investment recorded");
        Ok(LedgerReceipt {
            transaction,
            new_balance,
        })
    }

    /// Move wallet money into a savings goal.
    pub async fn contribute_to_goal(
        &self,
        uid: &str,
        goal_id: &str,
        amount: Paise,
    ) -> Result<GoalContribution, AppError> {
        validate_amount(amount)?;
        let before = self.get_goal(uid, goal_id).await?;
        if before.current_amount.checked_add(amount).is_none() {
            return Err(AppError::InvalidAmount(format!(
                "{} would overflow the goal",
                format_rupees(amount)
            )));
        }

        let goal_path = paths::goal(uid, goal_id);
        let new_balance = self
            .adjust_wallet(
                uid,
                -amount,
                vec![Mutation::increment(&goal_path, "currentAmount", amount)],
            )
            .await?;

        // Status is derived from the committed amount so concurrent
        // contributions cannot leave a funded goal marked active.
        let mut goal = self.get_goal(uid, goal_id).await?;
        let settled = goal.settled_status();
        if settled != goal.status {
            goal.status = settled;
            self.store
                .update(&goal_path, fields([("status", json!(settled))]))
                .await?;
            tracing::info!(uid, goal_id, "goal completed");
        }

        tracing::info!(uid, goal_id, amount, new_balance, "goal contribution recorded");
        Ok(GoalContribution {
            goal,
            amount,
            new_balance,
        })
    }

    async fn adjust_wallet(
        &self,
        uid: &str,
        delta: Paise,
        mutations: Vec<Mutation>,
    ) -> Result<Paise, AppError> {
        if !paths::is_valid_key(uid) {
            return Err(AppError::ProfileNotFound(uid.to_string()));
        }
        match self.store.adjust_balance(uid, delta, mutations).await? {
            BalanceAdjustment::Applied { new_balance } => Ok(new_balance),
            BalanceAdjustment::Insufficient { balance } => {
                tracing::warn!(uid, balance, required = -delta, "insufficient wallet balance");
                Err(AppError::InsufficientFunds {
                    balance,
                    required: -delta,
                })
            }
            BalanceAdjustment::Overflow { balance } => {
                tracing::warn!(uid, balance, delta, "wallet balance would overflow");
                Err(AppError::InvalidAmount(format!(
                    "{} would overflow the wallet balance",
                    format_rupees(delta)
                )))
            }
            BalanceAdjustment::ProfileMissing => Err(AppError::ProfileNotFound(uid.to_string())),
        }
    }

    // ========================
    // Profile operations
    // ========================

    /// Load a profile with its linked bank accounts. A user with no stored
    /// profile gets the signup defaults.
    pub async fn get_profile(&self, uid: &str) -> Result<UserProfile, AppError> {
        let stored = self.read_user_node(uid, &paths::profile(uid)).await?;
        let mut profile = UserProfile::from_stored(uid, stored)?;
        profile.bank_accounts = self.list_bank_accounts(uid).await?;
        Ok(profile)
    }

    pub async fn update_risk_level(&self, uid: &str, level: RiskLevel) -> Result<(), AppError> {
        self.require_profile(uid).await?;
        self.store
            .update(&paths::profile(uid), fields([("riskLevel", json!(level))]))
            .await?;
        tracing::info!(uid, risk_level = %level, "risk level updated");
        Ok(())
    }

    // ========================
    // Bank account operations
    // ========================

    /// Link a bank account. The first account linked becomes primary.
    pub async fn link_bank_account(
        &self,
        uid: &str,
        details: NewBankAccount,
    ) -> Result<BankAccount, AppError> {
        for (field, value) in [
            ("account holder name", &details.account_holder_name),
            ("bank name", &details.bank_name),
            ("branch name", &details.branch_name),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::InvalidInput(format!("{field} is required")));
            }
        }
        let number = &details.account_number;
        if number.len() < 6 || !number.chars().all(|c| c.is_ascii_digit()) {
            return Err(AppError::InvalidInput(
                "account number must be at least 6 digits".to_string(),
            ));
        }

        self.require_profile(uid).await?;
        let is_primary = self.list_bank_accounts(uid).await?.is_empty();

        let (path, id) = self.new_child(&paths::bank_accounts(uid));
        let account = BankAccount::link(id, details, is_primary);
        self.store.write(&path, encode(&account)?).await?;

        tracing::info!(uid, bank_account_id = %account.id, is_primary, "bank account linked");
        Ok(account)
    }

    pub async fn list_bank_accounts(&self, uid: &str) -> Result<Vec<BankAccount>, AppError> {
        self.read_collection(uid, &paths::bank_accounts(uid)).await
    }

    /// Make one linked account primary and every other one not.
    pub async fn set_primary_bank_account(
        &self,
        uid: &str,
        bank_account_id: &str,
    ) -> Result<BankAccount, AppError> {
        let accounts = self.list_bank_accounts(uid).await?;
        let Some(mut chosen) = accounts.iter().find(|a| a.id == bank_account_id).cloned() else {
            return Err(AppError::BankAccountNotFound(bank_account_id.to_string()));
        };

        let mutations = accounts
            .iter()
            .filter(|a| a.is_primary != (a.id == bank_account_id))
            .map(|a| {
                Mutation::merge(
                    paths::bank_account(uid, &a.id),
                    fields([("isPrimary", json!(a.id == bank_account_id))]),
                )
            })
            .collect();
        self.store.commit(mutations).await?;

        chosen.is_primary = true;
        Ok(chosen)
    }

    async fn require_bank_account(
        &self,
        uid: &str,
        bank_account_id: &str,
    ) -> Result<BankAccount, AppError> {
        if paths::is_valid_key(bank_account_id) {
            let stored = self
                .read_user_node(uid, &paths::bank_account(uid, bank_account_id))
                .await?;
            if let Some(value) = stored {
                return decode(value);
            }
        }
        self.require_profile(uid).await?;
        Err(AppError::BankAccountNotFound(bank_account_id.to_string()))
    }

    // ========================
    // Goal operations
    // ========================

    pub async fn create_goal(&self, uid: &str, new_goal: NewGoal) -> Result<Goal, AppError> {
        let name = new_goal.name.trim();
        if name.is_empty() {
            return Err(AppError::InvalidInput("goal name is required".to_string()));
        }
        if new_goal.target_amount <= 0 {
            return Err(AppError::InvalidAmount(
                "Goal target must be positive".to_string(),
            ));
        }
        self.require_profile(uid).await?;

        let (path, id) = self.new_child(&paths::goals(uid));
        let mut goal = Goal::new(id, name, new_goal.target_amount);
        if let Some(deadline) = new_goal.deadline {
            goal = goal.with_deadline(deadline);
        }
        if let Some(icon) = new_goal.icon {
            goal = goal.with_icon(icon);
        }

        self.store.write(&path, encode(&goal)?).await?;
        tracing::info!(uid, goal_id = %goal.id, target = goal.target_amount, "goal created");
        Ok(goal)
    }

    pub async fn get_goal(&self, uid: &str, goal_id: &str) -> Result<Goal, AppError> {
        if paths::is_valid_key(goal_id) {
            if let Some(value) = self.read_user_node(uid, &paths::goal(uid, goal_id)).await? {
                return decode(value);
            }
        }
        self.require_profile(uid).await?;
        Err(AppError::GoalNotFound(goal_id.to_string()))
    }

    pub async fn list_goals(&self, uid: &str) -> Result<Vec<Goal>, AppError> {
        self.read_collection(uid, &paths::goals(uid)).await
    }

    /// Pause or resume a goal. Completed goals stay completed.
    pub async fn set_goal_status(
        &self,
        uid: &str,
        goal_id: &str,
        status: GoalStatus,
    ) -> Result<Goal, AppError> {
        if status == GoalStatus::Completed {
            return Err(AppError::InvalidInput(
                "goals complete by reaching their target".to_string(),
            ));
        }
        let mut goal = self.get_goal(uid, goal_id).await?;
        if goal.status == GoalStatus::Completed {
            return Err(AppError::InvalidInput(format!(
                "goal '{}' is already completed",
                goal.name
            )));
        }

        self.store
            .update(&paths::goal(uid, goal_id), fields([("status", json!(status))]))
            .await?;
        goal.status = status;
        Ok(goal)
    }

    // ========================
    // Expense operations
    // ========================

    pub async fn add_expense(&self, uid: &str, new_expense: NewExpense) -> Result<Expense, AppError> {
        validate_amount(new_expense.amount)?;
        self.require_profile(uid).await?;

        let (path, id) = self.new_child(&paths::expenses(uid));
        let expense = Expense {
            id,
            amount: new_expense.amount,
            category: new_expense.category,
            date: new_expense.date.unwrap_or_else(Utc::now),
            note: new_expense
                .note
                .map(|n| n.trim().to_string())
                .filter(|n| !n.is_empty()),
        };

        self.store.write(&path, encode(&expense)?).await?;
        tracing::info!(uid, amount = expense.amount, category = %expense.category, "expense logged");
        Ok(expense)
    }

    /// Expenses, newest first.
    pub async fn list_expenses(&self, uid: &str) -> Result<Vec<Expense>, AppError> {
        let mut expenses: Vec<Expense> = self.read_collection(uid, &paths::expenses(uid)).await?;
        expenses.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(expenses)
    }

    // ========================
    // Catalog and projection
    // ========================

    pub async fn list_investment_options(&self) -> Result<Vec<InvestmentOption>, AppError> {
        Ok(children_of(self.store.read(paths::INVESTMENT_OPTIONS).await?)?)
    }

    pub async fn get_investment_option(&self, id: &str) -> Result<InvestmentOption, AppError> {
        if !paths::is_valid_key(id) {
            return Err(AppError::InvestmentOptionNotFound(id.to_string()));
        }
        match self.store.read(&paths::investment_option(id)).await? {
            Some(value) => decode(value),
            None => Err(AppError::InvestmentOptionNotFound(id.to_string())),
        }
    }

    /// Project what investing `amount` into a product for `duration_months` returns.
    pub async fn project_returns(
        &self,
        option_id: &str,
        amount: Paise,
        duration_months: u32,
    ) -> Result<Projection, AppError> {
        let option = self.get_investment_option(option_id).await?;
        Ok(project(&option, amount, duration_months)?)
    }

    // ========================
    // History and reporting
    // ========================

    /// All transactions in the order they were recorded.
    pub async fn list_transactions(&self, uid: &str) -> Result<Vec<Transaction>, AppError> {
        self.read_collection(uid, &paths::transactions(uid)).await
    }

    pub async fn list_transactions_filtered(
        &self,
        uid: &str,
        filter: TransactionFilter,
    ) -> Result<Vec<Transaction>, AppError> {
        let mut transactions: Vec<Transaction> = self
            .list_transactions(uid)
            .await?
            .into_iter()
            .filter(|t| filter.transaction_type.is_none_or(|ty| t.transaction_type == ty))
            .filter(|t| filter.from_date.is_none_or(|from| t.date >= from))
            .filter(|t| filter.to_date.is_none_or(|to| t.date <= to))
            .collect();

        if let Some(limit) = filter.limit {
            let skip = transactions.len().saturating_sub(limit);
            transactions.drain(..skip);
        }
        Ok(transactions)
    }

    pub async fn get_portfolio(&self, uid: &str) -> Result<Portfolio, AppError> {
        let profile = self.get_profile(uid).await?;
        let goals = self.list_goals(uid).await?;
        let transactions = self.list_transactions(uid).await?;
        Ok(Portfolio::build(
            profile.wallet_balance,
            goals,
            transactions,
            profile.bank_accounts,
        ))
    }

    /// Compare the stored wallet balance with the one implied by history.
    pub async fn check_integrity(&self, uid: &str) -> Result<IntegrityReport, AppError> {
        let profile = self.require_profile(uid).await?;
        let transactions = self.list_transactions(uid).await?;
        let goals = self.list_goals(uid).await?;

        let report = build_integrity_report(profile.wallet_balance, &transactions, &goals);
        if !report.is_valid() {
            tracing::warn!(uid, drift = report.drift(), "ledger integrity check failed");
        }
        Ok(report)
    }

    // ========================
    // Learning
    // ========================

    pub async fn list_lessons(&self) -> Result<Vec<Lesson>, AppError> {
        Ok(children_of(self.store.read(paths::LESSONS).await?)?)
    }

    pub async fn list_faqs(&self) -> Result<Vec<Faq>, AppError> {
        Ok(children_of(self.store.read(paths::FAQS).await?)?)
    }

    /// Record a finished lesson. Returns false if it was already recorded.
    pub async fn mark_lesson_complete(&self, uid: &str, lesson_id: &str) -> Result<bool, AppError> {
        if !paths::is_valid_key(lesson_id) || self.store.read(&paths::lesson(lesson_id)).await?.is_none()
        {
            return Err(AppError::LessonNotFound(lesson_id.to_string()));
        }

        let profile = self.require_profile(uid).await?;
        if profile.has_completed(lesson_id) {
            return Ok(false);
        }

        let added = self
            .store
            .insert_unique(&paths::profile(uid), "completedLessonIds", lesson_id)
            .await?;
        if added {
            tracing::info!(uid, lesson_id, "lesson completed");
        }
        Ok(added)
    }

    // ========================
    // Helpers
    // ========================

    /// Load the stored profile, failing when the user has none.
    async fn require_profile(&self, uid: &str) -> Result<UserProfile, AppError> {
        match self.read_user_node(uid, &paths::profile(uid)).await? {
            Some(value) => Ok(UserProfile::from_stored(uid, Some(value))?),
            None => Err(AppError::ProfileNotFound(uid.to_string())),
        }
    }

    async fn read_user_node(&self, uid: &str, path: &str) -> Result<Option<Value>, AppError> {
        if !paths::is_valid_key(uid) {
            return Err(AppError::ProfileNotFound(uid.to_string()));
        }
        Ok(self.store.read(path).await?)
    }

    async fn read_collection<T: DeserializeOwned>(
        &self,
        uid: &str,
        path: &str,
    ) -> Result<Vec<T>, AppError> {
        Ok(children_of(self.read_user_node(uid, path).await?)?)
    }

    fn new_child(&self, parent: &str) -> (String, String) {
        let path = self.store.append_child(parent);
        let (_, key) = paths::split(&path);
        let key = key.to_string();
        (path, key)
    }
}

fn validate_amount(amount: Paise) -> Result<(), AppError> {
    if amount <= 0 {
        return Err(AppError::InvalidAmount(
            "Amount must be greater than zero".to_string(),
        ));
    }
    Ok(())
}

fn encode<T: Serialize>(value: &T) -> Result<Value, AppError> {
    Ok(serde_json::to_value(value).context("Failed to encode record")?)
}

fn decode<T: DeserializeOwned>(value: Value) -> Result<T, AppError> {
    Ok(serde_json::from_value(value).context("Stored record has invalid fields")?)
}

fn fields<const N: usize>(entries: [(&str, Value); N]) -> Map<String, Value> {
    entries
        .into_iter()
        .map(|(key, value)| (key.to_string(), value))
        .collect()
}
