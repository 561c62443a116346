use anyhow::{Context, Result, anyhow, bail};
use chrono::{DateTime, NaiveDate, Utc};
use clap::{Parser, Subcommand};
use std::fs;
use std::path::{Path, PathBuf};

use crate::application::{
    Advisor, IdentityService, LedgerService, NewExpense, NewGoal, TransactionFilter,
};
use crate::config::Config;
use crate::domain::{
    AccountType, ExpenseCategory, GoalStatus, NewBankAccount, RiskLevel, TransactionType,
    format_rupees, parse_rupees, totals_by_category,
};

/// Pocket - micro-investing wallet for first-time investors
#[derive(Parser)]
#[command(name = "pocket")]
#[command(about = "A wallet ledger with investment projections and savings goals")]
#[command(version)]
pub struct Cli {
    /// Configuration file
    #[arg(long, default_value = "pocket.toml", global = true)]
    pub config: PathBuf,

    /// Database file path (overrides the config file)
    #[arg(short, long, global = true)]
    pub database: Option<String>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new database and seed the catalogs
    Init,

    /// Create an account and sign in
    Signup {
        name: String,
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign in to an existing account
    Login {
        email: String,
        #[arg(long)]
        password: String,
    },

    /// Sign out
    Logout,

    /// Show your profile and wallet balance
    Profile,

    /// Set your risk appetite: low, medium, high
    Risk { level: String },

    /// Bank account management commands
    #[command(subcommand)]
    Bank(BankCommands),

    /// Add money from a bank account to the wallet
    Deposit {
        /// Amount in rupees (e.g., "500" or "₹1,250.50")
        amount: String,

        /// Bank account ID (defaults to the primary account)
        #[arg(long)]
        bank: Option<String>,
    },

    /// Send wallet money back to a bank account
    Withdraw {
        amount: String,

        /// Bank account ID (defaults to the primary account)
        #[arg(long)]
        bank: Option<String>,
    },

    /// Invest wallet money in a product
    Invest {
        /// Investment option ID (see `options`)
        option: String,
        amount: String,
    },

    /// List investment products
    Options,

    /// Project returns for a product
    Project {
        option: String,
        amount: String,

        /// Duration in months
        #[arg(short, long, default_value = "12")]
        months: u32,
    },

    /// Savings goal commands
    #[command(subcommand)]
    Goal(GoalCommands),

    /// Expense tracking commands
    #[command(subcommand)]
    Expense(ExpenseCommands),

    /// List wallet transactions
    Transactions {
        /// Filter by type: deposit, withdrawal, investment
        #[arg(short = 't', long = "type")]
        transaction_type: Option<String>,

        /// Filter from date (YYYY-MM-DD)
        #[arg(long)]
        from_date: Option<String>,

        /// Filter to date (YYYY-MM-DD)
        #[arg(long)]
        to_date: Option<String>,

        /// Show only the most recent N
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Show holdings, goals and net worth
    Portfolio,

    /// Verify the wallet balance against transaction history
    Check,

    /// List lessons
    Lessons,

    /// List frequently asked questions
    Faqs,

    /// Mark a lesson as completed
    Complete { lesson_id: String },

    /// Get a quick investing tip
    Tip,

    /// Explain a financial concept
    Explain { concept: String },

    /// Ask the money mentor a question
    Ask { question: String },

    /// Generate a short lesson on a topic
    Lesson { topic: String },

    /// Export data to CSV or JSON
    Export {
        /// What to export: transactions, expenses, snapshot
        export_type: String,

        /// Output file (stdout if omitted)
        #[arg(short, long)]
        output: Option<String>,
    },
}

#[derive(Subcommand)]
pub enum BankCommands {
    /// Link a bank account
    Link {
        /// Account holder name
        #[arg(long)]
        holder: String,

        /// Account number (digits only)
        #[arg(long)]
        number: String,

        #[arg(long)]
        bank: String,

        #[arg(long)]
        branch: String,

        /// Account type: savings, current
        #[arg(short = 't', long = "type", default_value = "savings")]
        account_type: String,
    },

    /// List linked bank accounts
    List,

    /// Make an account the primary one
    Primary { id: String },
}

#[derive(Subcommand)]
pub enum GoalCommands {
    /// Create a savings goal
    Create {
        name: String,

        /// Target amount in rupees
        target: String,

        /// Deadline (YYYY-MM-DD)
        #[arg(long)]
        deadline: Option<String>,

        #[arg(long)]
        icon: Option<String>,
    },

    /// List goals with progress
    List,

    /// Move wallet money into a goal
    Contribute { id: String, amount: String },

    /// Pause a goal
    Pause { id: String },

    /// Resume a paused goal
    Resume { id: String },
}

#[derive(Subcommand)]
pub enum ExpenseCommands {
    /// Log an expense
    Add {
        amount: String,

        /// Category: food, travel, shopping, bills, other
        #[arg(short, long, default_value = "other")]
        category: String,

        /// Date of the expense (YYYY-MM-DD, defaults to now)
        #[arg(long)]
        date: Option<String>,

        #[arg(short, long)]
        note: Option<String>,
    },

    /// List expenses with totals by category
    List,
}

impl Cli {
    /// Load the config file and apply command-line overrides.
    pub fn load_config(&self) -> Result<Config> {
        let mut config = Config::load(&self.config)?;
        if let Some(database) = &self.database {
            config.storage.database = database.clone();
        }
        Ok(config)
    }

    pub async fn run(self, config: Config) -> Result<()> {
        let session_file = session_path(&config.storage.database);

        match self.command {
            Commands::Init => {
                LedgerService::init(&config.storage).await?;
                println!("Database initialized: {}", config.storage.database);
                if !self.config.exists() {
                    let mut written = config.clone();
                    written.advisor.api_key = None;
                    written.save_new(&self.config)?;
                    println!("Wrote default config: {}", self.config.display());
                }
            }

            Commands::Signup {
                name,
                email,
                password,
            } => {
                let service = LedgerService::connect(&config.storage).await?;
                let identity = IdentityService::new(service.store());
                let session = identity.register(&name, &email, &password).await?;
                save_session(&session_file, &session.token)?;
                println!("Welcome, {}! Your wallet is ready.", name.trim());
            }

            Commands::Login { email, password } => {
                let service = LedgerService::connect(&config.storage).await?;
                let identity = IdentityService::new(service.store());
                let session = identity.authenticate(&email, &password).await?;
                save_session(&session_file, &session.token)?;
                let profile = service.get_profile(&session.uid).await?;
                println!("Signed in as {}", profile.name);
            }

            Commands::Logout => {
                if let Some(token) = load_session(&session_file)? {
                    let service = LedgerService::connect(&config.storage).await?;
                    IdentityService::new(service.store())
                        .end_session(&token)
                        .await?;
                    fs::remove_file(&session_file).with_context(|| {
                        format!("Failed to remove {}", session_file.display())
                    })?;
                }
                println!("Signed out.");
            }

            Commands::Tip => {
                println!("{}", Advisor::from_config(&config.advisor).quick_tip().await);
            }

            Commands::Explain { concept } => {
                let advisor = Advisor::from_config(&config.advisor);
                println!("{}", advisor.explain_concept(&concept).await);
            }

            Commands::Ask { question } => {
                let advisor = Advisor::from_config(&config.advisor);
                println!("{}", advisor.ask_question(&question).await);
            }

            Commands::Lesson { topic } => {
                let advisor = Advisor::from_config(&config.advisor);
                println!("{}", advisor.generate_lesson(&topic).await);
            }

            Commands::Options => {
                let service = LedgerService::connect(&config.storage).await?;
                run_options_command(&service).await?;
            }

            Commands::Project {
                option,
                amount,
                months,
            } => {
                let service = LedgerService::connect(&config.storage).await?;
                let amount = parse_amount(&amount)?;
                let projection = service.project_returns(&option, amount, months).await?;
                println!("Over {} months:", months);
                println!("  Invested:       {:>14}", format_rupees(projection.total_invested));
                println!("  Maturity value: {:>14}", format_rupees(projection.maturity_value));
                println!("  Estimated gain: {:>14}", format_rupees(projection.estimated_gain()));
            }

            Commands::Lessons => {
                let service = LedgerService::connect(&config.storage).await?;
                let uid = signed_in_user(&service, &session_file).await.ok();
                let profile = match &uid {
                    Some(uid) => Some(service.get_profile(uid).await?),
                    None => None,
                };
                for lesson in service.list_lessons().await? {
                    let done = profile.as_ref().is_some_and(|p| p.has_completed(&lesson.id));
                    let mark = if done { "x" } else { " " };
                    println!(
                        "[{}] {:<16} {:<40} {}",
                        mark, lesson.id, lesson.title, lesson.duration
                    );
                }
            }

            Commands::Faqs => {
                let service = LedgerService::connect(&config.storage).await?;
                for faq in service.list_faqs().await? {
                    println!("Q: {}", faq.question);
                    println!("A: {}\n", faq.answer);
                }
            }

            command => {
                let service = LedgerService::connect(&config.storage).await?;
                let uid = signed_in_user(&service, &session_file).await?;
                run_user_command(&service, &uid, command).await?;
            }
        }

        Ok(())
    }
}

async fn run_user_command(service: &LedgerService, uid: &str, command: Commands) -> Result<()> {
    match command {
        Commands::Profile => {
            let profile = service.get_profile(uid).await?;
            println!("Name:        {}", profile.name);
            println!("Email:       {}", profile.email);
            println!("Wallet:      {}", format_rupees(profile.wallet_balance));
            println!("Risk level:  {}", profile.risk_level);
            println!("Lessons:     {} completed", profile.completed_lesson_ids.len());
            println!("Joined:      {}", profile.joined_at.format("%Y-%m-%d"));
            if let Some(account) = profile.primary_bank_account() {
                println!(
                    "Primary bank: {} {}",
                    account.bank_name,
                    account.masked_number()
                );
            }
        }

        Commands::Risk { level } => {
            let level = RiskLevel::from_str(&level).ok_or_else(|| {
                anyhow!("Invalid risk level '{}'. Valid levels: low, medium, high", level)
            })?;
            service.update_risk_level(uid, level).await?;
            println!("Risk level set to {}", level);
        }

        Commands::Bank(cmd) => run_bank_command(service, uid, cmd).await?,

        Commands::Deposit { amount, bank } => {
            let amount = parse_amount(&amount)?;
            let bank = resolve_bank(service, uid, bank).await?;
            let receipt = service.deposit(uid, amount, &bank).await?;
            println!(
                "Deposited {}. Wallet balance: {}",
                format_rupees(receipt.transaction.amount),
                format_rupees(receipt.new_balance)
            );
        }

        Commands::Withdraw { amount, bank } => {
            let amount = parse_amount(&amount)?;
            let bank = resolve_bank(service, uid, bank).await?;
            let receipt = service.withdraw(uid, amount, &bank).await?;
            println!(
                "Withdrew {}. Wallet balance: {}",
                format_rupees(receipt.transaction.amount),
                format_rupees(receipt.new_balance)
            );
        }

        Commands::Invest { option, amount } => {
            let amount = parse_amount(&amount)?;
            let receipt = service.invest(uid, amount, &option).await?;
            println!(
                "Invested {} in {}. Wallet balance: {}",
                format_rupees(receipt.transaction.amount),
                receipt.transaction.asset_name.as_deref().unwrap_or(&option),
                format_rupees(receipt.new_balance)
            );
        }

        Commands::Goal(cmd) => run_goal_command(service, uid, cmd).await?,

        Commands::Expense(cmd) => run_expense_command(service, uid, cmd).await?,

        Commands::Transactions {
            transaction_type,
            from_date,
            to_date,
            limit,
        } => {
            let filter = TransactionFilter {
                transaction_type: transaction_type
                    .as_deref()
                    .map(parse_transaction_type)
                    .transpose()?,
                from_date: from_date.as_deref().map(parse_date).transpose()?,
                to_date: to_date.as_deref().map(parse_date).transpose()?,
                limit,
            };
            run_transactions_command(service, uid, filter).await?;
        }

        Commands::Portfolio => run_portfolio_command(service, uid).await?,

        Commands::Check => run_check_command(service, uid).await?,

        Commands::Complete { lesson_id } => {
            if service.mark_lesson_complete(uid, &lesson_id).await? {
                println!("Lesson completed: {}", lesson_id);
            } else {
                println!("Lesson already completed: {}", lesson_id);
            }
        }

        Commands::Export {
            export_type,
            output,
        } => run_export_command(service, uid, &export_type, output.as_deref()).await?,

        _ => bail!("Command does not act on a signed-in user"),
    }

    Ok(())
}

async fn run_bank_command(service: &LedgerService, uid: &str, cmd: BankCommands) -> Result<()> {
    match cmd {
        BankCommands::Link {
            holder,
            number,
            bank,
            branch,
            account_type,
        } => {
            let account_type = AccountType::from_str(&account_type).ok_or_else(|| {
                anyhow!(
                    "Invalid account type '{}'. Valid types: savings, current",
                    account_type
                )
            })?;
            let account = service
                .link_bank_account(
                    uid,
                    NewBankAccount {
                        account_holder_name: holder,
                        account_number: number,
                        bank_name: bank,
                        branch_name: branch,
                        account_type,
                    },
                )
                .await?;
            println!(
                "Linked {} {} ({}){}",
                account.bank_name,
                account.masked_number(),
                account.id,
                if account.is_primary { " as primary" } else { "" }
            );
        }

        BankCommands::List => {
            let accounts = service.list_bank_accounts(uid).await?;
            if accounts.is_empty() {
                println!("No bank accounts linked.");
            } else {
                println!(
                    "{:<38} {:<20} {:<14} {:<8} {}",
                    "ID", "BANK", "NUMBER", "TYPE", "PRIMARY"
                );
                println!("{}", "-".repeat(90));
                for account in accounts {
                    println!(
                        "{:<38} {:<20} {:<14} {:<8} {}",
                        account.id,
                        account.bank_name,
                        account.masked_number(),
                        account.account_type.as_str(),
                        if account.is_primary { "yes" } else { "" }
                    );
                }
            }
        }

        BankCommands::Primary { id } => {
            let account = service.set_primary_bank_account(uid, &id).await?;
            println!("Primary account: {} {}", account.bank_name, account.masked_number());
        }
    }
    Ok(())
}

async fn run_goal_command(service: &LedgerService, uid: &str, cmd: GoalCommands) -> Result<()> {
    match cmd {
        GoalCommands::Create {
            name,
            target,
            deadline,
            icon,
        } => {
            let deadline = deadline
                .as_deref()
                .map(|d| {
                    NaiveDate::parse_from_str(d, "%Y-%m-%d")
                        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", d))
                })
                .transpose()?;
            let goal = service
                .create_goal(
                    uid,
                    NewGoal {
                        name,
                        target_amount: parse_amount(&target)?,
                        deadline,
                        icon,
                    },
                )
                .await?;
            println!(
                "Created goal: {} {} ({}), target {}",
                goal.icon,
                goal.name,
                goal.id,
                format_rupees(goal.target_amount)
            );
        }

        GoalCommands::List => {
            let goals = service.list_goals(uid).await?;
            if goals.is_empty() {
                println!("No goals yet.");
            } else {
                println!(
                    "{:<38} {:<20} {:>12} {:>12} {:>6} {:<10}",
                    "ID", "NAME", "SAVED", "TARGET", "%", "STATUS"
                );
                println!("{}", "-".repeat(102));
                for goal in goals {
                    println!(
                        "{:<38} {:<20} {:>12} {:>12} {:>5.0}% {:<10}",
                        goal.id,
                        goal.name,
                        format_rupees(goal.current_amount),
                        format_rupees(goal.target_amount),
                        goal.progress_percent(),
                        goal.status
                    );
                }
            }
        }

        GoalCommands::Contribute { id, amount } => {
            let amount = parse_amount(&amount)?;
            let result = service.contribute_to_goal(uid, &id, amount).await?;
            println!(
                "Added {} to {}: {} of {}. Wallet balance: {}",
                format_rupees(result.amount),
                result.goal.name,
                format_rupees(result.goal.current_amount),
                format_rupees(result.goal.target_amount),
                format_rupees(result.new_balance)
            );
            if result.goal.status == GoalStatus::Completed {
                println!("Goal reached!");
            }
        }

        GoalCommands::Pause { id } => {
            let goal = service.set_goal_status(uid, &id, GoalStatus::Paused).await?;
            println!("Paused goal: {}", goal.name);
        }

        GoalCommands::Resume { id } => {
            let goal = service.set_goal_status(uid, &id, GoalStatus::Active).await?;
            println!("Resumed goal: {}", goal.name);
        }
    }
    Ok(())
}

async fn run_expense_command(
    service: &LedgerService,
    uid: &str,
    cmd: ExpenseCommands,
) -> Result<()> {
    match cmd {
        ExpenseCommands::Add {
            amount,
            category,
            date,
            note,
        } => {
            let category = ExpenseCategory::from_str(&category).ok_or_else(|| {
                anyhow!(
                    "Invalid category '{}'. Valid categories: food, travel, shopping, bills, other",
                    category
                )
            })?;
            let expense = service
                .add_expense(
                    uid,
                    NewExpense {
                        amount: parse_amount(&amount)?,
                        category,
                        date: date.as_deref().map(parse_date).transpose()?,
                        note,
                    },
                )
                .await?;
            println!(
                "Logged {} under {}",
                format_rupees(expense.amount),
                expense.category
            );
        }

        ExpenseCommands::List => {
            let expenses = service.list_expenses(uid).await?;
            if expenses.is_empty() {
                println!("No expenses logged.");
                return Ok(());
            }

            println!("{:<12} {:<10} {:>12}  {}", "DATE", "CATEGORY", "AMOUNT", "NOTE");
            println!("{}", "-".repeat(60));
            for expense in &expenses {
                println!(
                    "{:<12} {:<10} {:>12}  {}",
                    expense.date.format("%Y-%m-%d"),
                    expense.category,
                    format_rupees(expense.amount),
                    expense.note.as_deref().unwrap_or("")
                );
            }

            println!();
            for (category, total) in totals_by_category(&expenses) {
                println!("  {:<10} {:>12}", format!("{}:", category), format_rupees(total));
            }
        }
    }
    Ok(())
}

async fn run_options_command(service: &LedgerService) -> Result<()> {
    let options = service.list_investment_options().await?;
    println!(
        "{:<14} {:<28} {:<10} {:>6} {:>10} {:<6}",
        "ID", "TITLE", "TYPE", "RATE", "MIN", "RISK"
    );
    println!("{}", "-".repeat(80));
    for option in options {
        println!(
            "{:<14} {:<28} {:<10} {:>5.1}% {:>10} {:<6}",
            option.id,
            option.title,
            option.contribution_type,
            option.interest_rate,
            format_rupees(option.min_amount),
            option.risk
        );
    }
    Ok(())
}

async fn run_transactions_command(
    service: &LedgerService,
    uid: &str,
    filter: TransactionFilter,
) -> Result<()> {
    let transactions = service.list_transactions_filtered(uid, filter).await?;
    if transactions.is_empty() {
        println!("No transactions found.");
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:>12}  {:<10} {}",
        "DATE", "TYPE", "AMOUNT", "STATUS", "DETAILS"
    );
    println!("{}", "-".repeat(80));
    for tx in transactions {
        let details = tx
            .asset_name
            .clone()
            .or_else(|| tx.bank_account_id.clone())
            .unwrap_or_default();
        println!(
            "{:<20} {:<12} {:>12}  {:<10} {}",
            tx.date.format("%Y-%m-%d %H:%M"),
            tx.transaction_type,
            format_rupees(tx.wallet_delta()),
            tx.status.as_str(),
            details
        );
    }
    Ok(())
}

async fn run_portfolio_command(service: &LedgerService, uid: &str) -> Result<()> {
    let portfolio = service.get_portfolio(uid).await?;

    println!("Wallet:          {:>14}", format_rupees(portfolio.wallet_balance));
    println!("Invested:        {:>14}", format_rupees(portfolio.total_invested));
    println!("Saved in goals:  {:>14}", format_rupees(portfolio.total_in_goals));
    println!("{}", "-".repeat(32));
    println!("Net worth:       {:>14}", format_rupees(portfolio.net_worth()));

    if !portfolio.holdings.is_empty() {
        println!("\nHoldings:");
        for holding in &portfolio.holdings {
            println!(
                "  {:<28} {:>14}  ({} investments)",
                holding.asset_name,
                format_rupees(holding.invested),
                holding.count
            );
        }
    }

    if !portfolio.goals.is_empty() {
        println!("\nGoals ({} active):", portfolio.active_goals);
        for goal in &portfolio.goals {
            println!(
                "  {} {:<24} {:>5.0}%  {}",
                goal.icon,
                goal.name,
                goal.progress_percent(),
                goal.status
            );
        }
    }
    Ok(())
}

async fn run_check_command(service: &LedgerService, uid: &str) -> Result<()> {
    println!("Checking wallet integrity...\n");

    let report = service.check_integrity(uid).await?;

    println!("Transactions: {}", report.transaction_count);
    println!("Goals:        {}", report.goal_count);
    println!();
    println!("  {:<16} {:>14}", "Deposited:", format_rupees(report.total_deposited));
    println!("  {:<16} {:>14}", "Withdrawn:", format_rupees(-report.total_withdrawn));
    println!("  {:<16} {:>14}", "Invested:", format_rupees(-report.total_invested));
    println!("  {:<16} {:>14}", "Into goals:", format_rupees(-report.total_in_goals));
    println!("  {}", "-".repeat(31));
    println!("  {:<16} {:>14}", "Expected:", format_rupees(report.replayed_balance));
    println!("  {:<16} {:>14}", "Stored:", format_rupees(report.stored_balance));
    println!();

    if report.is_valid() {
        println!("Wallet is consistent.");
        Ok(())
    } else {
        if report.drift() != 0 {
            println!("  - balance drift of {}", format_rupees(report.drift()));
        }
        if report.invalid_amounts > 0 {
            println!("  - {} transactions with non-positive amounts", report.invalid_amounts);
        }
        if report.stored_balance < 0 {
            println!("  - stored balance is negative");
        }
        bail!("Wallet integrity check failed")
    }
}

async fn run_export_command(
    service: &LedgerService,
    uid: &str,
    export_type: &str,
    output: Option<&str>,
) -> Result<()> {
    use crate::io::Exporter;
    use std::fs::File;
    use std::io::{Write, stdout};

    let exporter = Exporter::new(service);

    let writer: Box<dyn Write> = match output {
        Some(path) => {
            let file = File::create(path)
                .with_context(|| format!("Failed to create output file: {}", path))?;
            Box::new(file)
        }
        None => Box::new(stdout()),
    };

    match export_type {
        "transactions" => {
            let count = exporter.export_transactions_csv(uid, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} transactions", count);
            }
        }
        "expenses" => {
            let count = exporter.export_expenses_csv(uid, writer).await?;
            if output.is_some() {
                eprintln!("Exported {} expenses", count);
            }
        }
        "snapshot" => {
            let snapshot = exporter.export_snapshot_json(uid, writer).await?;
            if output.is_some() {
                eprintln!(
                    "Exported snapshot with {} transactions",
                    snapshot.portfolio.transactions.len()
                );
            }
        }
        other => bail!(
            "Unknown export type '{}'. Valid types: transactions, expenses, snapshot",
            other
        ),
    }
    Ok(())
}

/// Pick the given bank account, or the primary one when none is named.
async fn resolve_bank(service: &LedgerService, uid: &str, bank: Option<String>) -> Result<String> {
    if let Some(id) = bank {
        return Ok(id);
    }
    let profile = service.get_profile(uid).await?;
    profile
        .primary_bank_account()
        .map(|a| a.id.clone())
        .context("No bank account linked. Use `pocket bank link` first")
}

async fn signed_in_user(service: &LedgerService, session_file: &Path) -> Result<String> {
    let token = load_session(session_file)?
        .context("Not signed in. Use `pocket signup` or `pocket login` first")?;
    Ok(IdentityService::new(service.store()).resolve(&token).await?)
}

/// The session token lives next to the database it belongs to.
fn session_path(database: &str) -> PathBuf {
    PathBuf::from(format!("{}.session", database))
}

fn save_session(path: &Path, token: &str) -> Result<()> {
    fs::write(path, token).with_context(|| format!("Failed to write {}", path.display()))
}

fn load_session(path: &Path) -> Result<Option<String>> {
    if !path.exists() {
        return Ok(None);
    }
    let token = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    let token = token.trim();
    Ok((!token.is_empty()).then(|| token.to_string()))
}

fn parse_amount(input: &str) -> Result<i64> {
    parse_rupees(input)
        .with_context(|| format!("Invalid amount '{}'. Use '500' or '1,250.50'", input))
}

fn parse_transaction_type(input: &str) -> Result<TransactionType> {
    match input.to_lowercase().as_str() {
        "deposit" => Ok(TransactionType::Deposit),
        "withdrawal" | "withdraw" => Ok(TransactionType::Withdrawal),
        "investment" | "invest" => Ok(TransactionType::Investment),
        _ => bail!(
            "Invalid transaction type '{}'. Valid types: deposit, withdrawal, investment",
            input
        ),
    }
}

fn parse_date(date_str: &str) -> Result<DateTime<Utc>> {
    let naive_date = NaiveDate::parse_from_str(date_str, "%Y-%m-%d")
        .with_context(|| format!("Invalid date format '{}'. Use YYYY-MM-DD", date_str))?;
    let naive_datetime = naive_date
        .and_hms_opt(0, 0, 0)
        .ok_or_else(|| anyhow!("Invalid date"))?;
    Ok(naive_datetime.and_utc())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_transaction_type() {
        assert_eq!(parse_transaction_type("Deposit").unwrap(), TransactionType::Deposit);
        assert_eq!(parse_transaction_type("invest").unwrap(), TransactionType::Investment);
        assert!(parse_transaction_type("transfer").is_err());
    }

    #[test]
    fn test_parse_date() {
        let date = parse_date("2024-03-15").unwrap();
        assert_eq!(date.format("%Y-%m-%d").to_string(), "2024-03-15");
        assert!(parse_date("15/03/2024").is_err());
    }

    #[test]
    fn test_session_file_roundtrip() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("pocket.db.session");

        assert_eq!(load_session(&path).unwrap(), None);
        save_session(&path, "abc123").unwrap();
        assert_eq!(load_session(&path).unwrap().as_deref(), Some("abc123"));
    }

    #[test]
    fn test_cli_parses_global_database() {
        let cli = Cli::try_parse_from(["pocket", "deposit", "500", "--database", "x.db"]).unwrap();
        assert_eq!(cli.database.as_deref(), Some("x.db"));
        assert!(matches!(cli.command, Commands::Deposit { .. }));
    }
}
