use serde::{Deserialize, Serialize};

use super::{Paise, RiskLevel};

pub type InvestmentOptionId = String;

/// How money goes into a product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ContributionType {
    /// One-time contribution
    Lumpsum,
    /// Systematic Investment Plan, a fixed monthly contribution
    #[serde(rename = "SIP")]
    Sip,
    /// Recurring deposit, also a fixed monthly contribution
    Recurring,
}

impl ContributionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ContributionType::Lumpsum => "Lumpsum",
            ContributionType::Sip => "SIP",
            ContributionType::Recurring => "Recurring",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, ContributionType::Lumpsum)
    }
}

impl std::fmt::Display for ContributionType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InvestmentCategory {
    #[serde(rename = "FD")]
    FixedDeposit,
    #[serde(rename = "RD")]
    RecurringDeposit,
    #[serde(rename = "MF")]
    MutualFund,
    #[serde(rename = "SIP")]
    Sip,
    Govt,
    Gold,
}

impl InvestmentCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            InvestmentCategory::FixedDeposit => "FD",
            InvestmentCategory::RecurringDeposit => "RD",
            InvestmentCategory::MutualFund => "MF",
            InvestmentCategory::Sip => "SIP",
            InvestmentCategory::Govt => "Govt",
            InvestmentCategory::Gold => "Gold",
        }
    }
}

impl std::fmt::Display for InvestmentCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A product users can invest in. Catalog data, never owned by a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InvestmentOption {
    pub id: InvestmentOptionId,
    pub title: String,
    pub short_desc: String,
    pub full_desc: String,
    pub how_it_works: String,
    #[serde(rename = "type")]
    pub contribution_type: ContributionType,
    pub category: InvestmentCategory,
    /// Annual rate as a percentage, e.g. 7.5
    pub interest_rate: f64,
    pub min_amount: Paise,
    pub risk: RiskLevel,
    pub is_govt_backed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lock_in_period: Option<String>,
}

/// Products seeded into a new store.
pub fn default_catalog() -> Vec<InvestmentOption> {
    vec![
        InvestmentOption {
            id: "fd-bank".into(),
            title: "Bank Fixed Deposit".into(),
            short_desc: "Lock in a guaranteed rate with your bank.".into(),
            full_desc: "Park a lump sum with a bank for a fixed term and earn a fixed rate of interest, compounded every year.".into(),
            how_it_works: "You deposit once, the bank pays interest on it, and you get everything back at maturity.".into(),
            contribution_type: ContributionType::Lumpsum,
            category: InvestmentCategory::FixedDeposit,
            interest_rate: 7.0,
            min_amount: 100_000,
            risk: RiskLevel::Low,
            is_govt_backed: false,
            lock_in_period: Some("1 year".into()),
        },
        InvestmentOption {
            id: "rd-post".into(),
            title: "Post Office Recurring Deposit".into(),
            short_desc: "Save a small fixed amount every month.".into(),
            full_desc: "Deposit the same amount each month and earn a government-guaranteed rate on the growing balance.".into(),
            how_it_works: "Every monthly deposit starts earning interest as soon as it lands.".into(),
            contribution_type: ContributionType::Recurring,
            category: InvestmentCategory::RecurringDeposit,
            interest_rate: 6.7,
            min_amount: 10_000,
            risk: RiskLevel::Low,
            is_govt_backed: true,
            lock_in_period: Some("5 years".into()),
        },
        InvestmentOption {
            id: "sip-index".into(),
            title: "Nifty 50 Index Fund SIP".into(),
            short_desc: "Own a slice of India's top 50 companies.".into(),
            full_desc: "A monthly SIP into a low-cost index fund that tracks the Nifty 50. Returns are market linked and not guaranteed.".into(),
            how_it_works: "Each month your SIP buys fund units at that day's price, averaging out your cost.".into(),
            contribution_type: ContributionType::Sip,
            category: InvestmentCategory::Sip,
            interest_rate: 12.0,
            min_amount: 10_000,
            risk: RiskLevel::Medium,
            is_govt_backed: false,
            lock_in_period: None,
        },
        InvestmentOption {
            id: "ppf".into(),
            title: "Public Provident Fund".into(),
            short_desc: "Tax-free, government-backed long-term savings.".into(),
            full_desc: "A long-term savings scheme with a rate set by the government every quarter.".into(),
            how_it_works: "Contribute a lump sum each year; interest compounds annually and is tax free.".into(),
            contribution_type: ContributionType::Lumpsum,
            category: InvestmentCategory::Govt,
            interest_rate: 7.1,
            min_amount: 50_000,
            risk: RiskLevel::Low,
            is_govt_backed: true,
            lock_in_period: Some("15 years".into()),
        },
        InvestmentOption {
            id: "gold-digital".into(),
            title: "Digital Gold".into(),
            short_desc: "Buy gold in amounts as small as ₹10.".into(),
            full_desc: "Purchase 24K gold stored in insured vaults on your behalf. Value moves with the gold price.".into(),
            how_it_works: "Each purchase converts your rupees to grams of gold at the live rate.".into(),
            contribution_type: ContributionType::Lumpsum,
            category: InvestmentCategory::Gold,
            interest_rate: 8.0,
            min_amount: 1_000,
            risk: RiskLevel::Medium,
            is_govt_backed: false,
            lock_in_period: None,
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contribution_type_wire_names() {
        assert_eq!(
            serde_json::to_string(&ContributionType::Sip).unwrap(),
            "\"SIP\""
        );
        assert!(ContributionType::Sip.is_recurring());
        assert!(ContributionType::Recurring.is_recurring());
        assert!(!ContributionType::Lumpsum.is_recurring());
    }

    #[test]
    fn test_option_serializes_type_field() {
        let option = &default_catalog()[0];
        let value = serde_json::to_value(option).unwrap();
        assert_eq!(value["type"], "Lumpsum");
        assert_eq!(value["category"], "FD");
        assert_eq!(value["interestRate"], 7.0);
    }

    #[test]
    fn test_default_catalog_ids_unique() {
        let catalog = default_catalog();
        let mut ids: Vec<_> = catalog.iter().map(|o| o.id.as_str()).collect();
        ids.sort();
        ids.dedup();
        assert_eq!(ids.len(), catalog.len());
        assert!(catalog.iter().all(|o| o.min_amount > 0));
    }
}
