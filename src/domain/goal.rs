use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::Paise;

pub type GoalId = String;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GoalStatus {
    #[default]
    Active,
    Completed,
    Paused,
}

impl GoalStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GoalStatus::Active => "Active",
            GoalStatus::Completed => "Completed",
            GoalStatus::Paused => "Paused",
        }
    }
}

impl std::fmt::Display for GoalStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A savings goal funded from the wallet.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Goal {
    pub id: GoalId,
    pub name: String,
    pub target_amount: Paise,
    /// Only ever grows, and only through wallet-funded contributions
    #[serde(default)]
    pub current_amount: Paise,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<NaiveDate>,
    #[serde(default = "default_icon")]
    pub icon: String,
    #[serde(default)]
    pub status: GoalStatus,
}

fn default_icon() -> String {
    "🎯".to_string()
}

impl Goal {
    pub fn new(id: GoalId, name: impl Into<String>, target_amount: Paise) -> Self {
        Self {
            id,
            name: name.into(),
            target_amount,
            current_amount: 0,
            deadline: None,
            icon: default_icon(),
            status: GoalStatus::Active,
        }
    }

    pub fn with_deadline(mut self, deadline: NaiveDate) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = icon.into();
        self
    }

    pub fn remaining(&self) -> Paise {
        (self.target_amount - self.current_amount).max(0)
    }

    /// Progress towards the target, capped at 100.
    pub fn progress_percent(&self) -> f64 {
        if self.target_amount <= 0 {
            return 0.0;
        }
        (self.current_amount as f64 / self.target_amount as f64 * 100.0).min(100.0)
    }

    /// Status the goal should have for its current amount: an active goal
    /// that reached its target is completed.
    pub fn settled_status(&self) -> GoalStatus {
        if self.status == GoalStatus::Active && self.current_amount >= self.target_amount {
            GoalStatus::Completed
        } else {
            self.status
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_progress_and_remaining() {
        let mut goal = Goal::new("g1".into(), "Laptop", 50_000);
        goal.current_amount = 12_500;
        assert_eq!(goal.remaining(), 37_500);
        assert_eq!(goal.progress_percent(), 25.0);

        goal.current_amount = 60_000;
        assert_eq!(goal.remaining(), 0);
        assert_eq!(goal.progress_percent(), 100.0);
    }

    #[test]
    fn test_settled_status() {
        let mut goal = Goal::new("g1".into(), "Trip", 10_000);
        goal.current_amount = 5_000;
        assert_eq!(goal.settled_status(), GoalStatus::Active);
        goal.current_amount = 10_000;
        assert_eq!(goal.settled_status(), GoalStatus::Completed);

        let mut paused = goal.clone();
        paused.status = GoalStatus::Paused;
        paused.current_amount = 20_000;
        assert_eq!(paused.settled_status(), GoalStatus::Paused);
    }

    #[test]
    fn test_deserialize_sparse_goal() {
        let goal: Goal = serde_json::from_value(serde_json::json!({
            "id": "g9",
            "name": "Bike",
            "targetAmount": 900
        }))
        .unwrap();
        assert_eq!(goal.current_amount, 0);
        assert_eq!(goal.status, GoalStatus::Active);
        assert_eq!(goal.icon, "🎯");
    }
}
