//! Key paths of every node the application reads or writes.

pub const INVESTMENT_OPTIONS: &str = "investmentOptions";
pub const LESSONS: &str = "lessons";
pub const FAQS: &str = "faqs";
pub const CREDENTIALS: &str = "credentials";
pub const SESSIONS: &str = "sessions";

pub fn profile(uid: &str) -> String {
    format!("users/{uid}/profile")
}

pub fn transactions(uid: &str) -> String {
    format!("users/{uid}/transactions")
}

pub fn goals(uid: &str) -> String {
    format!("users/{uid}/goals")
}

pub fn goal(uid: &str, goal_id: &str) -> String {
    child(&goals(uid), goal_id)
}

pub fn bank_accounts(uid: &str) -> String {
    format!("users/{uid}/bankAccounts")
}

pub fn bank_account(uid: &str, bank_id: &str) -> String {
    child(&bank_accounts(uid), bank_id)
}

pub fn expenses(uid: &str) -> String {
    format!("users/{uid}/expenses")
}

pub fn investment_option(id: &str) -> String {
    child(INVESTMENT_OPTIONS, id)
}

pub fn lesson(id: &str) -> String {
    child(LESSONS, id)
}

pub fn credential(email_key: &str) -> String {
    child(CREDENTIALS, email_key)
}

pub fn session(token: &str) -> String {
    child(SESSIONS, token)
}

pub fn child(parent: &str, key: &str) -> String {
    format!("{parent}/{key}")
}

/// Parent path and final key of `path`. Top-level nodes have an empty parent.
pub fn split(path: &str) -> (&str, &str) {
    match path.rsplit_once('/') {
        Some((parent, key)) => (parent, key),
        None => ("", path),
    }
}

/// A single path segment must be non-empty and free of separators.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty()
        && !key
            .chars()
            .any(|c| matches!(c, '/' | '.' | '#' | '$' | '[' | ']') || c.is_control())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_paths() {
        assert_eq!(profile("u1"), "users/u1/profile");
        assert_eq!(goal("u1", "g1"), "users/u1/goals/g1");
        assert_eq!(bank_account("u1", "b1"), "users/u1/bankAccounts/b1");
    }

    #[test]
    fn test_split() {
        assert_eq!(split("users/u1/goals/g1"), ("users/u1/goals", "g1"));
        assert_eq!(split("lessons"), ("", "lessons"));
    }

    #[test]
    fn test_key_validation() {
        assert!(is_valid_key("0191a2b3-c4d5"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a/b"));
        assert!(!is_valid_key("asha@example.com"));
    }
}
