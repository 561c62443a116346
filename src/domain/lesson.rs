use serde::{Deserialize, Serialize};

pub type LessonId = String;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Lesson {
    pub id: LessonId,
    pub title: String,
    pub content: String,
    pub duration: String,
    pub category: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Faq {
    pub id: String,
    pub question: String,
    pub answer: String,
}

pub fn default_lessons() -> Vec<Lesson> {
    vec![
        Lesson {
            id: "compounding".into(),
            title: "The magic of compounding".into(),
            content: "Interest earns interest. ₹1,000 at 7% becomes ₹1,070 after a year and ₹1,967 after ten, without adding a rupee.".into(),
            duration: "2 min".into(),
            category: "Basics".into(),
        },
        Lesson {
            id: "sip-basics".into(),
            title: "What is a SIP?".into(),
            content: "A Systematic Investment Plan puts a fixed amount into a fund every month, so you buy more units when prices are low and fewer when they are high.".into(),
            duration: "3 min".into(),
            category: "Mutual Funds".into(),
        },
        Lesson {
            id: "emergency-fund".into(),
            title: "Build an emergency fund first".into(),
            content: "Keep three to six months of expenses somewhere safe and easy to reach before you take on market risk.".into(),
            duration: "2 min".into(),
            category: "Planning".into(),
        },
        Lesson {
            id: "risk-return".into(),
            title: "Risk and return".into(),
            content: "Higher expected returns come with bigger swings. Match the product to how long you can leave the money alone.".into(),
            duration: "3 min".into(),
            category: "Basics".into(),
        },
    ]
}

pub fn default_faqs() -> Vec<Faq> {
    vec![
        Faq {
            id: "min-amount".into(),
            question: "How little can I start with?".into(),
            answer: "Some products accept as little as ₹10. Each product lists its minimum amount.".into(),
        },
        Faq {
            id: "wallet".into(),
            question: "What is the wallet?".into(),
            answer: "Your in-app balance. Add money from a linked bank account, then invest or save towards goals from it.".into(),
        },
        Faq {
            id: "withdraw".into(),
            question: "Can I take money back out?".into(),
            answer: "Yes. Anything in your wallet can be withdrawn to a linked bank account at any time.".into(),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_ids_are_unique() {
        let lessons = default_lessons();
        let mut ids: Vec<&str> = lessons.iter().map(|l| l.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), lessons.len());
    }
}
