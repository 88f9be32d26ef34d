use crate::persistence::TestRecord;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: String,
    pub title: String,
    pub description: String,
}

struct Rule {
    id: &'static str,
    title: &'static str,
    description: &'static str,
    unlocked: fn(&[TestRecord]) -> bool,
}

const RULES: &[Rule] = &[
    Rule {
        id: "first_test",
        title: "First Steps",
        description: "Complete a typing test",
        unlocked: |records| !records.is_empty(),
    },
    Rule {
        id: "ten_tests",
        title: "Regular",
        description: "Complete ten typing tests",
        unlocked: |records| records.len() >= 10,
    },
    Rule {
        id: "speed_40",
        title: "Cruising",
        description: "Reach 40 net WPM",
        unlocked: |records| records.iter().any(|r| r.result.net_wpm >= 40),
    },
    Rule {
        id: "speed_70",
        title: "Fast Fingers",
        description: "Reach 70 net WPM",
        unlocked: |records| records.iter().any(|r| r.result.net_wpm >= 70),
    },
    Rule {
        id: "speed_100",
        title: "Triple Digits",
        description: "Reach 100 net WPM",
        unlocked: |records| records.iter().any(|r| r.result.net_wpm >= 100),
    },
    Rule {
        id: "flawless",
        title: "Flawless",
        description: "Finish a test of at least 30 seconds with 100% accuracy",
        unlocked: |records| {
            records
                .iter()
                .any(|r| r.result.accuracy == 100 && r.result.time_taken >= 30.0 && r.result.cpm > 0)
        },
    },
    Rule {
        id: "marathon",
        title: "Marathon",
        description: "Finish a test lasting two minutes or more",
        unlocked: |records| records.iter().any(|r| r.result.time_taken >= 120.0),
    },
];

/// Every achievement unlocked by a history of records, in catalogue order
pub fn evaluate(records: &[TestRecord]) -> Vec<Achievement> {
    RULES
        .iter()
        .filter(|rule| (rule.unlocked)(records))
        .map(|rule| Achievement {
            id: rule.id.to_string(),
            title: rule.title.to_string(),
            description: rule.description.to_string(),
        })
        .collect()
}

/// Achievements in `after` that are missing from `before`
pub fn newly_unlocked(before: &[Achievement], after: Vec<Achievement>) -> Vec<Achievement> {
    after
        .into_iter()
        .filter(|a| !before.iter().any(|b| b.id == a.id))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::{Difficulty, Language, Mode};
    use crate::stats::TestResult;
    use chrono::Utc;

    fn record(net_wpm: u32, accuracy: u32, time_taken: f64) -> TestRecord {
        TestRecord {
            result: TestResult {
                wpm: net_wpm,
                accuracy,
                errors: 0,
                cpm: net_wpm * 5,
                gross_wpm: net_wpm,
                net_wpm,
                time_taken,
                timestamp: Utc::now(),
            },
            difficulty: Difficulty::Medium,
            mode: Mode::Words,
            language: Language::English,
            duration_secs: time_taken as u32,
        }
    }

    fn ids(achievements: &[Achievement]) -> Vec<&str> {
        achievements.iter().map(|a| a.id.as_str()).collect()
    }

    #[test]
    fn nothing_without_history() {
        assert!(evaluate(&[]).is_empty());
    }

    #[test]
    fn speed_and_accuracy_rules() {
        let unlocked = evaluate(&[record(72, 100, 30.0)]);
        assert_eq!(ids(&unlocked), vec!["first_test", "speed_40", "speed_70", "flawless"]);
    }

    #[test]
    fn marathon_needs_two_minutes() {
        assert!(!ids(&evaluate(&[record(20, 90, 119.0)])).contains(&"marathon"));
        assert!(ids(&evaluate(&[record(20, 90, 120.0)])).contains(&"marathon"));
    }

    #[test]
    fn diff_reports_only_new_ones() {
        let before = evaluate(&[record(30, 90, 60.0)]);
        let after = evaluate(&[record(30, 90, 60.0), record(45, 95, 60.0)]);
        assert_eq!(ids(&newly_unlocked(&before, after)), vec!["speed_40"]);
    }
}
