use crate::gen1;
use log::warn;
use std::collections::{HashMap, HashSet};

pub const DEFAULT_SCORE: i64 = 1;

/// Suffix-to-score table with a one-time warning per unknown suffix.
/// Owned by the driver for the run's lifetime; never ambient state.
#[derive(Clone, Debug, Default)]
pub struct ScoreTable {
    scores: HashMap<String, i64>,
    warned: HashSet<String>,
}

impl ScoreTable {
    pub fn new(scores: HashMap<String, i64>) -> Self {
        Self {
            scores,
            warned: HashSet::new(),
        }
    }

    /// Desirability score for one line. Non-Gen1 lines are not
    /// differentiated by suffix quality and always score the default.
    pub fn score(&mut self, line: &str) -> i64 {
        if !gen1::is_gen1(line) {
            return DEFAULT_SCORE;
        }
        let suffix = gen1::score_suffix(line);
        if let Some(score) = self.scores.get(&suffix) {
            return *score;
        }
        if self.warned.insert(suffix.clone()) {
            warn!("Using default score for suffix {suffix}");
        }
        self.scores.insert(suffix, DEFAULT_SCORE);
        DEFAULT_SCORE
    }

    pub fn get(&self, suffix: &str) -> Option<i64> {
        self.scores.get(suffix).copied()
    }

    pub fn has_warned(&self, suffix: &str) -> bool {
        self.warned.contains(suffix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> ScoreTable {
        let mut scores = HashMap::new();
        scores.insert("BB_21".to_string(), 5);
        scores.insert("AE_01".to_string(), 3);
        ScoreTable::new(scores)
    }

    #[test]
    fn non_gen1_lines_always_score_default() {
        let mut t = table();
        assert_eq!(t.score("R57C10-AD"), DEFAULT_SCORE);
        assert_eq!(t.score("not a line"), DEFAULT_SCORE);
        // Table untouched by non-Gen1 lookups
        assert_eq!(t.get("R57C10-AD"), None);
    }

    #[test]
    fn known_suffix_returns_table_value_without_mutation() {
        let mut t = table();
        assert_eq!(t.score("BJD_112C03_BB_21"), 5);
        assert_eq!(t.score("BJD_112C03_BB_21"), 5);
        assert_eq!(t.get("BB_21"), Some(5));
        assert!(!t.has_warned("BB_21"));
    }

    #[test]
    fn unknown_suffix_inserts_default_and_warns_once() {
        let mut t = table();
        assert_eq!(t.get("XX_99"), None);
        assert_eq!(t.score("BJD_112C03_XX_99"), DEFAULT_SCORE);
        assert_eq!(t.get("XX_99"), Some(DEFAULT_SCORE));
        assert!(t.has_warned("XX_99"));
        // Subsequent calls are table hits and stay at the default.
        assert_eq!(t.score("GMR_12C03_XX_99"), DEFAULT_SCORE);
        assert_eq!(t.get("XX_99"), Some(DEFAULT_SCORE));
    }
}
