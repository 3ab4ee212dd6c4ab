//! Title and function classification tables used by the scorer.
//!
//! Tokens are matched as case-insensitive substrings of a contact's title.
//! Acronyms that occur inside common words (`CTO` in `DIRECTOR`, `COO` in
//! `COORDINATOR`) are left out of the defaults.

use serde::{Deserialize, Serialize};

use crate::error::{Result, RolodexError};

/// Built-in title groups, best first. The group index is the rating.
pub const DEFAULT_TITLE_BIAS: &[&[&str]] = &[
    &["CHIEF", "FOUNDER", "OWNER", "CEO"],
    &["VP", "VICE PRESIDENT", "HEAD OF"],
    &["DIRECTOR"],
    &["MANAGER", "LEAD"],
    &["SPECIALIST", "COORDINATOR", "PARTNER", "GENERALIST", "ANALYST"],
];

/// Built-in function tokens, best first. The token index is the priority.
pub const DEFAULT_FUNCTION_BIAS: &[&str] = &[
    "TALENT",
    "RECRUIT",
    "PEOPLE",
    "HUMAN RESOURCES",
    "HR",
    "OPERATIONS",
    "FINANCE",
    "TECHNOLOGY",
];

/// Immutable classification tables injected into the scorer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BiasTables {
    title_groups: Vec<Vec<String>>,
    functions: Vec<String>,
}

impl Default for BiasTables {
    fn default() -> Self {
        Self {
            title_groups: DEFAULT_TITLE_BIAS
                .iter()
                .map(|group| group.iter().map(|t| (*t).to_string()).collect())
                .collect(),
            functions: DEFAULT_FUNCTION_BIAS.iter().map(|t| (*t).to_string()).collect(),
        }
    }
}

impl BiasTables {
    /// Build tables from custom token lists. Tokens are upper-cased and
    /// trimmed; empty tokens and empty groups are rejected.
    pub fn new(title_groups: Vec<Vec<String>>, functions: Vec<String>) -> Result<Self> {
        let title_groups = title_groups
            .into_iter()
            .enumerate()
            .map(|(i, group)| {
                let group = normalize_tokens(group)
                    .map_err(|e| RolodexError::validation(format!("title group {i}: {e}")))?;
                if group.is_empty() {
                    return Err(RolodexError::validation(format!("title group {i} is empty")));
                }
                Ok(group)
            })
            .collect::<Result<Vec<_>>>()?;
        let functions = normalize_tokens(functions)
            .map_err(|e| RolodexError::validation(format!("function tokens: {e}")))?;

        Ok(Self {
            title_groups,
            functions,
        })
    }

    pub fn title_groups(&self) -> &[Vec<String>] {
        &self.title_groups
    }

    pub fn functions(&self) -> &[String] {
        &self.functions
    }

    /// Rating given to titles that match no group.
    pub fn unmatched_rating(&self) -> usize {
        self.title_groups.len()
    }

    /// Priority given to titles that match no function token.
    pub fn unmatched_priority(&self) -> usize {
        self.functions.len()
    }

    /// Index of the first title group with a token contained in `title`.
    pub fn rating_for(&self, title: &str) -> usize {
        let title = title.to_uppercase();
        self.title_groups
            .iter()
            .position(|group| group.iter().any(|token| title.contains(token.as_str())))
            .unwrap_or_else(|| self.unmatched_rating())
    }

    /// Index of the first function token contained in `title`.
    pub fn priority_for(&self, title: &str) -> usize {
        let title = title.to_uppercase();
        self.functions
            .iter()
            .position(|token| title.contains(token.as_str()))
            .unwrap_or_else(|| self.unmatched_priority())
    }
}

fn normalize_tokens(tokens: Vec<String>) -> std::result::Result<Vec<String>, String> {
    tokens
        .into_iter()
        .map(|t| {
            let t = t.trim().to_uppercase();
            if t.is_empty() {
                Err("empty token".to_string())
            } else {
                Ok(t)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_tables_classify_titles() {
        let tables = BiasTables::default();
        assert_eq!(tables.rating_for("Chief People Officer"), 0);
        assert_eq!(tables.rating_for("vp, talent acquisition"), 1);
        assert_eq!(tables.rating_for("Director of Engineering"), 2);
        assert_eq!(tables.rating_for("HR Coordinator"), 4);
        assert_eq!(tables.rating_for("Intern"), tables.unmatched_rating());

        assert_eq!(tables.priority_for("Director of Talent"), 0);
        assert_eq!(tables.priority_for("Senior Recruiter"), 1);
        assert_eq!(tables.priority_for("Intern"), tables.unmatched_priority());
    }

    #[test]
    fn first_matching_group_wins() {
        let tables = BiasTables::new(
            vec![vec!["vice president".into()], vec!["president".into()]],
            vec![],
        )
        .unwrap();
        assert_eq!(tables.rating_for("Vice President, Sales"), 0);
        assert_eq!(tables.rating_for("President"), 1);
        assert_eq!(tables.priority_for("President"), tables.unmatched_priority());
    }

    #[test]
    fn sentinels_exceed_every_index() {
        let tables = BiasTables::default();
        assert_eq!(tables.unmatched_rating(), DEFAULT_TITLE_BIAS.len());
        assert_eq!(tables.unmatched_priority(), DEFAULT_FUNCTION_BIAS.len());
    }

    #[test]
    fn custom_tables_are_normalized() {
        let tables =
            BiasTables::new(vec![vec!["  cfo ".into()]], vec!["finance".into()]).unwrap();
        assert_eq!(tables.title_groups()[0][0], "CFO");
        assert_eq!(tables.functions()[0], "FINANCE");
    }

    #[test]
    fn empty_group_rejected() {
        let err = BiasTables::new(vec![vec![]], vec![]).unwrap_err();
        assert!(err.to_string().contains("title group 0 is empty"));

        let err = BiasTables::new(vec![vec!["".into()]], vec![]).unwrap_err();
        assert!(err.to_string().contains("empty token"));
    }
}
