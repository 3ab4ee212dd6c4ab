//! The "Scarce" selection algorithm.
//!
//! Each candidate gets a rating (title seniority) and a priority (business
//! function) from the bias tables. Candidates are stably sorted by
//! `rating + priority`; long lists keep only their best fraction, and the
//! result is finally capped at a hard limit.

use std::sync::Arc;

use rolodex_shared::{BiasTables, Contact, ScoredContact, SelectionConfig};
use tracing::debug;

/// Classifies, ranks and truncates candidate contacts.
#[derive(Debug, Clone)]
pub struct Scorer {
    tables: Arc<BiasTables>,
    selection: SelectionConfig,
}

impl Scorer {
    pub fn new(tables: Arc<BiasTables>, selection: SelectionConfig) -> Self {
        Self { tables, selection }
    }

    pub fn tables(&self) -> &BiasTables {
        &self.tables
    }

    pub fn selection(&self) -> &SelectionConfig {
        &self.selection
    }

    /// Attach rating and priority to a single contact.
    pub fn classify(&self, contact: Contact) -> ScoredContact {
        let rating = self.tables.rating_for(&contact.title);
        let priority = self.tables.priority_for(&contact.title);
        ScoredContact {
            contact,
            rating,
            priority,
        }
    }

    /// Classify every contact and stably sort by combined score.
    pub fn rank(&self, contacts: Vec<Contact>) -> Vec<ScoredContact> {
        let mut scored: Vec<ScoredContact> =
            contacts.into_iter().map(|c| self.classify(c)).collect();
        // `sort_by_key` is stable: equal scores keep their input order.
        scored.sort_by_key(ScoredContact::score);
        scored
    }

    /// Rank and apply both truncation stages.
    pub fn select(&self, contacts: Vec<Contact>) -> Vec<ScoredContact> {
        let candidates = contacts.len();
        let mut ranked = self.rank(contacts);
        ranked.truncate(quota(ranked.len(), &self.selection));
        debug!(candidates, selected = ranked.len(), "scarce selection applied");
        ranked
    }
}

/// How many of `len` ranked contacts survive both truncation stages.
pub fn quota(len: usize, selection: &SelectionConfig) -> usize {
    let after_first_cut = if len >= selection.first_cut_threshold {
        len * selection.keep_numerator / selection.keep_denominator
    } else {
        len
    };
    after_first_cut.min(selection.hard_cap)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scorer() -> Scorer {
        Scorer::new(Arc::new(BiasTables::default()), SelectionConfig::default())
    }

    fn contact(name: &str, title: &str) -> Contact {
        Contact {
            account_ref: "001A".into(),
            name: name.into(),
            title: title.into(),
            email: format!("{}@example.org", name.to_lowercase().replace(' ', ".")),
            ..Default::default()
        }
    }

    fn many(n: usize) -> Vec<Contact> {
        (0..n).map(|i| contact(&format!("Person {i}"), "Intern")).collect()
    }

    #[test]
    fn truncation_boundaries() {
        let selection = SelectionConfig::default();
        assert_eq!(quota(0, &selection), 0);
        assert_eq!(quota(44, &selection), 44);
        assert_eq!(quota(45, &selection), 15);
        assert_eq!(quota(90, &selection), 30);
        assert_eq!(quota(200, &selection), 60);
    }

    #[test]
    fn hard_cap_applies_without_first_cut() {
        let selection = SelectionConfig {
            first_cut_threshold: 1000,
            hard_cap: 50,
            ..SelectionConfig::default()
        };
        assert_eq!(quota(44, &selection), 44);
        assert_eq!(quota(120, &selection), 50);
    }

    #[test]
    fn select_respects_quota() {
        let s = scorer();
        assert_eq!(s.select(many(44)).len(), 44);
        assert_eq!(s.select(many(45)).len(), 15);
        assert_eq!(s.select(many(90)).len(), 30);
        assert_eq!(s.select(many(300)).len(), 60);
    }

    #[test]
    fn classification_uses_both_tables() {
        let s = scorer();
        let scored = s.classify(contact("Jane Doe", "VP of Talent Acquisition"));
        assert_eq!(scored.rating, 1);
        assert_eq!(scored.priority, 0);
        assert_eq!(scored.score(), 1);

        let scored = s.classify(contact("Joe Bloggs", "Intern"));
        assert_eq!(scored.rating, s.tables().unmatched_rating());
        assert_eq!(scored.priority, s.tables().unmatched_priority());
    }

    #[test]
    fn scoring_is_independent_of_input_order() {
        let s = scorer();
        let input = vec![
            contact("A", "Chief People Officer"),
            contact("B", "Recruiting Manager"),
            contact("C", "Intern"),
            contact("D", "Director, Finance"),
        ];
        let mut reversed = input.clone();
        reversed.reverse();

        let forward = s.rank(input);
        let backward = s.rank(reversed);
        for scored in &forward {
            let twin = backward
                .iter()
                .find(|b| b.contact.name == scored.contact.name)
                .unwrap();
            assert_eq!(twin.rating, scored.rating);
            assert_eq!(twin.priority, scored.priority);
        }
    }

    #[test]
    fn ranking_is_stable_for_equal_scores() {
        let s = scorer();
        let ranked = s.rank(vec![
            contact("First", "Intern"),
            contact("Boss", "Chief Talent Officer"),
            contact("Second", "Volunteer"),
            contact("Third", "Intern"),
        ]);
        let names: Vec<_> = ranked.iter().map(|c| c.contact.name.as_str()).collect();
        assert_eq!(names, ["Boss", "First", "Second", "Third"]);
    }

    #[test]
    fn best_contacts_survive_the_cut() {
        let s = scorer();
        let mut contacts = many(60);
        contacts.push(contact("Top Pick", "Head of People"));
        let selected = s.select(contacts);
        assert_eq!(selected.len(), 20);
        assert_eq!(selected[0].contact.name, "Top Pick");
    }
}
