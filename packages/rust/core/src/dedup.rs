//! Candidate deduplication against an account's existing contacts.
//!
//! A candidate survives only if it has an email, and neither its name, its
//! email, nor its email domain collides with an existing contact or with the
//! account's own website domain.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;
use rolodex_shared::{Account, Contact, email_domain};

/// Why a candidate was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DropReason {
    MissingEmail,
    DuplicateName,
    DuplicateEmail,
    SameDomain,
}

/// Counts of kept and dropped candidates, by reason.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DedupReport {
    pub kept: usize,
    pub missing_email: usize,
    pub duplicate_name: usize,
    pub duplicate_email: usize,
    pub same_domain: usize,
}

impl DedupReport {
    pub fn dropped(&self) -> usize {
        self.missing_email + self.duplicate_name + self.duplicate_email + self.same_domain
    }

    fn record(&mut self, reason: Option<DropReason>) {
        match reason {
            None => self.kept += 1,
            Some(DropReason::MissingEmail) => self.missing_email += 1,
            Some(DropReason::DuplicateName) => self.duplicate_name += 1,
            Some(DropReason::DuplicateEmail) => self.duplicate_email += 1,
            Some(DropReason::SameDomain) => self.same_domain += 1,
        }
    }
}

/// Exclusion keys built from an account and its existing contacts.
#[derive(Debug, Clone, Default)]
pub struct ExclusionSet {
    names: HashSet<String>,
    emails: HashSet<String>,
    domains: HashSet<String>,
}

impl ExclusionSet {
    pub fn new(account: &Account, existing: &[Contact]) -> Self {
        let mut set = Self::default();
        for contact in existing {
            set.names.insert(contact.name.clone());
            if !contact.email.is_empty() {
                set.emails.insert(contact.email.clone());
            }
            if let Some(domain) = contact.email_domain() {
                set.domains.insert(domain.to_lowercase());
            }
        }
        if let Some(domain) = account_domain(&account.domain) {
            set.domains.insert(domain);
        }
        set
    }

    /// `None` if the candidate should be kept.
    pub fn reject_reason(&self, candidate: &Contact) -> Option<DropReason> {
        if candidate.email.is_empty() {
            return Some(DropReason::MissingEmail);
        }
        if self.names.contains(&candidate.name) {
            return Some(DropReason::DuplicateName);
        }
        if self.emails.contains(&candidate.email) {
            return Some(DropReason::DuplicateEmail);
        }
        match email_domain(&candidate.email) {
            Some(domain) if self.domains.contains(&domain.to_lowercase()) => {
                Some(DropReason::SameDomain)
            }
            _ => None,
        }
    }
}

/// Extract the bare host from an account website.
///
/// Strips the scheme, any `user@` prefix and a leading `www.`, then cuts at
/// the first `:`, `/` or `?`. Returns `None` for an empty website.
pub fn account_domain(website: &str) -> Option<String> {
    static HOST_RE: LazyLock<Regex> = LazyLock::new(|| {
        Regex::new(r"(?i)^(?:https?://)?(?:[^@/\n]+@)?(?:www\.)?([^:/?\n]+)").expect("valid regex")
    });

    HOST_RE
        .captures(website.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
        .filter(|host| !host.is_empty())
}

/// Remove candidates that duplicate existing contacts. Order is preserved.
pub fn deduplicate(account: &Account, existing: &[Contact], candidates: Vec<Contact>) -> Vec<Contact> {
    deduplicate_with_report(account, existing, candidates).0
}

/// [`deduplicate`], also returning per-reason drop counts.
pub fn deduplicate_with_report(
    account: &Account,
    existing: &[Contact],
    candidates: Vec<Contact>,
) -> (Vec<Contact>, DedupReport) {
    let exclusions = ExclusionSet::new(account, existing);
    let mut report = DedupReport::default();

    let kept: Vec<Contact> = candidates
        .into_iter()
        .filter(|candidate| {
            let reason = exclusions.reject_reason(candidate);
            report.record(reason);
            reason.is_none()
        })
        .collect();

    (kept, report)
}
