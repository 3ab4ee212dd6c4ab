//! Core enrichment logic for Rolodex.
//!
//! - [`dedup`] filters candidates against existing contacts
//! - [`scarce`] classifies, ranks and truncates the survivors
//! - [`summary`] renders the notes written back to the account
//! - [`pipeline`] runs the stages per account and drives a batch

pub mod dedup;
pub mod pipeline;
pub mod scarce;
pub mod summary;

pub use dedup::{DedupReport, DropReason, account_domain, deduplicate, deduplicate_with_report};
pub use pipeline::{
    AccountOutcome, AccountStatus, BatchOptions, BatchReport, EnrichmentPlan, Enricher,
    ProgressReporter, SilentProgress, Stage, StageError, run_batch,
};
pub use scarce::{Scorer, quota};
