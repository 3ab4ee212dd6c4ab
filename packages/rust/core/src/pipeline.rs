//! Per-account enrichment pipeline and the batch runner.
//!
//! `FETCH_COMPANY_INFO → FETCH_EXISTING_CONTACTS → FETCH_CANDIDATE_CONTACTS →
//! DEDUPLICATE → SCORE_AND_SELECT → FORMAT_PAYLOAD → write-back`
//!
//! Every stage up to the payload runs in memory and produces an
//! [`EnrichmentPlan`]; nothing reaches the system of record until the plan is
//! complete, so a failed fetch never leaves a partially enriched account.

use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info, instrument, warn};

use rolodex_shared::{
    Account, Contact, ContactPayload, EnrichmentSourceClient, Result, RolodexError,
    ScoredContact, SystemOfRecordClient,
};

use crate::dedup;
use crate::scarce::Scorer;
use crate::summary;

// ---------------------------------------------------------------------------
// Stages and errors
// ---------------------------------------------------------------------------

/// Stages that touch a collaborator, in execution order. The in-memory
/// stages cannot fail and have no variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    FetchCompanyInfo,
    FetchExistingContacts,
    FetchCandidateContacts,
    WriteBack,
}

impl Stage {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchCompanyInfo => "fetch_company_info",
            Self::FetchExistingContacts => "fetch_existing_contacts",
            Self::FetchCandidateContacts => "fetch_candidate_contacts",
            Self::WriteBack => "write_back",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An account-level failure tagged with the stage it happened in.
#[derive(Debug, thiserror::Error)]
#[error("{stage} failed: {source}")]
pub struct StageError {
    pub stage: Stage,
    #[source]
    pub source: RolodexError,
}

impl StageError {
    fn new(stage: Stage, source: RolodexError) -> Self {
        Self { stage, source }
    }
}

// ---------------------------------------------------------------------------
// Plan
// ---------------------------------------------------------------------------

/// Everything computed for one account before write-back.
#[derive(Debug, Clone)]
pub struct EnrichmentPlan {
    pub account: Account,
    /// Selected contacts, best first.
    pub selected: Vec<ScoredContact>,
    /// Write-back payloads, in the same order as `selected`.
    pub payloads: Vec<ContactPayload>,
    /// Company-info block and summary joined for the notes field.
    pub notes: String,
    pub existing_count: usize,
    pub candidate_count: usize,
    pub company_found: bool,
}

// ---------------------------------------------------------------------------
// Enricher
// ---------------------------------------------------------------------------

/// Runs the pipeline for single accounts. Cheap to clone and share.
#[derive(Debug, Clone)]
pub struct Enricher {
    scorer: Scorer,
    default_owner: String,
}

impl Enricher {
    pub fn new(scorer: Scorer, default_owner: impl Into<String>) -> Self {
        Self {
            scorer,
            default_owner: default_owner.into(),
        }
    }

    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Run every stage up to the payload. Performs no writes.
    #[instrument(skip_all, fields(account = %account.name, record_id = %account.record_id))]
    pub async fn plan_account(
        &self,
        account: &Account,
        record: &dyn SystemOfRecordClient,
        source: &dyn EnrichmentSourceClient,
    ) -> std::result::Result<EnrichmentPlan, StageError> {
        // --- FETCH_COMPANY_INFO ---
        let company = match source.find_company(account).await {
            Ok(company) => company,
            Err(e) => {
                warn!(
                    stage = %Stage::FetchCompanyInfo,
                    error = %e,
                    "company info unavailable, continuing without it"
                );
                None
            }
        };

        // --- FETCH_EXISTING_CONTACTS ---
        let existing = record
            .list_existing_contacts(account)
            .await
            .map_err(|e| StageError::new(Stage::FetchExistingContacts, e))?;

        // --- FETCH_CANDIDATE_CONTACTS ---
        let fetched = source
            .find_contacts(account)
            .await
            .map_err(|e| StageError::new(Stage::FetchCandidateContacts, e))?;
        let candidate_count = fetched.len();
        let candidates = sanitize_candidates(account, fetched);

        // --- DEDUPLICATE ---
        let (unique, report) = dedup::deduplicate_with_report(account, &existing, candidates);
        debug!(
            kept = report.kept,
            missing_email = report.missing_email,
            duplicate_name = report.duplicate_name,
            duplicate_email = report.duplicate_email,
            same_domain = report.same_domain,
            "deduplicated candidates"
        );

        // --- SCORE_AND_SELECT ---
        let selected = self.scorer.select(unique);

        // --- FORMAT_PAYLOAD ---
        let payloads = self.build_payloads(account, &selected);
        let company_info = summary::format_company_info(company.as_ref(), Utc::now());
        let summary_text =
            summary::format_enrichment_summary(existing.len(), candidate_count, &selected);
        let notes = summary::compose_notes(&company_info, &summary_text);

        info!(
            existing = existing.len(),
            candidates = candidate_count,
            selected = selected.len(),
            company_found = company.is_some(),
            "account planned"
        );

        Ok(EnrichmentPlan {
            account: account.clone(),
            selected,
            payloads,
            notes,
            existing_count: existing.len(),
            candidate_count,
            company_found: company.is_some(),
        })
    }

    /// Write a plan back: contacts, then notes, then the complete flag.
    /// Stops at the first failure, leaving the account pending.
    #[instrument(skip_all, fields(account = %plan.account.name, contacts = plan.payloads.len()))]
    pub async fn apply_plan(
        &self,
        plan: &EnrichmentPlan,
        record: &dyn SystemOfRecordClient,
    ) -> std::result::Result<usize, StageError> {
        let account = &plan.account;

        if !plan.payloads.is_empty() {
            record
                .write_contacts(account, &plan.payloads)
                .await
                .map_err(|e| {
                    error!(error = %e, "contact write failure");
                    debug!(
                        payload = %serde_json::to_string(&plan.payloads).unwrap_or_default(),
                        "contact dump"
                    );
                    write_failure(account, e)
                })?;
        }

        record
            .write_notes(account, &plan.notes)
            .await
            .map_err(|e| write_failure(account, e))?;

        record
            .mark_complete(account)
            .await
            .map_err(|e| write_failure(account, e))?;

        info!("enrichment completed");
        Ok(plan.payloads.len())
    }

    /// Plan and, unless `dry_run`, apply. Never fails: the result is an outcome.
    pub async fn enrich_account(
        &self,
        account: &Account,
        record: &dyn SystemOfRecordClient,
        source: &dyn EnrichmentSourceClient,
        dry_run: bool,
    ) -> AccountOutcome {
        let plan = match self.plan_account(account, record, source).await {
            Ok(plan) => plan,
            Err(e) => {
                warn!(account = %account.name, stage = %e.stage, error = %e.source, "account skipped");
                return AccountOutcome::new(account, AccountStatus::Skipped {
                    stage: e.stage,
                    reason: e.source.to_string(),
                });
            }
        };

        if dry_run {
            return AccountOutcome::new(account, AccountStatus::Planned {
                contacts_selected: plan.payloads.len(),
                notes: plan.notes,
            });
        }

        match self.apply_plan(&plan, record).await {
            Ok(added) => AccountOutcome::new(account, AccountStatus::Enriched {
                contacts_added: added,
            }),
            Err(e) => AccountOutcome::new(account, AccountStatus::Failed {
                reason: e.source.to_string(),
            }),
        }
    }

    fn build_payloads(&self, account: &Account, selected: &[ScoredContact]) -> Vec<ContactPayload> {
        selected
            .iter()
            .filter_map(|scored| {
                ContactPayload::from_contact(account, &scored.contact, &self.default_owner)
                    .map_err(|e| warn!(error = %e, "dropping contact from payload"))
                    .ok()
            })
            .collect()
    }
}

/// Drop candidates that cannot be written back (blank name).
fn sanitize_candidates(account: &Account, candidates: Vec<Contact>) -> Vec<Contact> {
    candidates
        .into_iter()
        .filter(|c| {
            if c.name.trim().is_empty() {
                let err = RolodexError::malformed(format!(
                    "candidate <{}> for account {} has no name",
                    c.email, account.name
                ));
                warn!(error = %err, "dropping candidate");
                false
            } else {
                true
            }
        })
        .collect()
}

fn write_failure(account: &Account, e: RolodexError) -> StageError {
    let source = match e {
        RolodexError::RecordWriteFailure { .. } => e,
        other => RolodexError::record_write(&account.name, other.to_string()),
    };
    StageError::new(Stage::WriteBack, source)
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// What happened to one account in a batch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccountStatus {
    /// Written back and marked complete.
    Enriched { contacts_added: usize },
    /// Dry run: planned but nothing written.
    Planned {
        contacts_selected: usize,
        notes: String,
    },
    /// A fetch failed; nothing written, account stays pending.
    Skipped { stage: Stage, reason: String },
    /// Write-back failed; account stays pending.
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountOutcome {
    pub record_id: String,
    pub name: String,
    pub status: AccountStatus,
}

impl AccountOutcome {
    fn new(account: &Account, status: AccountStatus) -> Self {
        Self {
            record_id: account.record_id.clone(),
            name: account.name.clone(),
            status,
        }
    }

    pub fn is_enriched(&self) -> bool {
        matches!(self.status, AccountStatus::Enriched { .. })
    }
}

/// Result of a batch run.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    /// One outcome per pending account, in listing order.
    pub outcomes: Vec<AccountOutcome>,
    pub elapsed: Duration,
}

impl BatchReport {
    pub fn enriched(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_enriched()).count()
    }

    pub fn contacts_added(&self) -> usize {
        self.outcomes
            .iter()
            .map(|o| match o.status {
                AccountStatus::Enriched { contacts_added } => contacts_added,
                _ => 0,
            })
            .sum()
    }

    pub fn skipped(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, AccountStatus::Skipped { .. }))
            .count()
    }

    pub fn failed(&self) -> usize {
        self.outcomes
            .iter()
            .filter(|o| matches!(o.status, AccountStatus::Failed { .. }))
            .count()
    }
}

// ---------------------------------------------------------------------------
// Progress
// ---------------------------------------------------------------------------

/// Progress callback for reporting batch status.
pub trait ProgressReporter: Send + Sync {
    /// Called when entering a new phase.
    fn phase(&self, name: &str);
    /// Called when an account finishes, in listing order.
    fn account_finished(&self, outcome: &AccountOutcome, current: usize, total: usize);
    /// Called when the batch completes.
    fn done(&self, report: &BatchReport);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn phase(&self, _name: &str) {}
    fn account_finished(&self, _outcome: &AccountOutcome, _current: usize, _total: usize) {}
    fn done(&self, _report: &BatchReport) {}
}

// ---------------------------------------------------------------------------
// Batch runner
// ---------------------------------------------------------------------------

/// Options for [`run_batch`].
#[derive(Debug, Clone, Copy)]
pub struct BatchOptions {
    /// Accounts enriched at the same time.
    pub concurrency: usize,
    /// Plan only, never write back.
    pub dry_run: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            concurrency: 4,
            dry_run: false,
        }
    }
}

/// Enrich every pending account.
///
/// Listing pending accounts is the only fatal step; after that each account
/// is isolated and reported through its [`AccountOutcome`].
#[instrument(skip_all, fields(concurrency = options.concurrency, dry_run = options.dry_run))]
pub async fn run_batch(
    enricher: Arc<Enricher>,
    record: Arc<dyn SystemOfRecordClient>,
    source: Arc<dyn EnrichmentSourceClient>,
    options: BatchOptions,
    progress: &dyn ProgressReporter,
) -> Result<BatchReport> {
    let start = Instant::now();

    progress.phase("Collecting accounts");
    let accounts = record.list_pending_accounts().await?;
    let total = accounts.len();
    info!(accounts = total, "starting enrichment batch");

    progress.phase("Enriching accounts");
    let semaphore = Arc::new(Semaphore::new(options.concurrency.max(1)));
    let mut handles = Vec::with_capacity(total);

    for account in accounts {
        let enricher = enricher.clone();
        let record = record.clone();
        let source = source.clone();
        let sem = semaphore.clone();
        let fallback = account.clone();

        let handle = tokio::spawn(async move {
            let Ok(_permit) = sem.acquire().await else {
                return AccountOutcome::new(&account, AccountStatus::Failed {
                    reason: "worker pool closed".into(),
                });
            };
            enricher
                .enrich_account(&account, record.as_ref(), source.as_ref(), options.dry_run)
                .await
        });
        handles.push((fallback, handle));
    }

    let mut outcomes = Vec::with_capacity(total);
    for (i, (account, handle)) in handles.into_iter().enumerate() {
        let outcome = match handle.await {
            Ok(outcome) => outcome,
            Err(e) => {
                error!(account = %account.name, error = %e, "enrichment task aborted");
                AccountOutcome::new(&account, AccountStatus::Failed {
                    reason: format!("task aborted: {e}"),
                })
            }
        };
        progress.account_finished(&outcome, i + 1, total);
        outcomes.push(outcome);
    }

    let report = BatchReport {
        outcomes,
        elapsed: start.elapsed(),
    };

    progress.done(&report);

    info!(
        accounts = total,
        enriched = report.enriched(),
        contacts_added = report.contacts_added(),
        skipped = report.skipped(),
        failed = report.failed(),
        elapsed_ms = report.elapsed.as_millis(),
        "enrichment batch complete"
    );

    Ok(report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
