//! Shared types, error model, and configuration for Rolodex.
//!
//! This crate is the foundation depended on by all other Rolodex crates.
//! It provides:
//! - [`RolodexError`], the unified error type
//! - Record types ([`Account`], [`Contact`], [`ScoredContact`], [`CompanyFacts`], [`ContactPayload`])
//! - Classification tables ([`BiasTables`])
//! - Collaborator traits ([`SystemOfRecordClient`], [`EnrichmentSourceClient`])
//! - Configuration ([`AppConfig`], [`SelectionConfig`], config loading)

pub mod bias;
pub mod clients;
pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use bias::{BiasTables, DEFAULT_FUNCTION_BIAS, DEFAULT_TITLE_BIAS};
pub use clients::{EnrichmentSourceClient, SystemOfRecordClient};
pub use config::{
    AppConfig, BiasConfig, RecordConfig, RunConfig, SelectionConfig, SourceConfig,
    SourceCredentials, config_dir, config_file_path, expand_home, init_config, load_config,
    load_config_from, load_source_credentials,
};
pub use error::{Result, RolodexError};
pub use types::{
    Account, CompanyFacts, CompanyLocation, Contact, ContactPayload, ContactStatus,
    ScoredContact, email_domain, split_name,
};
