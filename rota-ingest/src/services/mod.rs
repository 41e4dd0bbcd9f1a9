//! Core normalization services
//!
//! Leaf-first: field cleaning and alias resolution, then validation, change
//! detection and the domain transform.

pub mod alias_resolver;
pub mod change_detector;
pub mod domain_transformer;
pub mod field_cleaner;
pub mod validator;

pub use alias_resolver::{AliasResolver, Resolution, ResolutionSource};
pub use change_detector::{ChangeDetector, DatasetFingerprint, RunDecision, RunReason};
pub use domain_transformer::{
    transform, DomainViews, Partitioned, PreachingRecord, RosterRecord, ViewDocument,
    LATEST_PARTITION, PREACHING_VIEW, ROSTER_VIEW,
};
pub use field_cleaner::{CleaningConfig, DateCleanError};
pub use validator::Validator;
