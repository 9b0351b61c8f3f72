//! surfacediff engine - API comparison logic
//!
//! This crate implements the comparison pipeline over two API snapshots:
//! - Identity mapping across namespace and type renames
//! - Scope filtering and intentional exclusions
//! - Member matching and diffing
//! - Breaking-change classification

pub mod classifier;
pub mod comparer;
pub mod differ;
pub mod exclusion;
pub mod filter;
pub mod index;
pub mod mapper;

pub use classifier::{classify, classify_detail, Verdict};
pub use comparer::ApiComparer;
pub use differ::{ApiDiffer, DiffOutcome};
pub use exclusion::{ExclusionRegistry, ExclusionVerdict, IdentityScope};
pub use filter::ScopeFilter;
pub use index::SnapshotIndex;
pub use mapper::{Candidate, CandidateOrigin, IdentityMapper};
