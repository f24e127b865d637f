//! Approximate duplicate detection for canonfile.
//!
//! Exact digests only catch byte-identical files. Videos re-muxed or
//! re-tagged by different tools often differ in a handful of bytes, so this
//! crate compares equal-size files block by block instead:
//!
//! ```rust,no_run
//! use canonfile_analyze::{ApproximateMatcher, MatchConfig};
//!
//! let config = MatchConfig::builder()
//!     .root("/videos")
//!     .threshold(95.0)
//!     .build()
//!     .unwrap();
//!
//! let report = ApproximateMatcher::new(config).run().unwrap();
//! for pair in &report.pairs {
//!     println!("{:.2}% {} {}", pair.ratio, pair.earlier.display(), pair.later.display());
//! }
//! println!("Potential save: {:.2} MB", report.potential_savings_mb());
//! ```

mod approx;

pub use approx::{
    ApproximateMatcher, Candidate, DuplicatePair, MatchReport, NearMiss, match_ratio,
};

// Re-export core types
pub use canonfile_core::{ContentHash, MatchConfig, MatchConfigBuilder};
