//! High-level archive operations
//!
//! Wraps [`crate::ark::ArkArchive`] and [`crate::loose::LooseArchive`] in
//! one-shot calls for listing, extraction, creation and header crypt.

mod filter;
mod operations;
mod progress;

pub use filter::matches_glob;
pub use operations::{ArchiveInfo, ArkOperations, EntryInfo, PartSummary};
pub use progress::{ArkPhase, ArkProgress};

/// Progress callback for archive operations.
///
/// Receives an [`ArkProgress`] with phase, current/total counts, and an
/// optional entry path. Must be `Sync + Send` because extraction reports
/// from rayon workers.
///
/// # Example
/// ```ignore
/// use arkforge::ops::{ArkOperations, ArkPhase};
///
/// ArkOperations::extract_with_progress("main.hdr", "out/", &|progress| {
///     if progress.phase == ArkPhase::ExtractingFiles {
///         println!("{}/{}: {:?}", progress.current, progress.total, progress.current_file);
///     }
/// })?;
/// ```
pub type ProgressCallback<'a> = &'a (dyn Fn(&ArkProgress) + Sync + Send);
