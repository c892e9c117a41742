//! Paged bulk acquisition from the stock catalog.
//!
//! The queue walks catalog search pages from a persisted cursor, downloads
//! every resource it has not seen before, and checkpoints the cursor and
//! dedup registry after each page. A rate-limited search stops the run with
//! the cursor left on the failing page so the next run resumes there.
//!
//! Deleting a stock asset through [`remove_asset`] moves its catalog ID to
//! the forgotten set, which bulk runs never re-download.

mod config;
mod curator;
mod queue;
mod registry;
mod types;

pub use config::AcquisitionConfig;
pub use curator::remove_asset;
pub use queue::AcquisitionQueue;
pub use registry::RegistryStore;
pub use types::*;
