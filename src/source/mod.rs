//! # Batch Sources
//!
//! The contract between the converters and wherever events come from.
//! A source is a blocking pull of whole batches; it never reorders events.
//!
//! ## Implementations
//!
//! | Source | Module | Description |
//! |--------|--------|-------------|
//! | `MemorySource` | `memory` | Pre-built batches for testing/embedding |
//! | `JsonLinesSource` | `jsonl` | One JSON event record per line, NanoAOD branch names |

pub mod memory;
pub mod jsonl;

use crate::model::EventBatch;
use crate::Result;

pub use memory::MemorySource;
pub use jsonl::JsonLinesSource;

/// Default number of events per batch for file sources.
pub const DEFAULT_BATCH_SIZE: usize = 1000;

/// A finite sequence of event batches.
pub trait BatchSource {
    /// The next batch, or `None` once the input is exhausted.
    fn next_batch(&mut self) -> Result<Option<EventBatch>>;

    /// Short label for log lines.
    fn describe(&self) -> String {
        std::any::type_name::<Self>().rsplit("::").next().unwrap_or("source").to_string()
    }
}

impl<S: BatchSource + ?Sized> BatchSource for Box<S> {
    fn next_batch(&mut self) -> Result<Option<EventBatch>> {
        (**self).next_batch()
    }

    fn describe(&self) -> String {
        (**self).describe()
    }
}
