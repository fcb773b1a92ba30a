//! In-memory batch source.
//!
//! Hands out pre-built batches in order. Used by tests and by callers that
//! already hold their events in memory.

use std::collections::VecDeque;

use crate::model::EventBatch;
use crate::Result;
use super::BatchSource;

#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    batches: VecDeque<EventBatch>,
    pulled: usize,
}

impl MemorySource {
    pub fn new(batches: impl IntoIterator<Item = EventBatch>) -> Self {
        Self { batches: batches.into_iter().collect(), pulled: 0 }
    }

    /// Batches handed out so far.
    pub fn pulled(&self) -> usize {
        self.pulled
    }

    /// Batches not yet handed out.
    pub fn remaining(&self) -> usize {
        self.batches.len()
    }
}

impl BatchSource for MemorySource {
    fn next_batch(&mut self) -> Result<Option<EventBatch>> {
        let batch = self.batches.pop_front();
        if batch.is_some() {
            self.pulled += 1;
        }
        Ok(batch)
    }

    fn describe(&self) -> String {
        format!("memory({} batches)", self.pulled + self.batches.len())
    }
}
