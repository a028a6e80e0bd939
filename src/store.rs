//! Per-term Draft and Published slots.
//!
//! Each term owns one Draft slot, one Published slot and an advisory writer
//! flag. Slots hold `Arc<..>` pointers that are swapped whole under a short
//! write lock; readers clone the pointer under a read lock and then work on
//! an immutable batch, so they see either the old or the new slot and never
//! a mixture.
//!
//! Writers (generation and publish) must hold the term's [`WriterGuard`].
//! A second writer fails fast with `ConcurrencyConflict` instead of waiting.
//! A term gets its slots the first time a writer locks it; callers confirm
//! the term exists before that.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use crate::error::{EngineError, Result};
use crate::models::ScheduleBatch;

/// The Published slot of a term.
#[derive(Debug, Clone)]
pub struct PublishedSlot {
    /// Publish version, starting at 1 and increasing by one per publish.
    pub version: u64,
    pub batch: Arc<ScheduleBatch>,
}

#[derive(Debug, Default)]
struct TermSlots {
    writer: AtomicBool,
    generation: AtomicU64,
    draft: RwLock<Option<Arc<ScheduleBatch>>>,
    published: RwLock<Option<Arc<PublishedSlot>>>,
}

impl TermSlots {
    fn draft(&self) -> Option<Arc<ScheduleBatch>> {
        self.draft
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn published(&self) -> Option<Arc<PublishedSlot>> {
        self.published
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

/// In-memory schedule store for all terms.
#[derive(Debug, Default)]
pub struct ScheduleStore {
    terms: RwLock<HashMap<String, Arc<TermSlots>>>,
}

impl ScheduleStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    fn slots(&self, term: &str) -> Option<Arc<TermSlots>> {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(term)
            .cloned()
    }

    fn slots_or_insert(&self, term: &str) -> Arc<TermSlots> {
        if let Some(slots) = self.slots(term) {
            return slots;
        }
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .entry(term.to_string())
            .or_default()
            .clone()
    }

    /// Current Draft of a term.
    pub fn draft(&self, term: &str) -> Option<Arc<ScheduleBatch>> {
        self.slots(term)?.draft()
    }

    /// Current Published slot of a term.
    pub fn published(&self, term: &str) -> Option<Arc<PublishedSlot>> {
        self.slots(term)?.published()
    }

    /// Whether any writer has ever locked `term`.
    pub fn contains_term(&self, term: &str) -> bool {
        self.slots(term).is_some()
    }

    /// Number of terms with slots.
    pub fn term_count(&self) -> usize {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Current publish version of a term (0 if never published).
    pub fn published_version(&self, term: &str) -> u64 {
        self.published(term).map_or(0, |p| p.version)
    }

    /// Takes the term's writer lock without waiting.
    ///
    /// `operation` names the caller in the `ConcurrencyConflict` error.
    pub fn try_acquire_writer(&self, term: &str, operation: &str) -> Result<WriterGuard> {
        let slots = self.slots_or_insert(term);
        if slots
            .writer
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            debug!(term, operation, "writer lock busy");
            return Err(EngineError::ConcurrencyConflict {
                term: term.to_string(),
                operation: operation.to_string(),
            });
        }
        Ok(WriterGuard {
            term: term.to_string(),
            slots,
        })
    }
}

/// Exclusive write access to one term. Released on drop.
#[derive(Debug)]
pub struct WriterGuard {
    term: String,
    slots: Arc<TermSlots>,
}

impl WriterGuard {
    /// The locked term.
    pub fn term(&self) -> &str {
        &self.term
    }

    /// Current Draft of the locked term.
    pub fn draft(&self) -> Option<Arc<ScheduleBatch>> {
        self.slots.draft()
    }

    /// Current Published slot of the locked term.
    pub fn published(&self) -> Option<Arc<PublishedSlot>> {
        self.slots.published()
    }

    /// Replaces the Draft slot. Returns the generation number given to the
    /// batch.
    pub fn store_draft(&self, batch: ScheduleBatch) -> u64 {
        let generation = self.slots.generation.fetch_add(1, Ordering::AcqRel) + 1;
        let batch = Arc::new(batch.with_generation(generation));
        *self
            .slots
            .draft
            .write()
            .unwrap_or_else(PoisonError::into_inner) = Some(batch);
        generation
    }

    /// Replaces the Published slot and bumps the version. Returns the new
    /// version.
    pub fn commit_publish(&self, batch: ScheduleBatch) -> u64 {
        let mut slot = self
            .slots
            .published
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let version = slot.as_ref().map_or(0, |p| p.version) + 1;
        *slot = Some(Arc::new(PublishedSlot {
            version,
            batch: Arc::new(batch),
        }));
        version
    }
}

impl Drop for WriterGuard {
    fn drop(&mut self) {
        self.slots.writer.store(false, Ordering::Release);
    }
}
