//! Catalog sources.
//!
//! The engine reads institution data through [`CatalogSource`] and takes an
//! owned snapshot at the start of every generation run. Edits made after
//! that point affect only later runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use crate::error::{EngineError, Result};
use crate::models::Catalog;

/// Supplies the catalog of a term.
pub trait CatalogSource: Send + Sync {
    /// Owned snapshot of the term's catalog.
    ///
    /// Fails with `CatalogUnavailable` if the source has no data for the term.
    fn snapshot(&self, term: &str) -> Result<Catalog>;
}

impl<T: CatalogSource + ?Sized> CatalogSource for Arc<T> {
    fn snapshot(&self, term: &str) -> Result<Catalog> {
        (**self).snapshot(term)
    }
}

/// Catalogs held in memory, editable while the engine runs.
#[derive(Debug, Default)]
pub struct InMemoryCatalog {
    terms: RwLock<HashMap<String, Catalog>>,
}

impl InMemoryCatalog {
    /// Creates an empty source.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a term's catalog.
    pub fn with_term(self, term: impl Into<String>, catalog: Catalog) -> Self {
        self.set_catalog(term, catalog);
        self
    }

    /// Sets or replaces a term's catalog.
    pub fn set_catalog(&self, term: impl Into<String>, catalog: Catalog) {
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(term.into(), catalog);
    }

    /// Loads a term's catalog from JSON.
    pub fn load_json(&self, term: impl Into<String>, json: &str) -> serde_json::Result<()> {
        let catalog = Catalog::from_json(json)?;
        self.set_catalog(term, catalog);
        Ok(())
    }

    /// Edits a term's catalog in place.
    pub fn update<F>(&self, term: &str, edit: F) -> Result<()>
    where
        F: FnOnce(&mut Catalog),
    {
        let mut terms = self.terms.write().unwrap_or_else(PoisonError::into_inner);
        let catalog = terms
            .get_mut(term)
            .ok_or_else(|| EngineError::CatalogUnavailable {
                term: term.to_string(),
            })?;
        edit(catalog);
        Ok(())
    }

    /// Removes a term's catalog.
    pub fn remove(&self, term: &str) -> Option<Catalog> {
        self.terms
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(term)
    }
}

impl CatalogSource for InMemoryCatalog {
    fn snapshot(&self, term: &str) -> Result<Catalog> {
        self.terms
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(term)
            .cloned()
            .ok_or_else(|| EngineError::CatalogUnavailable {
                term: term.to_string(),
            })
    }
}
