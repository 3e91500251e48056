// Acceso de sólo lectura al catálogo de secciones.
//
// El motor nunca consulta el catálogo durante la búsqueda: se arma un
// `CandidateMap` (snapshot) antes de empezar y se pasa por referencia.
pub mod json;
pub mod sqlite;

use std::collections::{BTreeSet, VecDeque};
use thiserror::Error;
use tracing::{debug, warn};

use crate::models::{CandidateMap, CourseSection, SelectionRequest};

pub use json::JsonCatalog;
pub use sqlite::SqliteCatalog;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("catalog I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("catalog JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("catalog database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("invalid catalog row {course}-{section}: {reason}")]
    InvalidRow { course: String, section: String, reason: String },

    #[error("request names no catalog (expected sections, catalog_json or catalog_sqlite)")]
    NoSource,
}

/// Source of candidate sections.
pub trait SectionCatalog {
    /// Sections of `course` in catalog order. Unknown courses yield an empty list.
    fn sections_for(&self, course: &str) -> Result<Vec<CourseSection>, CatalogError>;

    /// Load the selected courses and, transitively, every course their
    /// co-requisites point at. Each course is read once.
    fn snapshot(&self, selection: &SelectionRequest) -> Result<CandidateMap, CatalogError> {
        let mut map = CandidateMap::new();
        let mut seen: BTreeSet<String> = BTreeSet::new();
        let mut queue: VecDeque<String> = selection.courses.iter().map(|c| c.trim().to_string()).collect();

        while let Some(course) = queue.pop_front() {
            if !seen.insert(course.to_uppercase()) {
                continue;
            }
            let sections = self.sections_for(&course)?;
            if sections.is_empty() {
                warn!(course = %course, "no sections in catalog");
                continue;
            }
            for r in sections.iter().flat_map(|s| &s.coreqs) {
                if !seen.contains(&r.course.to_uppercase()) {
                    queue.push_back(r.course.clone());
                }
            }
            debug!(course = %course, sections = sections.len(), "loaded");
            // Key by the catalog's own spelling of the code.
            let key = sections.first().map_or(course, |s| s.course.clone());
            map.insert(key, sections);
        }
        Ok(map)
    }
}

/// Stable ascending sort of every course's sections by enrollment, so emptier
/// sections are tried (and win exact ties) first.
pub fn sort_by_enrollment(candidates: &mut CandidateMap) {
    for sections in candidates.values_mut() {
        sections.sort_by_key(|s| s.enrollment);
    }
}
