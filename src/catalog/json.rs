use std::fs;
use std::path::Path;

use super::{CatalogError, SectionCatalog};
use crate::models::{CandidateMap, CourseSection};

/// Catalog read from a JSON array of sections, kept in file order.
#[derive(Debug, Clone, Default)]
pub struct JsonCatalog {
    by_course: CandidateMap,
}

impl JsonCatalog {
    pub fn from_sections(sections: Vec<CourseSection>) -> Self {
        let mut by_course = CandidateMap::new();
        for s in sections {
            by_course.entry(s.course.clone()).or_insert_with(Vec::new).push(s);
        }
        Self { by_course }
    }

    pub fn from_json(raw: &str) -> Result<Self, CatalogError> {
        let sections: Vec<CourseSection> = serde_json::from_str(raw)?;
        Ok(Self::from_sections(sections))
    }

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let raw = fs::read_to_string(path)?;
        Self::from_json(&raw)
    }

    pub fn courses(&self) -> impl Iterator<Item = &str> {
        self.by_course.keys().map(String::as_str)
    }
}

impl SectionCatalog for JsonCatalog {
    fn sections_for(&self, course: &str) -> Result<Vec<CourseSection>, CatalogError> {
        let course = course.trim();
        let found = self
            .by_course
            .get(course)
            .or_else(|| self.by_course.iter().find(|(k, _)| k.eq_ignore_ascii_case(course)).map(|(_, v)| v));
        Ok(found.cloned().unwrap_or_default())
    }
}
