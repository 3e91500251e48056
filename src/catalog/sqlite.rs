use rusqlite::{params, Connection, OpenFlags, Row};
use std::path::Path;

use super::{CatalogError, SectionCatalog};
use crate::models::{clock, parse_days, parse_section_refs, CourseSection, MeetingBlock, Modality};

/// Table layout read by `SqliteCatalog`: one row per meeting block.
pub const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS sections (
    course TEXT NOT NULL,
    section TEXT NOT NULL,
    days TEXT,
    start_time TEXT,
    end_time TEXT,
    modality TEXT,
    enrollment INTEGER NOT NULL DEFAULT 0,
    capacity INTEGER,
    available_seats INTEGER NOT NULL DEFAULT 0,
    status TEXT NOT NULL DEFAULT 'A',
    coreqs TEXT
)";

// Sólo secciones activas con cupo, en el orden del catálogo
const QUERY: &str = "SELECT course, section, days, start_time, end_time, modality, enrollment, capacity, coreqs
    FROM sections
    WHERE UPPER(course) = UPPER(?1) AND status = 'A' AND available_seats > 0
    ORDER BY rowid";

struct RawRow {
    course: String,
    section: String,
    days: Option<String>,
    start: Option<String>,
    end: Option<String>,
    modality: Option<String>,
    enrollment: i64,
    capacity: Option<i64>,
    coreqs: Option<String>,
}

impl RawRow {
    fn read(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            course: row.get(0)?,
            section: row.get(1)?,
            days: row.get(2)?,
            start: row.get(3)?,
            end: row.get(4)?,
            modality: row.get(5)?,
            enrollment: row.get(6)?,
            capacity: row.get(7)?,
            coreqs: row.get(8)?,
        })
    }

    fn invalid(&self, reason: impl Into<String>) -> CatalogError {
        CatalogError::InvalidRow { course: self.course.clone(), section: self.section.clone(), reason: reason.into() }
    }

    fn modality(&self) -> Result<Modality, CatalogError> {
        match self.modality.as_deref().map(str::trim) {
            None | Some("") => Ok(Modality::default()),
            Some(m) => m.parse().map_err(|e: String| self.invalid(e)),
        }
    }

    /// `None` for rows with neither days nor times (asynchronous offerings).
    /// Partially filled rows become blocks and are rejected later as malformed.
    fn block(&self) -> Result<Option<MeetingBlock>, CatalogError> {
        let text = |v: &Option<String>| v.as_deref().map(str::trim).filter(|s| !s.is_empty()).map(str::to_string);
        let (days, start, end) = (text(&self.days), text(&self.start), text(&self.end));
        if days.is_none() && start.is_none() && end.is_none() {
            return Ok(None);
        }
        let days = parse_days(days.as_deref().unwrap_or("")).map_err(|e| self.invalid(e))?;
        let time = |raw: Option<String>| -> Result<_, CatalogError> {
            match raw {
                None => Ok(None),
                Some(s) => clock::parse_clock(&s).map(Some).ok_or_else(|| self.invalid(format!("invalid time '{}'", s))),
            }
        };
        Ok(Some(MeetingBlock { days, start: time(start)?, end: time(end)?, modality: self.modality()? }))
    }
}

fn count(raw: &RawRow, v: i64, what: &str) -> Result<u32, CatalogError> {
    u32::try_from(v).map_err(|_| raw.invalid(format!("negative {}", what)))
}

/// Read-only view over a SQLite catalog export.
pub struct SqliteCatalog {
    conn: Connection,
}

impl SqliteCatalog {
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, CatalogError> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX)?;
        Ok(Self { conn })
    }

    /// Wrap an existing connection (in-memory databases in tests).
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl SectionCatalog for SqliteCatalog {
    fn sections_for(&self, course: &str) -> Result<Vec<CourseSection>, CatalogError> {
        let mut stmt = self.conn.prepare(QUERY)?;
        let rows = stmt.query_map(params![course.trim()], RawRow::read)?;

        let mut out: Vec<CourseSection> = Vec::new();
        for row in rows {
            let raw = row?;
            let block = raw.block()?;
            let idx = match out.iter().position(|s| s.section == raw.section) {
                Some(i) => i,
                None => {
                    let capacity = raw.capacity.map(|c| count(&raw, c, "capacity")).transpose()?;
                    let coreqs = parse_section_refs(raw.coreqs.as_deref().unwrap_or("")).map_err(|e| raw.invalid(e))?;
                    let mut s = CourseSection::new(raw.course.clone(), raw.section.clone())
                        .with_modality(raw.modality()?)
                        .with_enrollment(count(&raw, raw.enrollment, "enrollment")?, capacity);
                    s.coreqs = coreqs;
                    out.push(s);
                    out.len() - 1
                }
            };
            if let Some(b) = block {
                out[idx].blocks.push(b);
            }
        }
        Ok(out)
    }
}
