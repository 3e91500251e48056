// Detección de choques horarios entre bloques y secciones.
use std::collections::BTreeSet;

use crate::models::{CourseSection, Day, MeetingBlock, Span};

/// True if both blocks share a day and their `[start, end)` intervals overlap.
/// Touching intervals (one ends when the other begins) do not conflict.
///
/// A block with missing days or times is reported as conflicting: it never
/// passes as "free".
pub fn blocks_conflict(a: &MeetingBlock, b: &MeetingBlock) -> bool {
    let (sa, sb) = match (a.validate(), b.validate()) {
        (Ok(sa), Ok(sb)) => (sa, sb),
        _ => return true,
    };
    !a.days.is_disjoint(&b.days) && sa.overlaps(&sb)
}

/// True if any block of `a` conflicts with any block of `b`.
pub fn sections_conflict(a: &CourseSection, b: &CourseSection) -> bool {
    a.blocks.iter().any(|ba| b.blocks.iter().any(|bb| blocks_conflict(ba, bb)))
}

/// Bit set over `Day::ALL`.
pub fn day_mask(days: &BTreeSet<Day>) -> u8 {
    days.iter().fold(0u8, |m, d| m | (1 << (*d as u8)))
}

/// Compact form of a validated block used on the search hot path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Slot {
    pub days: u8,
    pub span: Span,
}

impl Slot {
    /// `None` for malformed blocks; callers validate before searching.
    pub fn of(block: &MeetingBlock) -> Option<Slot> {
        let span = block.validate().ok()?;
        Some(Slot { days: day_mask(&block.days), span })
    }

    pub fn clashes(&self, other: &Slot) -> bool {
        self.days & other.days != 0 && self.span.overlaps(&other.span)
    }
}

/// True if any slot of `candidate` clashes with any already committed slot.
pub fn clashes_with_committed(candidate: &[Slot], committed: &[Slot]) -> bool {
    candidate.iter().any(|c| committed.iter().any(|k| c.clashes(k)))
}
