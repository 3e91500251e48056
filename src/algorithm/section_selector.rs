use std::ops::Range;

use crate::algorithm::budget::{BudgetMeter, Completion};
use crate::algorithm::conflict::{clashes_with_committed, Slot};
use crate::algorithm::coreq::{Choice, SearchPlan};
use crate::models::{Assignment, Combination, CourseSection};

/// One level of the search stack.
#[derive(Debug, Clone)]
struct Frame {
    /// Next choice index to try at this depth.
    next: usize,
    /// One past the last choice this frame may try.
    end: usize,
    /// (partial len, slots len) before this frame's current commit.
    mark: Option<(usize, usize)>,
    /// Course already assigned by a co-requisite pull; the frame passes through once.
    forced: bool,
}

#[derive(Debug, Clone)]
struct Committed<'a> {
    course: &'a str,
    section: &'a CourseSection,
    pulled_by: Option<&'a CourseSection>,
}

/// Lazy depth-first enumeration of every valid combination.
///
/// Courses are visited in selection order and choices in catalog order, so the
/// sequence is reproducible. The stack is explicit; depth is bounded by the
/// number of selected courses, not by the call stack.
///
/// With a root range only the given first-course choices are explored, which
/// is how independent subtrees are handed to separate workers.
pub struct CombinationIter<'p, 'a, 'b> {
    plan: &'p SearchPlan<'a>,
    meter: BudgetMeter<'b>,
    frames: Vec<Frame>,
    partial: Vec<Committed<'a>>,
    slots: Vec<Slot>,
    stopped: Option<Completion>,
    root: usize,
}

impl<'p, 'a, 'b> CombinationIter<'p, 'a, 'b> {
    pub fn new(plan: &'p SearchPlan<'a>, meter: BudgetMeter<'b>) -> Self {
        let roots = 0..plan.roots();
        Self::with_roots(plan, meter, roots)
    }

    pub fn with_roots(plan: &'p SearchPlan<'a>, meter: BudgetMeter<'b>, roots: Range<usize>) -> Self {
        let end = roots.end.min(plan.roots());
        let frames = if plan.depth() == 0 || roots.start >= end {
            Vec::new()
        } else {
            vec![Frame { next: roots.start, end, mark: None, forced: false }]
        };
        Self { plan, meter, frames, partial: Vec::new(), slots: Vec::new(), stopped: None, root: roots.start }
    }

    /// Why iteration ended; `Exhausted` until a budget trips.
    pub fn completion(&self) -> Completion {
        self.stopped.unwrap_or(Completion::Exhausted)
    }

    /// First-course choice index of the most recently emitted combination.
    pub fn last_root(&self) -> usize {
        self.root
    }

    pub fn into_meter(self) -> BudgetMeter<'b> {
        self.meter
    }

    fn assigned(&self, course: &str) -> Option<&'a CourseSection> {
        self.partial.iter().find(|c| c.course == course).map(|c| c.section)
    }

    /// Commit every pick of `choice` or nothing. Returns the undo mark.
    fn try_commit(&mut self, choice: &Choice<'a>) -> Option<(usize, usize)> {
        let mark = (self.partial.len(), self.slots.len());
        for pick in &choice.picks {
            match self.assigned(pick.course) {
                Some(existing) if std::ptr::eq(existing, pick.section) => continue,
                Some(_) => {
                    self.undo(mark);
                    return None;
                }
                None => {}
            }
            if clashes_with_committed(&pick.slots, &self.slots) {
                self.undo(mark);
                return None;
            }
            self.slots.extend_from_slice(&pick.slots);
            self.partial.push(Committed {
                course: pick.course,
                section: pick.section,
                pulled_by: pick.pulled_by.map(|i| choice.picks[i].section),
            });
        }
        Some(mark)
    }

    fn undo(&mut self, (p, s): (usize, usize)) {
        self.partial.truncate(p);
        self.slots.truncate(s);
    }

    fn push_frame(&mut self) {
        let depth = self.frames.len();
        if depth < self.plan.depth() {
            let forced = self.assigned(self.plan.courses[depth]).is_some();
            let end = self.plan.choices[depth].len();
            self.frames.push(Frame { next: 0, end, mark: None, forced });
        } else {
            // Sentinel frame: everything is assigned.
            self.frames.push(Frame { next: 0, end: 0, mark: None, forced: true });
        }
    }

    fn snapshot(&self) -> Combination<'a> {
        Combination {
            assignments: self
                .partial
                .iter()
                .map(|c| Assignment { course: c.course, section: c.section, pulled_by: c.pulled_by.map(CourseSection::label) })
                .collect(),
        }
    }
}

impl<'a> Iterator for CombinationIter<'_, 'a, '_> {
    type Item = Combination<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let top = self.frames.len().checked_sub(1)?;

            if top == self.plan.depth() {
                // Complete. Drop the sentinel so the next call backtracks.
                self.frames.pop();
                if let Some(first) = self.frames.first() {
                    self.root = first.next.saturating_sub(1);
                }
                return Some(self.snapshot());
            }

            if let Some(mark) = self.frames[top].mark.take() {
                self.undo(mark);
            }

            if self.frames[top].forced {
                if self.frames[top].next == 0 {
                    self.frames[top].next = 1;
                    self.push_frame();
                } else {
                    self.frames.pop();
                }
                continue;
            }

            let mut committed = false;
            while self.frames[top].next < self.frames[top].end {
                let idx = self.frames[top].next;
                self.frames[top].next += 1;
                if let Err(reason) = self.meter.tick() {
                    self.stopped = Some(reason);
                    self.frames.clear();
                    return None;
                }
                let plan = self.plan;
                if let Some(mark) = self.try_commit(&plan.choices[top][idx]) {
                    self.frames[top].mark = Some(mark);
                    committed = true;
                    break;
                }
            }

            if committed {
                self.push_frame();
            } else {
                self.frames.pop();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::budget::{BudgetState, SearchBudget};
    use crate::algorithm::coreq::build_plan;
    use crate::models::{CandidateMap, Day, MeetingBlock, Modality, SelectionRequest};
    use chrono::NaiveTime;

    fn block(days: &[Day], sh: u32, sm: u32, eh: u32, em: u32) -> MeetingBlock {
        MeetingBlock::new(
            days.iter().copied(),
            NaiveTime::from_hms_opt(sh, sm, 0).unwrap(),
            NaiveTime::from_hms_opt(eh, em, 0).unwrap(),
            Modality::InPerson,
        )
    }

    fn math_engl() -> CandidateMap {
        let mut map = CandidateMap::new();
        map.insert(
            "MATH-101".into(),
            vec![
                CourseSection::new("MATH-101", "A").with_block(block(&[Day::Mon, Day::Wed], 9, 0, 10, 0)),
                CourseSection::new("MATH-101", "B").with_block(block(&[Day::Tue, Day::Thu], 9, 0, 10, 0)),
            ],
        );
        map.insert(
            "ENGL-101".into(),
            vec![
                CourseSection::new("ENGL-101", "C").with_block(block(&[Day::Mon, Day::Wed], 9, 30, 10, 30)),
                CourseSection::new("ENGL-101", "D").with_block(block(&[Day::Tue, Day::Thu], 11, 0, 12, 0)),
            ],
        );
        map
    }

    #[test]
    fn enumerates_in_catalog_order() {
        let map = math_engl();
        let plan = build_plan(&SelectionRequest::new(["MATH-101", "ENGL-101"]), &map).unwrap();
        let state = BudgetState::start(&SearchBudget::unlimited());
        let mut it = CombinationIter::new(&plan, state.meter());
        let got: Vec<Vec<String>> = it.by_ref().map(|c| c.labels()).collect();
        assert_eq!(
            got,
            vec![
                vec!["MATH-101-A", "ENGL-101-D"],
                vec!["MATH-101-B", "ENGL-101-C"],
                vec!["MATH-101-B", "ENGL-101-D"],
            ]
        );
        assert_eq!(it.completion(), Completion::Exhausted);
    }

    #[test]
    fn root_range_restricts_subtree() {
        let map = math_engl();
        let plan = build_plan(&SelectionRequest::new(["MATH-101", "ENGL-101"]), &map).unwrap();
        let state = BudgetState::start(&SearchBudget::unlimited());
        let mut it = CombinationIter::with_roots(&plan, state.meter(), 1..2);
        let first = it.next().unwrap();
        assert_eq!(first.labels(), vec!["MATH-101-B", "ENGL-101-C"]);
        assert_eq!(it.last_root(), 1);
        assert_eq!(it.count(), 1);
    }

    #[test]
    fn node_budget_stops_early() {
        let map = math_engl();
        let plan = build_plan(&SelectionRequest::new(["MATH-101", "ENGL-101"]), &map).unwrap();
        let state = BudgetState::start(&SearchBudget::unlimited().with_max_nodes(2));
        let mut it = CombinationIter::new(&plan, state.meter());
        assert!(it.next().is_none());
        assert_eq!(it.completion(), Completion::NodeBudget);
    }

    #[test]
    fn pulled_course_is_forced_depth() {
        let mut map = CandidateMap::new();
        map.insert(
            "LEC-1".into(),
            vec![CourseSection::new("LEC-1", "01").with_block(block(&[Day::Mon], 8, 0, 9, 0)).with_coreq("L-1-01".parse().unwrap())],
        );
        map.insert(
            "L-1".into(),
            vec![
                CourseSection::new("L-1", "01").with_block(block(&[Day::Tue], 8, 0, 11, 0)),
                CourseSection::new("L-1", "02").with_block(block(&[Day::Thu], 8, 0, 11, 0)),
            ],
        );
        let plan = build_plan(&SelectionRequest::new(["LEC-1", "L-1"]), &map).unwrap();
        let state = BudgetState::start(&SearchBudget::unlimited());
        let combos: Vec<_> = CombinationIter::new(&plan, state.meter()).collect();
        assert_eq!(combos.len(), 1);
        assert_eq!(combos[0].labels(), vec!["LEC-1-01", "L-1-01"]);
        assert_eq!(combos[0].assignments[1].pulled_by.as_deref(), Some("LEC-1-01"));
    }
}
