// Resolución de co-requisitos antes de la búsqueda.
//
// Cada sección candidata se expande en una o más "elecciones": la sección más
// una sección concreta por cada curso vinculado. Así el backtracking sólo ve
// elecciones atómicas y los vínculos rotos se detectan antes de empezar.
use std::collections::HashSet;

use tracing::{debug, warn};

use crate::algorithm::conflict::{clashes_with_committed, day_mask, Slot};
use crate::error::{EngineError, UnresolvedReason};
use crate::models::{CandidateMap, CourseSection, SectionRef, SelectionRequest};

/// One section committed by a choice, under its own course key.
#[derive(Debug, Clone)]
pub struct Pick<'a> {
    pub course: &'a str,
    pub section: &'a CourseSection,
    /// Index (within the same choice) of the pick whose co-requisite pulled this one.
    pub pulled_by: Option<usize>,
    pub slots: Vec<Slot>,
}

/// Indivisible unit of the search: a candidate section plus everything it drags in.
#[derive(Debug, Clone)]
pub struct Choice<'a> {
    pub picks: Vec<Pick<'a>>,
}

impl<'a> Choice<'a> {
    pub fn primary(&self) -> &'a CourseSection {
        self.picks[0].section
    }
}

/// Courses in search order and the precomputed choices for each.
#[derive(Debug, Clone)]
pub struct SearchPlan<'a> {
    pub courses: Vec<&'a str>,
    pub choices: Vec<Vec<Choice<'a>>>,
}

impl SearchPlan<'_> {
    pub fn depth(&self) -> usize {
        self.courses.len()
    }

    /// Number of first-course choices, i.e. independent subtrees.
    pub fn roots(&self) -> usize {
        self.choices.first().map_or(0, Vec::len)
    }
}

/// Look a course up by exact key, falling back to a case-insensitive match.
pub fn find_course<'a>(candidates: &'a CandidateMap, code: &str) -> Option<(&'a str, &'a [CourseSection])> {
    let code = code.trim();
    candidates
        .get_key_value(code)
        .or_else(|| candidates.iter().find(|(k, _)| k.eq_ignore_ascii_case(code)))
        .map(|(k, v)| (k.as_str(), v.as_slice()))
}

fn slots_of(course: &str, section: &CourseSection) -> Result<Vec<Slot>, EngineError> {
    section
        .blocks
        .iter()
        .enumerate()
        .map(|(i, b)| {
            let span = b.validate().map_err(|problem| EngineError::MalformedMeetingBlock {
                course: course.to_string(),
                section: section.section.clone(),
                block: i,
                problem,
            })?;
            Ok(Slot { days: day_mask(&b.days), span })
        })
        .collect()
}

fn resolve<'a>(
    candidates: &'a CandidateMap,
    owner: &CourseSection,
    r: &SectionRef,
) -> Result<(&'a str, &'a CourseSection), EngineError> {
    let unresolved = |reason| EngineError::CorequisiteUnresolved {
        course: owner.course.clone(),
        section: owner.section.clone(),
        required_course: r.course.clone(),
        required_section: r.section.clone(),
        reason,
    };
    let (key, sections) = find_course(candidates, &r.course).ok_or_else(|| unresolved(UnresolvedReason::CourseMissing))?;
    let section = sections
        .iter()
        .find(|s| s.section.eq_ignore_ascii_case(&r.section))
        .ok_or_else(|| unresolved(UnresolvedReason::SectionMissing))?;
    Ok((key, section))
}

/// Co-requisite references grouped by linked course, in order of first appearance.
fn grouped(refs: &[SectionRef]) -> Vec<(&str, Vec<&SectionRef>)> {
    let mut groups: Vec<(&str, Vec<&SectionRef>)> = Vec::new();
    for r in refs {
        match groups.iter_mut().find(|(c, _)| c.eq_ignore_ascii_case(&r.course)) {
            Some((_, alts)) => alts.push(r),
            None => groups.push((r.course.as_str(), vec![r])),
        }
    }
    groups
}

/// First pair of picks (by index) whose sections clash, if any.
fn internal_clash(picks: &[Pick<'_>]) -> Option<(usize, usize)> {
    for i in 0..picks.len() {
        for j in (i + 1)..picks.len() {
            if clashes_with_committed(&picks[j].slots, &picks[i].slots) {
                return Some((i, j));
            }
        }
    }
    None
}

/// Outcome of expanding one candidate section.
struct Expansion<'a> {
    choices: Vec<Choice<'a>>,
    /// (owner, required) of the first combination dropped for a clash.
    first_rejected: Option<(&'a CourseSection, &'a CourseSection)>,
}

/// Expand a section into every complete choice. Alternatives are explored in
/// reference order, so the result order is deterministic.
fn expand<'a>(
    candidates: &'a CandidateMap,
    course: &'a str,
    section: &'a CourseSection,
    slots: Vec<Slot>,
) -> Result<Expansion<'a>, EngineError> {
    let root = Pick { course, section, pulled_by: None, slots };
    let mut finished: Vec<Vec<Pick<'a>>> = Vec::new();
    let mut first_rejected = None;
    // (picks so far, next pick whose links are pending)
    let mut stack: Vec<(Vec<Pick<'a>>, usize)> = vec![(vec![root], 0)];

    while let Some((picks, i)) = stack.pop() {
        if i == picks.len() {
            finished.push(picks);
            continue;
        }
        let owner = picks[i].section;
        // Cartesian product over linked courses of this pick.
        let mut partials: Vec<Vec<Pick<'a>>> = vec![picks];
        for (_, alts) in grouped(&owner.coreqs) {
            let mut next = Vec::new();
            let mut resolved = Vec::with_capacity(alts.len());
            for r in &alts {
                let (key, linked) = resolve(candidates, owner, r)?;
                resolved.push((key, linked));
            }
            for partial in partials {
                let existing: Option<&'a CourseSection> = resolved
                    .iter()
                    .find_map(|(key, _)| partial.iter().find(|p| p.course == *key))
                    .map(|p| p.section);
                match existing {
                    Some(present) => {
                        if resolved.iter().any(|(_, s)| std::ptr::eq(*s, present)) {
                            next.push(partial);
                        } else if first_rejected.is_none() {
                            first_rejected = Some((owner, resolved[0].1));
                        }
                    }
                    None => {
                        for (key, linked) in &resolved {
                            let mut extended = partial.clone();
                            extended.push(Pick {
                                course: *key,
                                section: *linked,
                                pulled_by: Some(i),
                                slots: slots_of(key, linked)?,
                            });
                            next.push(extended);
                        }
                    }
                }
            }
            partials = next;
        }
        // Reverse so the first alternative is popped first.
        for p in partials.into_iter().rev() {
            stack.push((p, i + 1));
        }
    }

    let mut choices = Vec::with_capacity(finished.len());
    for picks in finished {
        match internal_clash(&picks) {
            Some((a, b)) => {
                if first_rejected.is_none() {
                    first_rejected = Some((picks[a].section, picks[b].section));
                }
            }
            None => choices.push(Choice { picks }),
        }
    }
    Ok(Expansion { choices, first_rejected })
}

/// Validate the request against the snapshot and precompute all choices.
pub fn build_plan<'a>(selection: &SelectionRequest, candidates: &'a CandidateMap) -> Result<SearchPlan<'a>, EngineError> {
    let mut seen: HashSet<String> = HashSet::new();
    let mut courses: Vec<&'a str> = Vec::new();
    let mut choices: Vec<Vec<Choice<'a>>> = Vec::new();

    for code in &selection.courses {
        if !seen.insert(code.trim().to_uppercase()) {
            warn!(course = %code, "duplicate course in selection, keeping first occurrence");
            continue;
        }
        let (key, sections) = match find_course(candidates, code) {
            Some((k, s)) if !s.is_empty() => (k, s),
            _ => return Err(EngineError::NoCandidateSections { course: code.trim().to_string() }),
        };

        let mut course_choices = Vec::new();
        let mut first_rejected = None;
        for section in sections {
            let slots = slots_of(key, section)?;
            let expansion = expand(candidates, key, section, slots)?;
            if first_rejected.is_none() {
                first_rejected = expansion.first_rejected;
            }
            course_choices.extend(expansion.choices);
        }

        if course_choices.is_empty() {
            // Every section was discarded by its own co-requisites.
            if let Some((owner, required)) = first_rejected {
                return Err(EngineError::CorequisiteUnresolved {
                    course: owner.course.clone(),
                    section: owner.section.clone(),
                    required_course: required.course.clone(),
                    required_section: required.section.clone(),
                    reason: UnresolvedReason::Incompatible,
                });
            }
            return Err(EngineError::NoCandidateSections { course: key.to_string() });
        }

        debug!(course = key, sections = sections.len(), choices = course_choices.len(), "course planned");
        courses.push(key);
        choices.push(course_choices);
    }

    if courses.is_empty() {
        return Err(EngineError::EmptySelection);
    }
    Ok(SearchPlan { courses, choices })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Day, MeetingBlock, Modality};
    use chrono::NaiveTime;

    fn block(days: &[Day], sh: u32, eh: u32) -> MeetingBlock {
        MeetingBlock::new(
            days.iter().copied(),
            NaiveTime::from_hms_opt(sh, 0, 0).unwrap(),
            NaiveTime::from_hms_opt(eh, 0, 0).unwrap(),
            Modality::InPerson,
        )
    }

    #[test]
    fn alternatives_expand_in_reference_order() {
        let mut map = CandidateMap::new();
        map.insert(
            "BIO-151".into(),
            vec![CourseSection::new("BIO-151", "101")
                .with_block(block(&[Day::Mon], 8, 9))
                .with_coreq("BIO-151L-102".parse().unwrap())
                .with_coreq("BIO-151L-101".parse().unwrap())],
        );
        map.insert(
            "BIO-151L".into(),
            vec![
                CourseSection::new("BIO-151L", "101").with_block(block(&[Day::Tue], 8, 11)),
                CourseSection::new("BIO-151L", "102").with_block(block(&[Day::Thu], 8, 11)),
            ],
        );
        let plan = build_plan(&SelectionRequest::new(["BIO-151"]), &map).unwrap();
        let labels: Vec<String> = plan.choices[0].iter().map(|c| c.picks[1].section.label()).collect();
        assert_eq!(labels, vec!["BIO-151L-102", "BIO-151L-101"]);
        assert_eq!(plan.choices[0][0].picks[1].pulled_by, Some(0));
    }

    #[test]
    fn back_reference_to_primary_terminates() {
        let mut map = CandidateMap::new();
        map.insert(
            "CHM-1".into(),
            vec![CourseSection::new("CHM-1", "01").with_block(block(&[Day::Mon], 8, 9)).with_coreq("CHM-1L-01".parse().unwrap())],
        );
        map.insert(
            "CHM-1L".into(),
            vec![CourseSection::new("CHM-1L", "01").with_block(block(&[Day::Fri], 8, 9)).with_coreq("CHM-1-01".parse().unwrap())],
        );
        let plan = build_plan(&SelectionRequest::new(["CHM-1"]), &map).unwrap();
        assert_eq!(plan.choices[0].len(), 1);
        assert_eq!(plan.choices[0][0].picks.len(), 2);
    }

    #[test]
    fn duplicate_courses_collapse() {
        let mut map = CandidateMap::new();
        map.insert("A-1".into(), vec![CourseSection::new("A-1", "01").with_block(block(&[Day::Mon], 8, 9))]);
        let plan = build_plan(&SelectionRequest::new(["A-1", "a-1"]), &map).unwrap();
        assert_eq!(plan.depth(), 1);
    }
}
