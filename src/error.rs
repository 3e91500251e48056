use chrono::NaiveTime;
use thiserror::Error;

/// What is wrong with a meeting block.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BlockProblem {
    #[error("no meeting days")]
    NoDays,
    #[error("missing start time")]
    MissingStart,
    #[error("missing end time")]
    MissingEnd,
    #[error("end {end} is not after start {start}")]
    EmptyInterval { start: NaiveTime, end: NaiveTime },
}

/// Why a co-requisite link could not be honoured.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UnresolvedReason {
    #[error("linked course is not in the catalog snapshot")]
    CourseMissing,
    #[error("linked section is not offered")]
    SectionMissing,
    #[error("linked section conflicts with the section that requires it")]
    Incompatible,
}

/// Structural failures of a run. An empty ranking is not one of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("selection contains no courses")]
    EmptySelection,

    #[error("top_k must be greater than zero")]
    ZeroTopK,

    #[error("course {course} has no candidate sections")]
    NoCandidateSections { course: String },

    #[error("co-requisite {required_course}-{required_section} of {course}-{section} cannot be resolved: {reason}")]
    CorequisiteUnresolved {
        course: String,
        section: String,
        required_course: String,
        required_section: String,
        reason: UnresolvedReason,
    },

    #[error("malformed meeting block #{block} in {course}-{section}: {problem}")]
    MalformedMeetingBlock {
        course: String,
        section: String,
        block: usize,
        problem: BlockProblem,
    },
}
