// Estructuras de datos principales: secciones, bloques horarios, combinaciones y puntajes.
pub mod clock;

use chrono::NaiveTime;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

use crate::error::BlockProblem;

/// Day of the week. Serialized with the short catalog codes (M, T, W, TH, F, S, SU).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String")]
pub enum Day {
    #[serde(rename = "M")]
    Mon,
    #[serde(rename = "T")]
    Tue,
    #[serde(rename = "W")]
    Wed,
    #[serde(rename = "TH")]
    Thu,
    #[serde(rename = "F")]
    Fri,
    #[serde(rename = "S")]
    Sat,
    #[serde(rename = "SU")]
    Sun,
}

impl Day {
    pub const ALL: [Day; 7] = [Day::Mon, Day::Tue, Day::Wed, Day::Thu, Day::Fri, Day::Sat, Day::Sun];

    pub fn code(self) -> &'static str {
        match self {
            Day::Mon => "M",
            Day::Tue => "T",
            Day::Wed => "W",
            Day::Thu => "TH",
            Day::Fri => "F",
            Day::Sat => "S",
            Day::Sun => "SU",
        }
    }
}

impl FromStr for Day {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let day = match s.trim().to_uppercase().as_str() {
            "M" | "MO" | "MON" | "MONDAY" => Day::Mon,
            "T" | "TU" | "TUE" | "TUES" | "TUESDAY" => Day::Tue,
            "W" | "WE" | "WED" | "WEDNESDAY" => Day::Wed,
            "TH" | "R" | "THU" | "THUR" | "THURS" | "THURSDAY" => Day::Thu,
            "F" | "FR" | "FRI" | "FRIDAY" => Day::Fri,
            "S" | "SA" | "SAT" | "SATURDAY" => Day::Sat,
            "SU" | "SUN" | "SUNDAY" => Day::Sun,
            other => return Err(format!("unknown day '{}'", other)),
        };
        Ok(day)
    }
}

impl TryFrom<String> for Day {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Day {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Parse a day list such as "M, W, F" or "TH". Empty input yields an empty set.
pub fn parse_days(raw: &str) -> Result<BTreeSet<Day>, String> {
    raw.split([',', ' ', '/'])
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(Day::from_str)
        .collect()
}

/// Delivery mode of a section or meeting block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", try_from = "String")]
pub enum Modality {
    #[default]
    InPerson,
    Remote,
    Hybrid,
}

impl FromStr for Modality {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "in_person" | "inperson" | "lec" | "lab" | "onsite" => Ok(Modality::InPerson),
            "remote" | "online" | "onlin" => Ok(Modality::Remote),
            "hybrid" | "hyb" => Ok(Modality::Hybrid),
            other => Err(format!("unknown modality '{}'", other)),
        }
    }
}

impl TryFrom<String> for Modality {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl fmt::Display for Modality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Modality::InPerson => "in_person",
            Modality::Remote => "remote",
            Modality::Hybrid => "hybrid",
        };
        f.write_str(s)
    }
}

/// Half-open interval `[start, end)` in minutes since midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Span {
    pub start: u32,
    pub end: u32,
}

impl Span {
    pub fn overlaps(&self, other: &Span) -> bool {
        self.start < other.end && other.start < self.end
    }

    pub fn len(&self) -> u32 {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }
}

/// A recurring weekly commitment of a section.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingBlock {
    #[serde(default)]
    pub days: BTreeSet<Day>,
    #[serde(default, with = "clock::opt")]
    pub start: Option<NaiveTime>,
    #[serde(default, with = "clock::opt")]
    pub end: Option<NaiveTime>,
    #[serde(default)]
    pub modality: Modality,
}

impl MeetingBlock {
    pub fn new(days: impl IntoIterator<Item = Day>, start: NaiveTime, end: NaiveTime, modality: Modality) -> Self {
        Self { days: days.into_iter().collect(), start: Some(start), end: Some(end), modality }
    }

    /// Time interval of the block, `None` when a bound is missing or the interval is empty.
    pub fn span(&self) -> Option<Span> {
        let span = Span { start: clock::minutes(self.start?), end: clock::minutes(self.end?) };
        if span.is_empty() { None } else { Some(span) }
    }

    pub fn validate(&self) -> Result<Span, BlockProblem> {
        if self.days.is_empty() {
            return Err(BlockProblem::NoDays);
        }
        let start = self.start.ok_or(BlockProblem::MissingStart)?;
        let end = self.end.ok_or(BlockProblem::MissingEnd)?;
        if end <= start {
            return Err(BlockProblem::EmptyInterval { start, end });
        }
        Ok(Span { start: clock::minutes(start), end: clock::minutes(end) })
    }

    pub fn is_remote(&self) -> bool {
        self.modality == Modality::Remote
    }
}

/// Reference to a section of another course, written "COURSE-SECTION".
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SectionRef {
    pub course: String,
    pub section: String,
}

impl SectionRef {
    pub fn new(course: impl Into<String>, section: impl Into<String>) -> Self {
        Self { course: course.into(), section: section.into() }
    }
}

impl FromStr for SectionRef {
    type Err = String;

    // La sección es el último segmento: "BIO-151L-101" -> ("BIO-151L", "101")
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        match s.rsplit_once('-') {
            Some((course, section)) if !course.is_empty() && !section.is_empty() => {
                Ok(SectionRef::new(course.trim().to_uppercase(), section.trim().to_uppercase()))
            }
            _ => Err(format!("invalid section reference '{}'", s)),
        }
    }
}

impl TryFrom<String> for SectionRef {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<SectionRef> for String {
    fn from(r: SectionRef) -> String {
        r.to_string()
    }
}

impl fmt::Display for SectionRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.course, self.section)
    }
}

/// Parse a comma separated co-requisite list ("BIO-151L-101, BIO-151L-102").
pub fn parse_section_refs(raw: &str) -> Result<Vec<SectionRef>, String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(SectionRef::from_str)
        .collect()
}

/// A concrete offering of a course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSection {
    pub course: String,
    pub section: String,
    #[serde(default)]
    pub blocks: Vec<MeetingBlock>,
    #[serde(default)]
    pub modality: Modality,
    #[serde(default)]
    pub enrollment: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub capacity: Option<u32>,
    /// Linked sections. References to the same course are alternatives,
    /// references to different courses are all mandatory.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub coreqs: Vec<SectionRef>,
}

impl CourseSection {
    pub fn new(course: impl Into<String>, section: impl Into<String>) -> Self {
        Self {
            course: course.into(),
            section: section.into(),
            blocks: Vec::new(),
            modality: Modality::default(),
            enrollment: 0,
            capacity: None,
            coreqs: Vec::new(),
        }
    }

    pub fn with_block(mut self, block: MeetingBlock) -> Self {
        self.blocks.push(block);
        self
    }

    pub fn with_modality(mut self, modality: Modality) -> Self {
        self.modality = modality;
        self
    }

    pub fn with_coreq(mut self, coreq: SectionRef) -> Self {
        self.coreqs.push(coreq);
        self
    }

    pub fn with_enrollment(mut self, enrollment: u32, capacity: Option<u32>) -> Self {
        self.enrollment = enrollment;
        self.capacity = capacity;
        self
    }

    pub fn label(&self) -> String {
        format!("{}-{}", self.course, self.section)
    }

    pub fn is(&self, r: &SectionRef) -> bool {
        self.course.eq_ignore_ascii_case(&r.course) && self.section.eq_ignore_ascii_case(&r.section)
    }

    /// enrollment / capacity, when the capacity is known and non-zero.
    pub fn fill_fraction(&self) -> Option<f64> {
        match self.capacity {
            Some(cap) if cap > 0 => Some(self.enrollment as f64 / cap as f64),
            _ => None,
        }
    }
}

/// Catalog snapshot: course code -> sections in catalog order.
pub type CandidateMap = BTreeMap<String, Vec<CourseSection>>;

/// How the student ranks delivery modes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityPreference {
    /// Most preferred first.
    #[serde(default)]
    pub ranking: Vec<Modality>,
    /// Exact modality wanted for a given course; overrides `ranking` for it.
    #[serde(default)]
    pub per_course: BTreeMap<String, Modality>,
}

/// A window of time the student can attend class.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TimeWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl TimeWindow {
    pub fn span(&self) -> Span {
        Span { start: clock::minutes(self.start), end: clock::minutes(self.end) }
    }
}

impl FromStr for TimeWindow {
    type Err = String;

    // "11:00 AM - 10:00 PM"
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (a, b) = s.split_once('-').ok_or_else(|| format!("invalid time window '{}'", s))?;
        let start = clock::parse_clock(a).ok_or_else(|| format!("invalid start in '{}'", s))?;
        let end = clock::parse_clock(b).ok_or_else(|| format!("invalid end in '{}'", s))?;
        if end <= start {
            return Err(format!("empty time window '{}'", s));
        }
        Ok(TimeWindow { start, end })
    }
}

impl TryFrom<String> for TimeWindow {
    type Error = String;
    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<TimeWindow> for String {
    fn from(w: TimeWindow) -> String {
        format!("{} - {}", w.start.format("%H:%M"), w.end.format("%H:%M"))
    }
}

/// Per-day availability. A day present with no windows is fully unavailable;
/// a day absent from the map is treated the same way.
pub type Availability = BTreeMap<Day, Vec<TimeWindow>>;

/// What the student asked for.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionRequest {
    pub courses: Vec<String>,
    #[serde(default)]
    pub modality_preference: ModalityPreference,
    #[serde(default)]
    pub availability: Option<Availability>,
}

impl SelectionRequest {
    pub fn new<S: Into<String>>(courses: impl IntoIterator<Item = S>) -> Self {
        Self { courses: courses.into_iter().map(Into::into).collect(), ..Default::default() }
    }
}

/// One chosen section under a course key.
#[derive(Debug, Clone, Serialize)]
pub struct Assignment<'a> {
    pub course: &'a str,
    pub section: &'a CourseSection,
    /// Label of the section whose co-requisite pulled this one in.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub pulled_by: Option<String>,
}

/// A complete, conflict-free assignment, in commit order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Combination<'a> {
    pub assignments: Vec<Assignment<'a>>,
}

impl<'a> Combination<'a> {
    pub fn get(&self, course: &str) -> Option<&'a CourseSection> {
        self.assignments.iter().find(|a| a.course == course).map(|a| a.section)
    }

    pub fn sections(&self) -> impl Iterator<Item = &'a CourseSection> + '_ {
        self.assignments.iter().map(|a| a.section)
    }

    pub fn courses(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.assignments.iter().map(|a| a.course)
    }

    pub fn len(&self) -> usize {
        self.assignments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.assignments.is_empty()
    }

    /// Section labels in commit order, handy for comparisons in tests and reports.
    pub fn labels(&self) -> Vec<String> {
        self.sections().map(CourseSection::label).collect()
    }
}

/// Per-criterion breakdown; every time quantity is in hours. Lower is better.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct ScoreVector {
    pub days_on_campus: u32,
    pub gaps: f64,
    pub modality: f64,
    pub day_length: f64,
    pub day_consistency: f64,
    pub sections_per_day: u32,
    pub availability: f64,
    pub enrollment: f64,
    pub aggregate: f64,
}
