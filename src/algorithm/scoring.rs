// Puntaje multi-criterio de una combinación completa. Menor es mejor.
//
// Todas las magnitudes de tiempo se acumulan en minutos enteros y se pasan a
// horas al final, de modo que el mismo input da exactamente el mismo f64.
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

use crate::models::{clock, Availability, Combination, Day, Modality, ModalityPreference, ScoreVector, Span};

/// Multiplier per criterion. All must be finite and non-negative.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub days_on_campus: f64,
    pub gaps: f64,
    pub modality: f64,
    pub day_length: f64,
    pub day_consistency: f64,
    pub sections_per_day: f64,
    pub availability: f64,
    pub enrollment: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            days_on_campus: 1.0,
            gaps: 1.0,
            modality: 10.0,
            day_length: 0.25,
            day_consistency: 0.5,
            sections_per_day: 1.0,
            availability: 5.0,
            enrollment: 2.0,
        }
    }
}

impl ScoreWeights {
    /// Name and value of every weight, in summation order.
    pub fn named(&self) -> [(&'static str, f64); 8] {
        [
            ("days_on_campus", self.days_on_campus),
            ("gaps", self.gaps),
            ("modality", self.modality),
            ("day_length", self.day_length),
            ("day_consistency", self.day_consistency),
            ("sections_per_day", self.sections_per_day),
            ("availability", self.availability),
            ("enrollment", self.enrollment),
        ]
    }
}

/// A fixed break (e.g. college hour) that is never counted as idle time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreakWindow {
    pub days: BTreeSet<Day>,
    #[serde(with = "clock::req")]
    pub start: chrono::NaiveTime,
    #[serde(with = "clock::req")]
    pub end: chrono::NaiveTime,
}

impl BreakWindow {
    fn span(&self) -> Span {
        Span { start: clock::minutes(self.start), end: clock::minutes(self.end) }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub weights: ScoreWeights,
    /// Idle stretches up to this long are free.
    pub gap_grace_minutes: u32,
    pub mandatory_break: Option<BreakWindow>,
    pub preferred_max_sections_per_day: u32,
    /// Days on campus up to this many are free in the aggregate. `None`
    /// charges every day.
    pub preferred_num_days: Option<u32>,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self { weights: ScoreWeights::default(), gap_grace_minutes: 20, mandatory_break: None, preferred_max_sections_per_day: 3, preferred_num_days: None }
    }
}

/// A timed block placed on one day, tagged with the assignment it belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct Placed {
    span: Span,
    owner: usize,
}

fn hours(minutes: u64) -> f64 {
    minutes as f64 / 60.0
}

/// Scores combinations against one configuration and one student's preferences.
#[derive(Debug, Clone, Copy)]
pub struct Scorer<'c> {
    config: &'c ScoringConfig,
    preference: &'c ModalityPreference,
    availability: Option<&'c Availability>,
}

impl<'c> Scorer<'c> {
    pub fn new(config: &'c ScoringConfig, preference: &'c ModalityPreference, availability: Option<&'c Availability>) -> Self {
        Self { config, preference, availability }
    }

    pub fn score(&self, combination: &Combination<'_>) -> ScoreVector {
        let by_day = Self::place(combination);

        let mut v = ScoreVector {
            days_on_campus: Self::days_on_campus(combination),
            gaps: self.gaps(&by_day),
            modality: self.modality(combination),
            day_length: Self::day_length(&by_day),
            day_consistency: Self::day_consistency(&by_day),
            sections_per_day: self.sections_per_day(&by_day),
            availability: self.availability(&by_day),
            enrollment: combination.sections().filter_map(|s| s.fill_fraction()).sum(),
            aggregate: 0.0,
        };
        v.aggregate = self.aggregate(&v);
        v
    }

    fn aggregate(&self, v: &ScoreVector) -> f64 {
        let w = &self.config.weights;
        let days = match self.config.preferred_num_days {
            Some(free) => v.days_on_campus.saturating_sub(free),
            None => v.days_on_campus,
        };
        let mut total = 0.0;
        total += w.days_on_campus * f64::from(days);
        total += w.gaps * v.gaps;
        total += w.modality * v.modality;
        total += w.day_length * v.day_length;
        total += w.day_consistency * v.day_consistency;
        total += w.sections_per_day * f64::from(v.sections_per_day);
        total += w.availability * v.availability;
        total += w.enrollment * v.enrollment;
        total
    }

    /// Timed blocks grouped by day and sorted by start. Malformed blocks never
    /// reach here; the plan rejects them.
    fn place(combination: &Combination<'_>) -> BTreeMap<Day, Vec<Placed>> {
        let mut by_day: BTreeMap<Day, Vec<Placed>> = BTreeMap::new();
        for (owner, section) in combination.sections().enumerate() {
            for block in &section.blocks {
                let Some(span) = block.span() else { continue };
                for day in &block.days {
                    by_day.entry(*day).or_default().push(Placed { span, owner });
                }
            }
        }
        for blocks in by_day.values_mut() {
            blocks.sort();
        }
        by_day
    }

    fn days_on_campus(combination: &Combination<'_>) -> u32 {
        let mut days = BTreeSet::new();
        for section in combination.sections() {
            if section.modality == Modality::Remote {
                continue;
            }
            for block in section.blocks.iter().filter(|b| !b.is_remote()) {
                days.extend(block.days.iter().copied());
            }
        }
        days.len() as u32
    }

    fn gaps(&self, by_day: &BTreeMap<Day, Vec<Placed>>) -> f64 {
        let grace = self.config.gap_grace_minutes;
        let mut idle: u64 = 0;
        for (day, blocks) in by_day {
            // The break only applies when the day has classes on both sides of it.
            let brk = self
                .config
                .mandatory_break
                .as_ref()
                .filter(|b| b.days.contains(day))
                .map(BreakWindow::span)
                .filter(|bs| {
                    blocks.iter().any(|p| p.span.end <= bs.start) && blocks.iter().any(|p| p.span.start >= bs.end)
                });
            let mut latest_end = 0;
            for (i, cur) in blocks.iter().enumerate() {
                if i > 0 && blocks[i - 1].owner != cur.owner && cur.span.start > latest_end {
                    let gap = Span { start: latest_end, end: cur.span.start };
                    for piece in split_around(gap, brk) {
                        if piece.len() > grace {
                            idle += u64::from(piece.len());
                        }
                    }
                }
                latest_end = latest_end.max(cur.span.end);
            }
        }
        hours(idle)
    }

    fn modality(&self, combination: &Combination<'_>) -> f64 {
        let ranking = &self.preference.ranking;
        let mut total: u64 = 0;
        for a in &combination.assignments {
            let wanted = self
                .preference
                .per_course
                .get(a.course)
                .or_else(|| self.preference.per_course.iter().find(|(k, _)| k.eq_ignore_ascii_case(a.course)).map(|(_, m)| m));
            total += match wanted {
                Some(m) => u64::from(*m != a.section.modality),
                None if ranking.is_empty() => 0,
                None => ranking.iter().position(|m| *m == a.section.modality).unwrap_or(ranking.len()) as u64,
            };
        }
        total as f64
    }

    fn day_length(by_day: &BTreeMap<Day, Vec<Placed>>) -> f64 {
        let total: u64 = by_day
            .values()
            .filter_map(|blocks| {
                let first = blocks.iter().map(|p| p.span.start).min()?;
                let last = blocks.iter().map(|p| p.span.end).max()?;
                Some(u64::from(last - first))
            })
            .sum();
        hours(total)
    }

    fn day_consistency(by_day: &BTreeMap<Day, Vec<Placed>>) -> f64 {
        let firsts: Vec<u32> = by_day.values().filter_map(|b| b.iter().map(|p| p.span.start).min()).collect();
        let lasts: Vec<u32> = by_day.values().filter_map(|b| b.iter().map(|p| p.span.end).max()).collect();
        (spread(&firsts) + spread(&lasts)) / 60.0
    }

    fn sections_per_day(&self, by_day: &BTreeMap<Day, Vec<Placed>>) -> u32 {
        let max = self.config.preferred_max_sections_per_day;
        by_day
            .values()
            .map(|blocks| {
                let owners: BTreeSet<usize> = blocks.iter().map(|p| p.owner).collect();
                (owners.len() as u32).saturating_sub(max)
            })
            .sum()
    }

    fn availability(&self, by_day: &BTreeMap<Day, Vec<Placed>>) -> f64 {
        let Some(avail) = self.availability else { return 0.0 };
        let mut outside: u64 = 0;
        for (day, blocks) in by_day {
            let windows: Vec<Span> = avail.get(day).map(|ws| ws.iter().map(|w| w.span()).collect()).unwrap_or_default();
            for p in blocks {
                outside += u64::from(p.span.len() - covered(p.span, &windows));
            }
        }
        hours(outside)
    }
}

/// The parts of `gap` before and after `brk`. Each part is graced on its own.
fn split_around(gap: Span, brk: Option<Span>) -> [Span; 2] {
    match brk {
        Some(b) => [
            Span { start: gap.start, end: gap.end.min(b.start).max(gap.start) },
            Span { start: gap.start.max(b.end).min(gap.end), end: gap.end },
        ],
        None => [gap, Span { start: gap.end, end: gap.end }],
    }
}

/// Sum of absolute deviations from the mean, in the input unit.
fn spread(values: &[u32]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64;
    values.iter().map(|v| (f64::from(*v) - mean).abs()).sum()
}

/// Minutes of `span` inside the union of `windows`.
fn covered(span: Span, windows: &[Span]) -> u32 {
    let mut clipped: Vec<Span> = windows
        .iter()
        .map(|w| Span { start: w.start.max(span.start), end: w.end.min(span.end) })
        .filter(|w| !w.is_empty())
        .collect();
    clipped.sort();
    let mut total = 0;
    let mut reach = span.start;
    for w in clipped {
        let start = w.start.max(reach);
        if w.end > start {
            total += w.end - start;
            reach = w.end;
        }
    }
    total
}
