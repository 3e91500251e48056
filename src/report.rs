// Resumen en texto plano de las soluciones rankeadas.
use std::fmt::Write;

use crate::algorithm::pipeline::{RankedEntry, RankedResults};
use crate::models::{Assignment, MeetingBlock, ScoreVector};

/// "M,W 09:00-10:15"; missing parts are shown as "?".
pub fn describe_block(block: &MeetingBlock) -> String {
    let days: Vec<&str> = block.days.iter().map(|d| d.code()).collect();
    let days = if days.is_empty() { "?".to_string() } else { days.join(",") };
    let t = |v: Option<chrono::NaiveTime>| v.map_or_else(|| "?".to_string(), |t| t.format("%H:%M").to_string());
    format!("{} {}-{}", days, t(block.start), t(block.end))
}

fn score_header(s: &ScoreVector) -> String {
    format!(
        "Aggregate = {:.2}, Days On Campus = {}, Gaps = {:.2}, Modality = {}, Day Length = {:.2}, \
         Day Consistency = {:.2}, Sections Per Day = {}, Availability = {:.2}, Enrollment = {:.2}",
        s.aggregate,
        s.days_on_campus,
        s.gaps,
        s.modality,
        s.day_length,
        s.day_consistency,
        s.sections_per_day,
        s.availability,
        s.enrollment
    )
}

// Primer día de reunión, luego hora de inicio; sin horario al final
fn sort_key(a: &Assignment<'_>) -> (u8, u32, String) {
    let first = a
        .section
        .blocks
        .iter()
        .filter_map(|b| Some((*b.days.iter().next()? as u8, b.span()?.start)))
        .min();
    match first {
        Some((day, start)) => (day, start, a.section.label()),
        None => (u8::MAX, 0, a.section.label()),
    }
}

fn format_assignment(a: &Assignment<'_>) -> String {
    let s = a.section;
    let meetings = if s.blocks.is_empty() {
        format!("{} - no meeting times", s.modality)
    } else {
        s.blocks.iter().map(describe_block).collect::<Vec<_>>().join("; ")
    };
    match &a.pulled_by {
        Some(by) => format!("{} ({}) [co-requisite of {}]", s.label(), meetings, by),
        None => format!("{} ({})", s.label(), meetings),
    }
}

fn write_entry(out: &mut String, e: &RankedEntry<'_>) {
    let _ = writeln!(out, "Option {}: {}", e.rank, score_header(&e.score));
    let mut sorted: Vec<&Assignment<'_>> = e.combination.assignments.iter().collect();
    sorted.sort_by_cached_key(|a| sort_key(a));
    for a in sorted {
        let _ = writeln!(out, "{}", format_assignment(a));
    }
    out.push('\n');
}

pub fn render_text(results: &RankedResults<'_>) -> String {
    let mut out = String::new();
    if results.is_empty() {
        out.push_str("No feasible schedule.\n");
    } else {
        out.push_str("Ranked schedule combinations:\n\n");
        for e in &results.entries {
            write_entry(&mut out, e);
        }
    }
    let _ = writeln!(
        out,
        "{} combination(s) generated, {} node(s) visited, completion: {:?}{}",
        results.generated,
        results.nodes,
        results.completion,
        if results.is_partial() { " (partial results)" } else { "" }
    );
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algorithm::budget::Completion;
    use crate::models::{Combination, CourseSection, Day, Modality};
    use chrono::NaiveTime;

    #[test]
    fn sections_listed_by_first_day_then_start() {
        let t = |h| NaiveTime::from_hms_opt(h, 0, 0).unwrap();
        let fri = CourseSection::new("A-1", "01").with_block(MeetingBlock::new([Day::Fri], t(8), t(9), Modality::InPerson));
        let tue = CourseSection::new("B-1", "01").with_block(MeetingBlock::new([Day::Tue, Day::Thu], t(13), t(14), Modality::InPerson));
        let web = CourseSection::new("C-1", "01").with_modality(Modality::Remote);
        let results = RankedResults {
            entries: vec![RankedEntry {
                rank: 1,
                generation: 0,
                combination: Combination {
                    assignments: [&fri, &web, &tue]
                        .into_iter()
                        .map(|s| Assignment { course: s.course.as_str(), section: s, pulled_by: None })
                        .collect(),
                },
                score: ScoreVector::default(),
            }],
            completion: Completion::Exhausted,
            generated: 1,
            nodes: 3,
        };
        let text = render_text(&results);
        let lines: Vec<&str> = text.lines().collect();
        assert!(lines[2].starts_with("Option 1: Aggregate = 0.00"));
        assert_eq!(lines[3], "B-1-01 (T,TH 13:00-14:00)");
        assert_eq!(lines[4], "A-1-01 (F 08:00-09:00)");
        assert_eq!(lines[5], "C-1-01 (remote - no meeting times)");
    }
}
