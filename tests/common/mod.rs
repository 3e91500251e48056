// Helpers compartidos por los tests de integración.
#![allow(dead_code)]

use chrono::NaiveTime;
use combishift::models::{CandidateMap, CourseSection, Day, MeetingBlock, Modality};
use rusqlite::{params, Connection};

pub fn t(h: u32, m: u32) -> NaiveTime {
    NaiveTime::from_hms_opt(h, m, 0).unwrap()
}

pub fn block(days: &[Day], start: NaiveTime, end: NaiveTime) -> MeetingBlock {
    MeetingBlock::new(days.iter().copied(), start, end, Modality::InPerson)
}

pub fn section(course: &str, section: &str, days: &[Day], start: NaiveTime, end: NaiveTime) -> CourseSection {
    CourseSection::new(course, section).with_block(block(days, start, end))
}

pub fn catalog(sections: Vec<CourseSection>) -> CandidateMap {
    let mut map = CandidateMap::new();
    for s in sections {
        map.entry(s.course.clone()).or_default().push(s);
    }
    map
}

/// MATH-101 {A MW 9-10, B TTh 9-10}, ENGL-101 {C MW 9:30-10:30, D TTh 11-12}
pub fn math_engl() -> CandidateMap {
    use Day::*;
    catalog(vec![
        section("MATH-101", "A", &[Mon, Wed], t(9, 0), t(10, 0)),
        section("MATH-101", "B", &[Tue, Thu], t(9, 0), t(10, 0)),
        section("ENGL-101", "C", &[Mon, Wed], t(9, 30), t(10, 30)),
        section("ENGL-101", "D", &[Tue, Thu], t(11, 0), t(12, 0)),
    ])
}

/// Three courses, several sections each, for determinism checks.
pub fn wide_catalog() -> CandidateMap {
    use Day::*;
    let mut secs = Vec::new();
    let patterns: [&[Day]; 3] = [&[Mon, Wed, Fri], &[Tue, Thu], &[Mon, Wed]];
    for (ci, course) in ["HIS-101", "PSY-150", "MAT-171"].iter().enumerate() {
        for si in 0..5u32 {
            let days = patterns[(ci + si as usize) % 3];
            let start = 8 + (si * 2 + ci as u32) % 9;
            secs.push(
                section(course, &format!("{:02}", si + 1), days, t(start, 0), t(start + 1, 15))
                    .with_enrollment(si * 3 % 7, Some(30)),
            );
        }
    }
    catalog(secs)
}

/// Una fila activa del catálogo SQLite: (curso, sección, días, inicio, fin, modalidad).
pub type Row<'r> = (&'r str, &'r str, &'r str, &'r str, &'r str, &'r str);

/// Inserta una fila con (inscritos, capacidad, cupos) y sus co-requisitos.
pub fn insert_row(conn: &Connection, row: Row<'_>, seats: (u32, Option<u32>, u32), coreqs: &str) {
    let (course, section, days, start, end, modality) = row;
    let (enrollment, capacity, available) = seats;
    conn.execute(
        "INSERT INTO sections (course, section, days, start_time, end_time, modality, enrollment, capacity, available_seats, status, coreqs)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, 'A', ?10)",
        params![course, section, days, start, end, modality, enrollment, capacity, available, coreqs],
    )
    .unwrap();
}
