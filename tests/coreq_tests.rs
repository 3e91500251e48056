mod common;

use combishift::algorithm::{generate_and_rank, ScoringConfig, SearchBudget};
use combishift::error::UnresolvedReason;
use combishift::models::{CandidateMap, Day, SectionRef, SelectionRequest};
use combishift::EngineError;
use common::*;

fn r(s: &str) -> SectionRef {
    s.parse().unwrap()
}

fn run(map: &CandidateMap, courses: &[&str]) -> Result<Vec<Vec<String>>, EngineError> {
    let sel = SelectionRequest::new(courses.iter().copied());
    let res = generate_and_rank(&sel, map, &ScoringConfig::default(), 100, &SearchBudget::unlimited())?;
    let mut by_gen: Vec<_> = res.entries.into_iter().map(|e| (e.generation, e.combination.labels())).collect();
    by_gen.sort();
    Ok(by_gen.into_iter().map(|(_, l)| l).collect())
}

#[test]
fn test_laboratorio_se_agrega_con_su_clave() {
    use Day::*;
    let map = catalog(vec![
        section("LEC-1", "01", &[Mon, Wed], t(9, 0), t(10, 0)).with_coreq(r("L-1-01")),
        section("L-1", "01", &[Fri], t(9, 0), t(12, 0)),
    ]);
    let sel = SelectionRequest::new(["LEC-1"]);
    let res = generate_and_rank(&sel, &map, &ScoringConfig::default(), 10, &SearchBudget::unlimited()).unwrap();
    assert_eq!(res.entries.len(), 1);
    let combo = &res.entries[0].combination;
    assert_eq!(combo.len(), 2);
    assert_eq!(combo.get("L-1").map(|s| s.section.as_str()), Some("01"));
    assert_eq!(combo.assignments[1].pulled_by.as_deref(), Some("LEC-1-01"));
}

#[test]
fn test_laboratorio_incompatible() {
    use Day::*;
    let map = catalog(vec![
        section("LEC-1", "01", &[Mon, Wed], t(9, 0), t(10, 0)).with_coreq(r("L-1-01")),
        section("L-1", "01", &[Wed], t(9, 30), t(11, 0)),
    ]);
    let err = run(&map, &["LEC-1"]).unwrap_err();
    assert_eq!(
        err,
        EngineError::CorequisiteUnresolved {
            course: "LEC-1".into(),
            section: "01".into(),
            required_course: "L-1".into(),
            required_section: "01".into(),
            reason: UnresolvedReason::Incompatible,
        }
    );
}

#[test]
fn test_referencia_inexistente() {
    use Day::*;
    let map = catalog(vec![
        section("LEC-1", "01", &[Mon], t(9, 0), t(10, 0)).with_coreq(r("L-1-07")),
        section("L-1", "01", &[Fri], t(9, 0), t(12, 0)),
    ]);
    assert!(matches!(
        run(&map, &["LEC-1"]),
        Err(EngineError::CorequisiteUnresolved { reason: UnresolvedReason::SectionMissing, .. })
    ));

    let map = catalog(vec![section("LEC-1", "01", &[Mon], t(9, 0), t(10, 0)).with_coreq(r("LAB-9-01"))]);
    assert!(matches!(
        run(&map, &["LEC-1"]),
        Err(EngineError::CorequisiteUnresolved { reason: UnresolvedReason::CourseMissing, .. })
    ));
}

#[test]
fn test_alternativas_del_mismo_curso() {
    use Day::*;
    let map = catalog(vec![
        section("BIO-151", "101", &[Mon, Wed], t(8, 0), t(9, 15)).with_coreq(r("BIO-151L-101")).with_coreq(r("BIO-151L-102")),
        section("BIO-151L", "101", &[Tue], t(8, 0), t(10, 50)),
        section("BIO-151L", "102", &[Thu], t(8, 0), t(10, 50)),
    ]);
    let got = run(&map, &["BIO-151"]).unwrap();
    assert_eq!(got, vec![vec!["BIO-151-101", "BIO-151L-101"], vec!["BIO-151-101", "BIO-151L-102"]]);
}

#[test]
fn test_una_alternativa_choca_con_otro_curso() {
    use Day::*;
    let map = catalog(vec![
        section("BIO-151", "101", &[Mon, Wed], t(8, 0), t(9, 15)).with_coreq(r("BIO-151L-101")).with_coreq(r("BIO-151L-102")),
        section("BIO-151L", "101", &[Tue], t(8, 0), t(10, 50)),
        section("BIO-151L", "102", &[Thu], t(8, 0), t(10, 50)),
        section("MAT-143", "01", &[Tue, Thu], t(10, 0), t(11, 15)),
        section("MAT-143", "02", &[Tue], t(13, 0), t(14, 15)),
    ]);
    let got = run(&map, &["BIO-151", "MAT-143"]).unwrap();
    // MAT-143-01 choca con ambos laboratorios, 02 con ninguno
    assert_eq!(
        got,
        vec![
            vec!["BIO-151-101", "BIO-151L-101", "MAT-143-02"],
            vec!["BIO-151-101", "BIO-151L-102", "MAT-143-02"],
        ]
    );
}

#[test]
fn test_curso_seleccionado_y_arrastrado() {
    use Day::*;
    let map = catalog(vec![
        section("LEC-1", "01", &[Mon], t(9, 0), t(10, 0)).with_coreq(r("L-1-02")),
        section("L-1", "01", &[Tue], t(9, 0), t(12, 0)),
        section("L-1", "02", &[Thu], t(9, 0), t(12, 0)),
    ]);
    // Con L-1 primero, sólo sobrevive la sección que LEC-1 exige
    let got = run(&map, &["L-1", "LEC-1"]).unwrap();
    assert_eq!(got, vec![vec!["L-1-02", "LEC-1-01"]]);
    // Con LEC-1 primero, L-1 queda forzado
    let got = run(&map, &["LEC-1", "L-1"]).unwrap();
    assert_eq!(got, vec![vec!["LEC-1-01", "L-1-02"]]);
}

#[test]
fn test_cadena_transitiva() {
    use Day::*;
    let map = catalog(vec![
        section("A-1", "01", &[Mon], t(8, 0), t(9, 0)).with_coreq(r("B-1-01")),
        section("B-1", "01", &[Tue], t(8, 0), t(9, 0)).with_coreq(r("C-1-01")),
        section("C-1", "01", &[Wed], t(8, 0), t(9, 0)).with_coreq(r("A-1-01")),
    ]);
    let got = run(&map, &["A-1"]).unwrap();
    assert_eq!(got, vec![vec!["A-1-01", "B-1-01", "C-1-01"]]);
}
