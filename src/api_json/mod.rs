use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

use crate::algorithm::budget::Completion;
use crate::algorithm::pipeline::RankedResults;
use crate::catalog::{sort_by_enrollment, CatalogError, JsonCatalog, SectionCatalog, SqliteCatalog};
use crate::models::{Availability, CandidateMap, CourseSection, Modality, ModalityPreference, ScoreVector, SelectionRequest};

/// Parámetros de entrada de una corrida
///
/// # Estructura del JSON esperado:
/// ```json
/// {
///   "courses": ["MAT-143", "BIO-151", "ENG-111"],
///   "modality_preference": {
///     "ranking": ["in_person", "hybrid", "remote"],
///     "per_course": {"ENG-111": "remote"}
///   },
///   "availability": {
///     "M": ["8:00 AM - 2:00 PM"],
///     "T": ["11:00 AM - 10:00 PM"],
///     "F": []
///   },
///   "catalog_sqlite": "schedule.db"
/// }
/// ```
///
/// # Campos:
/// - `courses`: códigos de curso en el orden de búsqueda (requerido)
/// - `modality_preference`: ranking global y preferencias exactas por curso (opcional)
/// - `availability`: ventanas por día; un día sin ventanas es no disponible (opcional)
/// - `catalog_json` / `catalog_sqlite`: ruta al catálogo, relativa a `base_dir`
/// - `sections`: catálogo en línea; tiene prioridad sobre las rutas
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InputParams {
	pub courses: Vec<String>,
	#[serde(default)]
	pub modality_preference: ModalityPreference,
	#[serde(default)]
	pub availability: Option<Availability>,
	#[serde(default)]
	pub catalog_json: Option<String>,
	#[serde(default)]
	pub catalog_sqlite: Option<String>,
	#[serde(default)]
	pub sections: Option<Vec<CourseSection>>,
}

pub fn parse_json_input(json_str: &str) -> Result<InputParams, serde_json::Error> {
	serde_json::from_str::<InputParams>(json_str)
}

impl InputParams {
	pub fn selection(&self) -> SelectionRequest {
		SelectionRequest {
			courses: self.courses.clone(),
			modality_preference: self.modality_preference.clone(),
			availability: self.availability.clone(),
		}
	}
}

fn resolve_path(name: &str, base_dir: Option<&Path>) -> PathBuf {
	match base_dir {
		Some(b) => b.join(name),
		None => PathBuf::from(name),
	}
}

/// Build the catalog snapshot for `params`.
///
/// `open_sqlite` is injected so tests can hand in an in-memory database.
pub fn load_candidates_with<F>(
	params: &InputParams,
	base_dir: Option<&Path>,
	order_by_enrollment: bool,
	open_sqlite: F,
) -> Result<CandidateMap, CatalogError>
where
	F: Fn(&Path) -> Result<SqliteCatalog, CatalogError>,
{
	let selection = params.selection();
	let given = [params.sections.is_some(), params.catalog_json.is_some(), params.catalog_sqlite.is_some()];
	if given.iter().filter(|g| **g).count() > 1 {
		warn!("several catalog sources given; using the first of sections, catalog_json, catalog_sqlite");
	}

	let mut candidates = if let Some(sections) = &params.sections {
		JsonCatalog::from_sections(sections.clone()).snapshot(&selection)?
	} else if let Some(name) = &params.catalog_json {
		let path = resolve_path(name, base_dir);
		info!(path = %path.display(), "reading JSON catalog");
		JsonCatalog::open(&path)?.snapshot(&selection)?
	} else if let Some(name) = &params.catalog_sqlite {
		let path = resolve_path(name, base_dir);
		info!(path = %path.display(), "reading SQLite catalog");
		open_sqlite(path.as_path())?.snapshot(&selection)?
	} else {
		return Err(CatalogError::NoSource);
	};

	if order_by_enrollment {
		sort_by_enrollment(&mut candidates);
	}
	Ok(candidates)
}

pub fn load_candidates(params: &InputParams, base_dir: Option<&Path>, order_by_enrollment: bool) -> Result<CandidateMap, CatalogError> {
	load_candidates_with(params, base_dir, order_by_enrollment, |p| SqliteCatalog::open(p))
}

/// Una sección dentro de una solución serializada
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SectionEntry {
	pub course: String,
	pub section: String,
	pub modality: Modality,
	#[serde(skip_serializing_if = "Option::is_none")]
	pub pulled_by: Option<String>,
	/// "M,W 09:00-10:15" por bloque
	pub meetings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolutionEntry {
	pub rank: usize,
	pub generation: u64,
	pub total_score: f64,
	pub score: ScoreVector,
	pub sections: Vec<SectionEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SolveResponse {
	pub completion: Completion,
	pub generated: u64,
	pub nodes: u64,
	pub solutions: Vec<SolutionEntry>,
}

impl SolveResponse {
	pub fn from_results(results: &RankedResults<'_>) -> Self {
		let solutions = results
			.entries
			.iter()
			.map(|e| SolutionEntry {
				rank: e.rank,
				generation: e.generation,
				total_score: e.score.aggregate,
				score: e.score,
				sections: e
					.combination
					.assignments
					.iter()
					.map(|a| SectionEntry {
						course: a.course.to_string(),
						section: a.section.section.clone(),
						modality: a.section.modality,
						pulled_by: a.pulled_by.clone(),
						meetings: a.section.blocks.iter().map(crate::report::describe_block).collect(),
					})
					.collect(),
			})
			.collect();
		Self { completion: results.completion, generated: results.generated, nodes: results.nodes, solutions }
	}
}
