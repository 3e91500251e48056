// Biblioteca raíz del crate `combishift`.
// Genera todas las combinaciones válidas de secciones para una selección de
// cursos, las puntúa y devuelve un ranking. `generate_and_rank` es la entrada.
pub mod algorithm;
pub mod api_json;
pub mod catalog;
pub mod config;
pub mod error;
pub mod models;
pub mod report;

pub use algorithm::{generate_and_rank, Completion, RankedEntry, RankedResults, ScoringConfig, SearchBudget};
pub use config::EngineConfig;
pub use error::EngineError;
