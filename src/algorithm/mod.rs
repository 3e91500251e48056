// Módulo de alto nivel: búsqueda de combinaciones, puntaje y ranking.
pub mod budget;
pub mod conflict;
pub mod coreq;
pub mod pipeline;
pub mod ranking;
pub mod scoring;
pub mod section_selector;

// Reexportar solo la API pública que usan el binario y los tests
pub use budget::{Completion, SearchBudget};
pub use conflict::{blocks_conflict, sections_conflict};
pub use coreq::{build_plan, SearchPlan};
pub use pipeline::{generate_and_rank, RankedEntry, RankedResults};
pub use ranking::{rank_cmp, GenerationOrder, Ranker, ScoredCombination};
pub use scoring::{BreakWindow, ScoreWeights, Scorer, ScoringConfig};
pub use section_selector::CombinationIter;
