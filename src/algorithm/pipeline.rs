// pipeline.rs - Orquestador de una corrida completa.
//
// FASE 1: plan
//   - Validar la selección contra el snapshot del catálogo
//   - Precalcular las elecciones con co-requisitos de cada curso
// FASE 2: búsqueda + puntaje
//   - Cada worker recorre un subconjunto disjunto de elecciones del primer curso
//   - Puntúa y rankea localmente (top-K acotado)
// FASE 3: merge
//   - Unir rankings parciales, numerar por orden de generación global
use serde::Serialize;
use std::thread;
use tracing::{debug, info};

use crate::algorithm::budget::{BudgetState, Completion, SearchBudget};
use crate::algorithm::coreq::{build_plan, SearchPlan};
use crate::algorithm::ranking::{GenerationOrder, Ranker, ScoredCombination};
use crate::algorithm::scoring::{Scorer, ScoringConfig};
use crate::algorithm::section_selector::CombinationIter;
use crate::error::EngineError;
use crate::models::{CandidateMap, Combination, ScoreVector, SelectionRequest};

/// One ranked combination.
#[derive(Debug, Clone, Serialize)]
pub struct RankedEntry<'a> {
    /// 1-based position in the ranking.
    pub rank: usize,
    /// 0-based position in the sequential enumeration.
    pub generation: u64,
    pub combination: Combination<'a>,
    pub score: ScoreVector,
}

/// Outcome of `generate_and_rank`. Zero entries with `Exhausted` means no
/// feasible schedule exists.
#[derive(Debug, Clone, Serialize)]
pub struct RankedResults<'a> {
    pub entries: Vec<RankedEntry<'a>>,
    pub completion: Completion,
    /// Complete combinations produced before ranking.
    pub generated: u64,
    /// Candidate attempts made by the search.
    pub nodes: u64,
}

impl RankedResults<'_> {
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_partial(&self) -> bool {
        self.completion.is_partial()
    }
}

struct WorkerOutcome<'a> {
    ranker: Ranker<'a>,
    /// (root, combinations produced under it)
    counts: Vec<(usize, u64)>,
    completion: Completion,
}

fn run_worker<'a>(
    plan: &SearchPlan<'a>,
    scorer: &Scorer<'_>,
    top_k: usize,
    state: &BudgetState,
    roots: impl Iterator<Item = usize>,
) -> WorkerOutcome<'a> {
    let mut ranker = Ranker::new(top_k);
    let mut counts = Vec::new();
    let mut meter = state.meter();
    let mut completion = Completion::Exhausted;

    for root in roots {
        let mut iter = CombinationIter::with_roots(plan, meter, root..root + 1);
        let mut index = 0u64;
        for combination in iter.by_ref() {
            let score = scorer.score(&combination);
            ranker.push(ScoredCombination { order: GenerationOrder { root, index }, combination, score });
            index += 1;
        }
        counts.push((root, index));
        completion = iter.completion();
        meter = iter.into_meter();
        if completion.is_partial() {
            break;
        }
    }
    WorkerOutcome { ranker, counts, completion }
}

/// Generate every valid combination for `selection`, score it, and return the
/// best `top_k` in rank order.
///
/// Structural problems (unknown course, broken co-requisite, malformed block)
/// fail the whole run before any search happens, as does `top_k == 0`. A
/// search that finds nothing is not an error.
pub fn generate_and_rank<'a>(
    selection: &SelectionRequest,
    candidates: &'a CandidateMap,
    scoring: &ScoringConfig,
    top_k: usize,
    budget: &SearchBudget,
) -> Result<RankedResults<'a>, EngineError> {
    if top_k == 0 {
        return Err(EngineError::ZeroTopK);
    }
    info!(courses = selection.courses.len(), catalog = candidates.len(), "phase 1: plan");
    let plan = build_plan(selection, candidates)?;
    debug!(
        depth = plan.depth(),
        roots = plan.roots(),
        choices = plan.choices.iter().map(Vec::len).sum::<usize>(),
        "plan ready"
    );

    let scorer = Scorer::new(scoring, &selection.modality_preference, selection.availability.as_ref());
    let state = BudgetState::start(budget);
    let roots = plan.roots();
    let workers = budget.effective_workers().clamp(1, roots.max(1));
    info!(workers, top_k, "phase 2: search");

    let outcomes: Vec<WorkerOutcome<'a>> = if workers == 1 {
        vec![run_worker(&plan, &scorer, top_k, &state, 0..roots)]
    } else {
        thread::scope(|s| {
            let handles: Vec<_> = (0..workers)
                .map(|w| {
                    let (plan, scorer, state) = (&plan, &scorer, &state);
                    s.spawn(move || run_worker(plan, scorer, top_k, state, (w..roots).step_by(workers)))
                })
                .collect();
            handles
                .into_iter()
                .map(|h| h.join().unwrap_or_else(|e| std::panic::resume_unwind(e)))
                .collect()
        })
    };

    info!("phase 3: merge");
    let mut per_root = vec![0u64; roots];
    let mut completion = Completion::Exhausted;
    let mut ranker = Ranker::new(top_k);
    for outcome in outcomes {
        for (root, n) in outcome.counts {
            per_root[root] = n;
        }
        if completion == Completion::Exhausted {
            completion = outcome.completion;
        }
        ranker.merge(outcome.ranker);
    }

    // Global generation index of each root's first combination.
    let mut offsets = Vec::with_capacity(roots);
    let mut acc = 0u64;
    for n in &per_root {
        offsets.push(acc);
        acc += n;
    }

    let entries: Vec<RankedEntry<'a>> = ranker
        .finish()
        .into_iter()
        .enumerate()
        .map(|(i, e)| RankedEntry {
            rank: i + 1,
            generation: offsets[e.order.root] + e.order.index,
            combination: e.combination,
            score: e.score,
        })
        .collect();

    let nodes = state.nodes();
    info!(generated = acc, nodes, kept = entries.len(), ?completion, "run finished");
    Ok(RankedResults { entries, completion, generated: acc, nodes })
}
