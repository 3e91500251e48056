// Presupuesto de búsqueda: nodos visitados y tiempo de pared.
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Limits for one run. `None` means unlimited.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchBudget {
    /// Candidate attempts across all workers.
    pub max_nodes: Option<u64>,
    pub time_limit: Option<Duration>,
    /// Worker threads exploring first-course branches; 0 = one per CPU.
    pub workers: usize,
}

impl SearchBudget {
    pub fn unlimited() -> Self {
        Self { workers: 1, ..Default::default() }
    }

    pub fn with_max_nodes(mut self, n: u64) -> Self {
        self.max_nodes = Some(n);
        self
    }

    pub fn with_time_limit(mut self, d: Duration) -> Self {
        self.time_limit = Some(d);
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn effective_workers(&self) -> usize {
        if self.workers == 0 { num_cpus::get().max(1) } else { self.workers }
    }
}

/// How the search ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Completion {
    /// The whole space was explored.
    Exhausted,
    /// Stopped by `max_nodes`; results are partial.
    NodeBudget,
    /// Stopped by `time_limit`; results are partial.
    TimeBudget,
}

impl Completion {
    pub fn is_partial(self) -> bool {
        self != Completion::Exhausted
    }
}

// Instant::now is not free; sample the clock every this many ticks.
const CLOCK_EVERY: u64 = 256;

/// Shared counters for a run; one per `generate_and_rank` call.
#[derive(Debug)]
pub struct BudgetState {
    max_nodes: Option<u64>,
    deadline: Option<Instant>,
    nodes: AtomicU64,
}

impl BudgetState {
    pub fn start(budget: &SearchBudget) -> Self {
        Self {
            max_nodes: budget.max_nodes,
            deadline: budget.time_limit.map(|d| Instant::now() + d),
            nodes: AtomicU64::new(0),
        }
    }

    pub fn nodes(&self) -> u64 {
        self.nodes.load(Ordering::Relaxed)
    }

    pub fn meter(&self) -> BudgetMeter<'_> {
        BudgetMeter { state: self, local: 0 }
    }
}

/// Per-worker handle onto a `BudgetState`.
#[derive(Debug)]
pub struct BudgetMeter<'b> {
    state: &'b BudgetState,
    local: u64,
}

impl BudgetMeter<'_> {
    /// Count one candidate attempt. `Err` carries the reason to stop.
    pub fn tick(&mut self) -> Result<(), Completion> {
        let total = self.state.nodes.fetch_add(1, Ordering::Relaxed) + 1;
        if let Some(max) = self.state.max_nodes {
            if total > max {
                return Err(Completion::NodeBudget);
            }
        }
        self.local += 1;
        if let Some(deadline) = self.state.deadline {
            if self.local % CLOCK_EVERY == 1 && Instant::now() >= deadline {
                return Err(Completion::TimeBudget);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_budget_trips_after_limit() {
        let state = BudgetState::start(&SearchBudget::unlimited().with_max_nodes(3));
        let mut m = state.meter();
        assert!(m.tick().is_ok());
        assert!(m.tick().is_ok());
        assert!(m.tick().is_ok());
        assert_eq!(m.tick(), Err(Completion::NodeBudget));
    }

    #[test]
    fn zero_time_limit_trips_on_first_tick() {
        let state = BudgetState::start(&SearchBudget::unlimited().with_time_limit(Duration::ZERO));
        assert_eq!(state.meter().tick(), Err(Completion::TimeBudget));
    }
}
