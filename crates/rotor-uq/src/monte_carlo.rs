// ─────────────────────────────────────────────────────────────────────
// Rotor Closeout — Monte Carlo Driver
// © 1998–2026 Miroslav Šotek. All rights reserved.
// Contact: www.anulum.li | protoscience@anulum.li
// ORCID: https://orcid.org/0009-0009-3560-0851
// License: GNU AGPL v3 | Commercial licensing available
// ─────────────────────────────────────────────────────────────────────
//! Sharded, reproducible Monte Carlo propagation through the rotor model.
//!
//! Trial `i` draws from its own ChaCha20 stream `(seed, i)`, so its sample does
//! not depend on which worker runs it. Trials are grouped into fixed-size shards
//! by index; each shard accumulates sequentially and shards are merged in index
//! order. The result is therefore bit-identical for any thread count, and
//! changing the shard size only reorders floating-point summation.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand_chacha::ChaCha20Rng;
use rayon::prelude::*;
use rotor_core::aggregate::RotorPerformance;
use rotor_core::diagnostics::RunDiagnostics;
use rotor_core::rotor::RotorModel;
use rotor_types::config::MonteCarloConfig;
use rotor_types::error::{ensure, ErrorKind, RotorError, RotorResult};
use rotor_types::state::{OperatingPoint, Quantity};
use serde::Serialize;
use tracing::{info, trace, warn};

use crate::online_stats::{RunningStats, StatsSummary};
use crate::uncertainty::UncertaintyModel;

/// Independent random stream of trial `index` under `seed`.
pub fn trial_rng(seed: u64, index: u64) -> ChaCha20Rng {
    let mut rng = ChaCha20Rng::seed_from_u64(seed);
    rng.set_stream(index);
    rng
}

/// One [`RunningStats`] per monitored quantity.
#[derive(Debug, Clone, PartialEq)]
pub struct MonitoredStats {
    stats: BTreeMap<Quantity, RunningStats>,
}

impl MonitoredStats {
    pub fn new(quantities: &[Quantity], sketch_capacity: usize) -> RotorResult<Self> {
        ensure(!quantities.is_empty(), ErrorKind::InvalidArgument, || {
            "at least one quantity must be monitored".to_string()
        })?;
        let mut stats = BTreeMap::new();
        for &q in quantities {
            ensure(
                stats.insert(q, RunningStats::new(sketch_capacity)?).is_none(),
                ErrorKind::InvalidArgument,
                || format!("quantity '{}' monitored twice", q.name()),
            )?;
        }
        Ok(MonitoredStats { stats })
    }

    pub fn record(&mut self, performance: &RotorPerformance) {
        for (&q, stats) in self.stats.iter_mut() {
            stats.push(performance.get(q));
        }
    }

    /// Merging aggregates over different quantity sets would corrupt the result.
    pub fn merge(&mut self, other: &MonitoredStats) -> RotorResult<()> {
        ensure(
            self.stats.keys().eq(other.stats.keys()),
            ErrorKind::InvariantViolation,
            || {
                format!(
                    "monitored quantity sets differ: {:?} vs {:?}",
                    self.quantities(),
                    other.quantities()
                )
            },
        )?;
        for (q, stats) in self.stats.iter_mut() {
            if let Some(theirs) = other.stats.get(q) {
                stats.merge(theirs)?;
            }
        }
        Ok(())
    }

    pub fn get(&self, quantity: Quantity) -> Option<&RunningStats> {
        self.stats.get(&quantity)
    }

    pub fn quantities(&self) -> Vec<Quantity> {
        self.stats.keys().copied().collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Quantity, &RunningStats)> {
        self.stats.iter().map(|(&q, s)| (q, s))
    }

    /// Valid trials recorded.
    pub fn count(&self) -> u64 {
        self.stats.values().next().map_or(0, RunningStats::count)
    }

    pub fn summaries(&self) -> Vec<QuantitySummary> {
        self.iter()
            .map(|(quantity, stats)| QuantitySummary {
                quantity,
                stats: stats.summary(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuantitySummary {
    pub quantity: Quantity,
    #[serde(flatten)]
    pub stats: StatsSummary,
}

/// Cooperative stop flag, checked between trials.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum StopReason {
    Completed,
    Cancelled,
    WallClockBudget,
}

/// Outcome of a run. Statistics cover only trials that finished.
#[derive(Debug, Clone, Serialize)]
pub struct MonteCarloReport {
    pub trials_requested: usize,
    pub trials_completed: u64,
    pub seed: u64,
    pub shard_size: usize,
    pub stop_reason: StopReason,
    pub elapsed_s: f64,
    pub diagnostics: RunDiagnostics,
    pub summaries: Vec<QuantitySummary>,
    #[serde(skip)]
    pub stats: MonitoredStats,
}

impl MonteCarloReport {
    pub fn is_complete(&self) -> bool {
        self.stop_reason == StopReason::Completed
    }
}

struct ShardOutcome {
    stats: MonitoredStats,
    diagnostics: RunDiagnostics,
}

pub struct MonteCarloDriver<'a> {
    model: &'a RotorModel,
    uncertainty: &'a UncertaintyModel,
    base: OperatingPoint,
    config: MonteCarloConfig,
}

impl<'a> MonteCarloDriver<'a> {
    pub fn new(
        model: &'a RotorModel,
        uncertainty: &'a UncertaintyModel,
        base: OperatingPoint,
        config: MonteCarloConfig,
    ) -> RotorResult<Self> {
        base.validate()?;
        ensure(config.shard_size >= 1, ErrorKind::OutOfRange, || {
            "shard_size must be >= 1".to_string()
        })?;
        ensure(config.threads != Some(0), ErrorKind::OutOfRange, || {
            "thread count must be >= 1 when set".to_string()
        })?;
        if let Some(budget) = config.max_wall_time_s {
            ensure(budget.is_finite() && budget > 0.0, ErrorKind::OutOfRange, || {
                format!("wall-clock budget must be > 0, got {budget}")
            })?;
        }
        MonitoredStats::new(&config.monitored, config.sketch_capacity)?;
        Ok(MonteCarloDriver {
            model,
            uncertainty,
            base,
            config,
        })
    }

    pub fn config(&self) -> &MonteCarloConfig {
        &self.config
    }

    pub fn run(&self) -> RotorResult<MonteCarloReport> {
        self.run_with_cancel(&CancelToken::new())
    }

    /// Run all trials, or as many as finish before `cancel` fires or the budget runs out.
    ///
    /// Fatal errors from any trial abort the run; the first in trial order is returned.
    pub fn run_with_cancel(&self, cancel: &CancelToken) -> RotorResult<MonteCarloReport> {
        let started = Instant::now();
        let deadline = self.deadline(started);
        let trials = self.config.trials;
        let shard_size = self.config.shard_size;
        let shards = trials.div_ceil(shard_size);

        info!(
            trials,
            shards,
            shard_size,
            seed = self.config.seed,
            inputs = self.uncertainty.len(),
            "monte carlo run started"
        );

        let run_all = || {
            (0..shards)
                .into_par_iter()
                .map(|s| {
                    let start = s * shard_size;
                    let end = (start + shard_size).min(trials);
                    self.run_shard(s, start..end, cancel, deadline)
                })
                .collect::<Vec<_>>()
        };
        let outcomes = match self.config.threads {
            Some(n) => rayon::ThreadPoolBuilder::new()
                .num_threads(n)
                .build()
                .map_err(|e| RotorError::internal(format!("thread pool: {e}")))?
                .install(run_all),
            None => run_all(),
        };

        let mut stats = MonitoredStats::new(&self.config.monitored, self.config.sketch_capacity)?;
        let mut diagnostics = RunDiagnostics::new();
        for outcome in outcomes {
            let outcome = outcome?;
            stats.merge(&outcome.stats)?;
            diagnostics.merge(&outcome.diagnostics);
        }

        let completed = diagnostics.trials_attempted;
        let stop_reason = if completed == trials as u64 {
            StopReason::Completed
        } else if cancel.is_cancelled() {
            StopReason::Cancelled
        } else {
            StopReason::WallClockBudget
        };
        let elapsed_s = started.elapsed().as_secs_f64();

        if stop_reason == StopReason::Completed {
            info!(
                completed,
                valid = diagnostics.trials_valid,
                invalid = diagnostics.trials_invalid,
                mean_iterations = diagnostics.mean_iterations().unwrap_or(0.0),
                elapsed_s,
                "monte carlo run finished"
            );
        } else {
            warn!(
                ?stop_reason,
                completed,
                requested = trials,
                valid = diagnostics.trials_valid,
                elapsed_s,
                "monte carlo run stopped early"
            );
        }

        Ok(MonteCarloReport {
            trials_requested: trials,
            trials_completed: completed,
            seed: self.config.seed,
            shard_size,
            stop_reason,
            elapsed_s,
            diagnostics,
            summaries: stats.summaries(),
            stats,
        })
    }

    /// Instant the wall-clock budget runs out. A budget too large for the clock means none.
    fn deadline(&self, started: Instant) -> Option<Instant> {
        self.config
            .max_wall_time_s
            .and_then(|s| Duration::try_from_secs_f64(s).ok())
            .and_then(|budget| started.checked_add(budget))
    }

    fn run_shard(
        &self,
        shard: usize,
        trials: std::ops::Range<usize>,
        cancel: &CancelToken,
        deadline: Option<Instant>,
    ) -> RotorResult<ShardOutcome> {
        let mut stats = MonitoredStats::new(&self.config.monitored, self.config.sketch_capacity)?;
        let mut diagnostics = RunDiagnostics::new();
        for index in trials {
            if cancel.is_cancelled() || deadline.is_some_and(|d| Instant::now() >= d) {
                break;
            }
            let mut rng = trial_rng(self.config.seed, index as u64);
            let sample = self.uncertainty.sample(&self.base, &mut rng);
            let result = self.model.evaluate(&sample.op, &sample.perturbation)?;
            diagnostics.record(&result);
            if result.is_valid() {
                stats.record(&result.performance);
            }
        }
        trace!(
            shard,
            attempted = diagnostics.trials_attempted,
            valid = diagnostics.trials_valid,
            "shard finished"
        );
        Ok(ShardOutcome { stats, diagnostics })
    }
}
