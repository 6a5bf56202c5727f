#![allow(dead_code)]

use std::cell::Cell;
use std::path::Path;

use gwn_core::{NestError, RngHandle};
use gwn_nest::{
    ChainElement, CheckpointRecord, CheckpointStore, FileCheckpointStore, NestedSampler,
    Parameters, RunState, SamplerOptions, SearchProblem,
};
use gwn_prior::{PriorDict, PriorFamily, PriorMeta, Uniform};

pub const SIGMA: f64 = 0.25;

/// Unnormalised Gaussian centred in the unit square.
pub fn gaussian(parameters: &Parameters) -> f64 {
    parameters
        .values()
        .map(|value| -0.5 * ((value - 0.5) / SIGMA).powi(2))
        .sum()
}

pub type GaussianProblem = SearchProblem<fn(&Parameters) -> f64>;

pub fn problem() -> GaussianProblem {
    let mut priors = PriorDict::new(PriorFamily::Generic);
    for name in ["x", "y"] {
        priors.insert(name, Uniform::new(PriorMeta::named(name), 0.0, 1.0).unwrap());
    }
    SearchProblem::new(gaussian as fn(&Parameters) -> f64, priors, false).unwrap()
}

fn logaddexp(a: f64, b: f64) -> f64 {
    if a == f64::NEG_INFINITY {
        return b;
    }
    if b == f64::NEG_INFINITY {
        return a;
    }
    let max = a.max(b);
    max + ((a - max).exp() + (b - max).exp()).ln()
}

/// Running sums read off the last chain element.
#[derive(Clone, Copy)]
struct Accumulators {
    log_volume: f64,
    log_evidence: f64,
    variance: f64,
    information: f64,
}

impl Accumulators {
    fn from_state(state: &RunState) -> Self {
        match state.chain.last() {
            Some(last) => Self {
                log_volume: last.log_volume,
                log_evidence: last.log_evidence,
                variance: last.log_evidence_variance,
                information: last.information,
            },
            None => Self {
                log_volume: 0.0,
                log_evidence: f64::NEG_INFINITY,
                variance: 0.0,
                information: 0.0,
            },
        }
    }

    fn absorb(&mut self, log_likelihood: f64, log_weight: f64, dlv: f64) {
        let log_evidence = logaddexp(self.log_evidence, log_weight);
        let carried = if self.log_evidence.is_finite() {
            (self.log_evidence - log_evidence).exp() * (self.information + self.log_evidence)
        } else {
            0.0
        };
        let information =
            (log_weight - log_evidence).exp() * log_likelihood + carried - log_evidence;
        self.variance += 2.0 * (information - self.information) * dlv;
        self.log_evidence = log_evidence;
        self.information = information;
    }
}

/// Minimal rejection-sampling nested sampler.
///
/// Every random draw comes from a substream keyed by the iteration and every
/// accumulator is read back from the chain, so the trajectory depends only on
/// the state it is handed.
pub struct ToySampler<'a> {
    problem: &'a GaussianProblem,
    nlive: usize,
    dlogz: f64,
    maxiter: Option<u64>,
    seed: u64,
    state: RunState,
}

impl<'a> ToySampler<'a> {
    pub fn new(problem: &'a GaussianProblem, nlive: usize, dlogz: f64, seed: u64) -> Self {
        Self {
            problem,
            nlive,
            dlogz,
            maxiter: None,
            seed,
            state: RunState::default(),
        }
    }

    /// Sampler configured from resolved run options.
    pub fn from_options(
        problem: &'a GaussianProblem,
        options: &SamplerOptions,
        seed: u64,
    ) -> Result<Self, NestError> {
        let mut sampler = Self::new(problem, options.nlive, options.dlogz, seed);
        sampler.maxiter = options.maxiter;
        Ok(sampler)
    }

    fn draw(&self, rng: &mut RngHandle) -> Result<(Vec<f64>, Vec<f64>, f64), NestError> {
        let unit: Vec<f64> = (0..self.problem.ndim()).map(|_| rng.uniform()).collect();
        let theta = self.problem.prior_transform(&unit)?;
        let log_likelihood = self.problem.log_likelihood(&theta);
        Ok((unit, theta, log_likelihood))
    }

    fn initialise(&mut self) -> Result<(), NestError> {
        let mut rng = RngHandle::substream(self.seed, 0);
        for _ in 0..self.nlive {
            let (unit, theta, log_likelihood) = self.draw(&mut rng)?;
            let live = &mut self.state.live;
            live.unit_cube.push(unit);
            live.physical.push(theta);
            live.log_likelihood.push(log_likelihood);
            live.bound.push(0);
            live.iteration_added.push(0);
        }
        self.state.live.nlive = self.nlive as u64;
        self.state.call_count += self.nlive as u64;
        self.state.cursor = 1;
        Ok(())
    }

    fn converged(&self) -> bool {
        let acc = Accumulators::from_state(&self.state);
        if !acc.log_evidence.is_finite() {
            return false;
        }
        let best = self
            .state
            .live
            .log_likelihood
            .iter()
            .copied()
            .fold(f64::NEG_INFINITY, f64::max);
        let remaining = logaddexp(acc.log_evidence, best + acc.log_volume) - acc.log_evidence;
        remaining < self.dlogz
    }

    fn iterate(&mut self) -> Result<(), NestError> {
        let n = self.nlive as f64;
        let it = self.state.cursor;
        let Some(worst) = self.state.live.worst() else {
            return Ok(());
        };
        let threshold = self.state.live.log_likelihood[worst];

        let mut rng = RngHandle::substream(self.seed, it);
        let mut tries = 0u64;
        let replacement = loop {
            tries += 1;
            let candidate = self.draw(&mut rng)?;
            if candidate.2 > threshold {
                break candidate;
            }
            if tries > 1_000_000 {
                return Err(NestError::Sampler(gwn_core::ErrorInfo::new(
                    "proposal-exhausted",
                    "no point above the likelihood threshold",
                )));
            }
        };

        let mut acc = Accumulators::from_state(&self.state);
        let log_volume = -(it as f64) / n;
        let log_dvol = -((it - 1) as f64) / n + (1.0 - (-1.0 / n).exp()).ln();
        let log_weight = threshold + log_dvol;
        acc.absorb(threshold, log_weight, 1.0 / n);

        let live = &mut self.state.live;
        self.state.chain.push(ChainElement {
            unit_cube: live.unit_cube[worst].clone(),
            physical: live.physical[worst].clone(),
            log_likelihood: threshold,
            log_volume,
            log_weight,
            log_evidence: acc.log_evidence,
            log_evidence_variance: acc.variance,
            information: acc.information,
            id: worst as u64,
            iteration_added: live.iteration_added[worst],
            calls: tries,
            bound_index: 0,
            bound_iteration: 0,
            scale: 1.0,
        });

        let (unit, theta, log_likelihood) = replacement;
        live.unit_cube[worst] = unit;
        live.physical[worst] = theta;
        live.log_likelihood[worst] = log_likelihood;
        live.iteration_added[worst] = it;
        self.state.call_count += tries;
        self.state.cursor += 1;
        Ok(())
    }

    fn add_live_points(&mut self) {
        let n = self.state.live.len();
        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by(|&a, &b| {
            self.state.live.log_likelihood[a].total_cmp(&self.state.live.log_likelihood[b])
        });
        let mut acc = Accumulators::from_state(&self.state);
        let base_volume = acc.log_volume;
        for (rank, index) in order.into_iter().enumerate() {
            let live = &self.state.live;
            let log_likelihood = live.log_likelihood[index];
            let log_weight = log_likelihood + base_volume - (n as f64).ln();
            acc.absorb(log_likelihood, log_weight, 1.0 / n as f64);
            let element = ChainElement {
                unit_cube: live.unit_cube[index].clone(),
                physical: live.physical[index].clone(),
                log_likelihood,
                log_volume: base_volume + ((n - rank) as f64 / (n + 1) as f64).ln(),
                log_weight,
                log_evidence: acc.log_evidence,
                log_evidence_variance: acc.variance,
                information: acc.information,
                id: index as u64,
                iteration_added: live.iteration_added[index],
                calls: 0,
                bound_index: 0,
                bound_iteration: 0,
                scale: 1.0,
            };
            self.state.chain.push(element);
            self.state.cursor += 1;
        }
        self.state.live.added_live = true;
    }
}

impl NestedSampler for ToySampler<'_> {
    fn run_burst(&mut self, max_calls: Option<u64>, add_live: bool) -> Result<(), NestError> {
        if self.state.live.added_live {
            return Ok(());
        }
        if self.state.live.is_empty() {
            self.initialise()?;
        }
        loop {
            if self.converged() {
                break;
            }
            if self
                .maxiter
                .is_some_and(|maxiter| self.state.cursor > maxiter)
            {
                break;
            }
            if max_calls.is_some_and(|cap| self.state.call_count >= cap) {
                break;
            }
            self.iterate()?;
        }
        if add_live {
            self.add_live_points();
        }
        Ok(())
    }

    fn state(&self) -> &RunState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }
}

/// Sampler that never makes a likelihood call.
pub struct StalledSampler {
    pub state: RunState,
    pub bursts: usize,
}

impl StalledSampler {
    pub fn new(call_count: u64) -> Self {
        Self {
            state: RunState {
                call_count,
                ..RunState::default()
            },
            bursts: 0,
        }
    }
}

impl NestedSampler for StalledSampler {
    fn run_burst(&mut self, _max_calls: Option<u64>, _add_live: bool) -> Result<(), NestError> {
        self.bursts += 1;
        Ok(())
    }

    fn state(&self) -> &RunState {
        &self.state
    }

    fn state_mut(&mut self) -> &mut RunState {
        &mut self.state
    }
}

/// File store that counts its writes.
#[derive(Default)]
pub struct CountingStore {
    inner: FileCheckpointStore,
    pub saves: Cell<usize>,
}

impl CheckpointStore for CountingStore {
    fn exists(&self, path: &Path) -> bool {
        self.inner.exists(path)
    }

    fn load(&self, path: &Path) -> Result<Option<CheckpointRecord>, NestError> {
        self.inner.load(path)
    }

    fn save(&self, path: &Path, record: &CheckpointRecord) -> Result<(), NestError> {
        self.saves.set(self.saves.get() + 1);
        self.inner.save(path, record)
    }

    fn delete(&self, path: &Path) -> Result<(), NestError> {
        self.inner.delete(path)
    }
}

/// Chain element with distinct, recognisable values.
pub fn element(index: u64) -> ChainElement {
    ChainElement {
        unit_cube: vec![0.01 * index as f64, 0.5],
        physical: vec![index as f64, 0.25],
        log_likelihood: -10.0 + index as f64,
        log_volume: -(index as f64) / 16.0,
        log_weight: -12.0 + 0.5 * index as f64,
        log_evidence: -11.0 + 0.1 * index as f64,
        log_evidence_variance: 0.01 * index as f64,
        information: 0.1 * index as f64,
        id: index % 16,
        iteration_added: index,
        calls: 1 + index,
        bound_index: 0,
        bound_iteration: index,
        scale: 1.0,
    }
}

/// State whose pending chain holds elements `from..to`.
pub fn state_with(from: u64, to: u64, call_count: u64) -> RunState {
    let mut state = RunState {
        call_count,
        cursor: to,
        ..RunState::default()
    };
    for index in from..to {
        state.chain.push(element(index));
    }
    state.live.unit_cube.push(vec![0.5, 0.5]);
    state.live.physical.push(vec![0.5, 0.5]);
    state.live.log_likelihood.push(0.0);
    state.live.bound.push(0);
    state.live.iteration_added.push(to);
    state.live.nlive = 1;
    state
}
