use gwn_core::errors::NestError;
use serde::{Deserialize, Serialize};

use crate::float_codec;
use crate::state::{ChainSegment, RunState};

/// Contract of the external nested-sampling engine.
///
/// The engine owns the algorithm; the runner only bounds its bursts and moves
/// its [`RunState`] in and out of checkpoints. Implementations must derive any
/// running accumulators from the state they expose so that a restored state
/// continues exactly where the saved one stopped.
///
/// [`run_nested`](crate::run_nested) builds the engine through a factory that
/// receives the [`SamplerOptions`](crate::SamplerOptions) resolved for the
/// problem's dimension together with the master seed.
pub trait NestedSampler {
    /// Advances until the stopping rule fires or the cumulative call count
    /// reaches `max_calls`. With `add_live` the remaining live points are
    /// folded into the chain at the end. Calling it again after the stopping
    /// rule fired must not make further progress.
    fn run_burst(&mut self, max_calls: Option<u64>, add_live: bool) -> Result<(), NestError>;

    /// Current run state.
    fn state(&self) -> &RunState;

    /// Mutable run state, used to restore from and trim after checkpoints.
    fn state_mut(&mut self) -> &mut RunState;

    /// Cumulative likelihood calls.
    fn call_count(&self) -> u64 {
        self.state().call_count
    }

    /// Final weighted samples of the run.
    fn results(&self) -> SamplerResults {
        SamplerResults::from_run_state(self.state())
    }
}

/// Weighted samples and evidence trace produced by a run.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SamplerResults {
    /// Physical coordinates, one row per dead point.
    #[serde(with = "float_codec::matrix")]
    pub samples: Vec<Vec<f64>>,
    /// Log-likelihood per dead point.
    #[serde(with = "float_codec::vec")]
    pub log_likelihood: Vec<f64>,
    /// Log importance weight per dead point.
    #[serde(with = "float_codec::vec")]
    pub log_weight: Vec<f64>,
    /// Cumulative log-evidence.
    #[serde(with = "float_codec::vec")]
    pub log_evidence: Vec<f64>,
    /// Cumulative log-evidence standard error.
    #[serde(with = "float_codec::vec")]
    pub log_evidence_err: Vec<f64>,
    /// Total likelihood calls.
    pub call_count: u64,
}

impl SamplerResults {
    /// Results read off a fully merged chain.
    pub fn from_run_state(state: &RunState) -> Self {
        let ChainSegment {
            physical,
            log_likelihood,
            log_weight,
            log_evidence,
            log_evidence_variance,
            ..
        } = &state.chain;
        Self {
            samples: physical.clone(),
            log_likelihood: log_likelihood.clone(),
            log_weight: log_weight.clone(),
            log_evidence: log_evidence.clone(),
            log_evidence_err: log_evidence_variance
                .iter()
                .map(|variance| variance.max(0.0).sqrt())
                .collect(),
            call_count: state.call_count,
        }
    }

    /// Final log-evidence, if any point was recorded.
    pub fn final_log_evidence(&self) -> Option<f64> {
        self.log_evidence.last().copied()
    }
}
