use gwn_core::errors::NestError;
use serde::{Deserialize, Serialize};

use crate::float_codec;
use crate::state::{ChainSegment, LiveSet, RunState};

/// Persisted shape of a run: the chain so far, the live set, the counters and
/// an equal-weight posterior resample for crash-safe partial results.
///
/// Field names are flat and stable so checkpoints written by earlier builds
/// stay resumable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CheckpointRecord {
    /// Dead points recorded so far.
    #[serde(flatten)]
    pub chain: ChainSegment,
    /// Live set at the time of the write.
    #[serde(flatten)]
    pub live: LiveSet,
    /// Cumulative likelihood calls.
    pub ncall: u64,
    /// Last completed iteration, one below the run cursor.
    pub iteration: u64,
    /// Equal-weight resample of the physical samples.
    #[serde(with = "float_codec::matrix")]
    pub posterior: Vec<Vec<f64>>,
}

impl CheckpointRecord {
    /// Record holding the whole of `state`, with an empty posterior.
    pub fn capture(state: &RunState) -> Self {
        Self {
            chain: state.chain.clone(),
            live: state.live.clone(),
            ncall: state.call_count,
            iteration: state.cursor.saturating_sub(1),
            posterior: Vec::new(),
        }
    }

    /// Replaces the live set and counters with those of `state`.
    pub fn update_counters(&mut self, state: &RunState) {
        self.live = state.live.clone();
        self.ncall = state.call_count;
        self.iteration = state.cursor.saturating_sub(1);
    }

    /// Fails with a corruption error if any group of parallel arrays is
    /// misaligned.
    pub fn validate(&self) -> Result<(), NestError> {
        self.chain.validate()?;
        self.live.validate()
    }

    /// Overwrites every field of `state` from the record.
    pub fn apply_to(self, state: &mut RunState) {
        state.chain = self.chain;
        state.live = self.live;
        state.call_count = self.ncall;
        state.cursor = self.iteration + 1;
    }
}
