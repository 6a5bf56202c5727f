use std::path::{Path, PathBuf};

use gwn_core::errors::NestError;
use gwn_core::RngHandle;
use tracing::{info, warn};

use crate::record::CheckpointRecord;
use crate::resample::{posterior_weights, resample_equal, select_rows};
use crate::state::RunState;
use crate::store::CheckpointStore;

/// Moves run state between the sampler and a checkpoint store.
///
/// The in-memory chain is a pending segment whose first element is the
/// carry-over of the previous write, so a merge into a non-empty stored chain
/// appends from index 1. A write that stored no element leaves no carry-over.
#[derive(Debug, Clone)]
pub struct RunStateCodec<S> {
    store: S,
    path: PathBuf,
    seed: u64,
}

impl<S: CheckpointStore> RunStateCodec<S> {
    /// Codec writing to `path` through `store`; `seed` drives the posterior
    /// resample stored with each checkpoint.
    pub fn new(store: S, path: impl Into<PathBuf>, seed: u64) -> Self {
        Self {
            store,
            path: path.into(),
            seed,
        }
    }

    /// Location of the checkpoint artifact.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Underlying store.
    pub fn store(&self) -> &S {
        &self.store
    }

    /// True if a checkpoint artifact is present.
    pub fn exists(&self) -> bool {
        self.store.exists(&self.path)
    }

    /// Removes the checkpoint artifact, if any.
    pub fn delete(&self) -> Result<(), NestError> {
        self.store.delete(&self.path)
    }

    /// Folds the pending segment of `state` into the stored record, writes it,
    /// then trims the in-memory chain to its last element.
    pub fn merge_and_persist(&self, state: &mut RunState) -> Result<(), NestError> {
        let mut record = match self.store.load(&self.path)? {
            Some(mut record) => {
                // An empty stored chain has no carry-over to skip.
                let from = usize::from(!record.chain.is_empty());
                record.chain.extend_from(&state.chain, from);
                record.update_counters(state);
                record
            }
            None => CheckpointRecord::capture(state),
        };
        record.posterior = self.posterior(&record);
        self.store.save(&self.path, &record)?;
        info!(
            ncall = record.ncall,
            iteration = record.iteration,
            chain = record.chain.len(),
            path = %self.path.display(),
            "checkpoint written"
        );
        state.chain.retain_last();
        Ok(())
    }

    /// Replaces `state` with the stored record and removes the artifact.
    /// Returns `false` when there is nothing to restore. With `continuing`
    /// the restored state is immediately written back so a checkpoint exists
    /// for as long as the run is active.
    pub fn restore(&self, state: &mut RunState, continuing: bool) -> Result<bool, NestError> {
        let Some(record) = self.store.load(&self.path)? else {
            return Ok(false);
        };
        info!(
            ncall = record.ncall,
            iteration = record.iteration,
            chain = record.chain.len(),
            continuing,
            "restored run state from checkpoint"
        );
        record.apply_to(state);
        self.store.delete(&self.path)?;
        if continuing {
            self.merge_and_persist(state)?;
        }
        Ok(true)
    }

    /// Partial posterior stored alongside the chain. A chain whose weights
    /// cannot be resampled yet gets an empty posterior rather than failing
    /// the write.
    fn posterior(&self, record: &CheckpointRecord) -> Vec<Vec<f64>> {
        let Some(&final_log_evidence) = record.chain.log_evidence.last() else {
            return Vec::new();
        };
        let weights = posterior_weights(&record.chain.log_weight, final_log_evidence);
        let mut rng = RngHandle::substream(self.seed, record.ncall);
        match resample_equal(&weights, &mut rng) {
            Ok(indices) => select_rows(&record.chain.physical, &indices),
            Err(err) => {
                warn!(error = %err, "skipping partial posterior");
                Vec::new()
            }
        }
    }
}
