use gwn_core::errors::NestError;
use tracing::{debug, info, warn};

use crate::codec::RunStateCodec;
use crate::sampler::{NestedSampler, SamplerResults};
use crate::store::CheckpointStore;

/// Where a checkpointed run currently stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    /// Nothing has happened yet.
    Fresh,
    /// Looking for a checkpoint to continue from.
    Resuming,
    /// Running bounded bursts with a checkpoint after each.
    Sampling,
    /// Folding the last checkpoint back in and draining the live set.
    Finalizing,
    /// The run completed and its checkpoint is gone.
    Finished,
}

/// Drives a sampler in call-bounded bursts, checkpointing between them.
#[derive(Debug)]
pub struct CheckpointingRunner<S> {
    codec: RunStateCodec<S>,
    interval: u64,
    resume: bool,
    max_calls: Option<u64>,
    phase: RunPhase,
}

impl<S: CheckpointStore> CheckpointingRunner<S> {
    /// Runner adding `interval` calls to the burst cap per checkpoint.
    pub fn new(codec: RunStateCodec<S>, interval: u64) -> Self {
        Self {
            codec,
            interval: interval.max(1),
            resume: true,
            max_calls: None,
            phase: RunPhase::Fresh,
        }
    }

    /// Whether an existing checkpoint is picked up.
    pub fn with_resume(mut self, resume: bool) -> Self {
        self.resume = resume;
        self
    }

    /// Overall call cap of the run; bursts never exceed it.
    pub fn with_max_calls(mut self, max_calls: Option<u64>) -> Self {
        self.max_calls = max_calls;
        self
    }

    /// Current phase.
    pub fn phase(&self) -> RunPhase {
        self.phase
    }

    /// Codec used for checkpoints.
    pub fn codec(&self) -> &RunStateCodec<S> {
        &self.codec
    }

    /// Runs to completion: optional resume, bursts until no progress, then
    /// finalization. With resume disabled a leftover checkpoint is removed
    /// first so it cannot be merged into the new chain.
    pub fn run<N: NestedSampler>(&mut self, sampler: &mut N) -> Result<SamplerResults, NestError> {
        debug!(interval = self.interval, "running sampler with checkpointing");
        if self.resume {
            self.resume_from_checkpoint(sampler)?;
        } else if self.codec.exists() {
            warn!(path = %self.codec.path().display(), "discarding checkpoint, resume disabled");
            self.codec.delete()?;
        }
        self.sample(sampler)?;
        self.finalize(sampler)?;
        Ok(sampler.results())
    }

    /// Restores and immediately re-persists any existing checkpoint.
    pub fn resume_from_checkpoint<N: NestedSampler>(
        &mut self,
        sampler: &mut N,
    ) -> Result<bool, NestError> {
        self.phase = RunPhase::Resuming;
        let resumed = self.codec.restore(sampler.state_mut(), true)?;
        if resumed {
            info!(ncall = sampler.call_count(), "resuming from previous run");
        }
        Ok(resumed)
    }

    /// Burst loop. Each burst may use `interval` more calls than the last
    /// one ended with; a burst that makes no calls ends the loop without a
    /// checkpoint.
    pub fn sample<N: NestedSampler>(&mut self, sampler: &mut N) -> Result<(), NestError> {
        self.phase = RunPhase::Sampling;
        let mut old_ncall = sampler.call_count();
        let mut cap = old_ncall;
        loop {
            cap = cap.saturating_add(self.interval);
            if let Some(max_calls) = self.max_calls {
                cap = cap.min(max_calls);
            }
            sampler.run_burst(Some(cap), false)?;
            let ncall = sampler.call_count();
            if ncall == old_ncall {
                debug!(ncall, "no progress in burst");
                break;
            }
            old_ncall = ncall;
            self.codec.merge_and_persist(sampler.state_mut())?;
        }
        Ok(())
    }

    /// Folds the last checkpoint back in, drains the live set and removes the
    /// checkpoint. A second call after the run finished does nothing.
    pub fn finalize<N: NestedSampler>(&mut self, sampler: &mut N) -> Result<(), NestError> {
        if self.phase == RunPhase::Finished {
            debug!("run already finalized");
            return Ok(());
        }
        self.phase = RunPhase::Finalizing;
        self.codec.restore(sampler.state_mut(), false)?;
        sampler.run_burst(self.max_calls, true)?;
        self.codec.delete()?;
        self.phase = RunPhase::Finished;
        info!(
            ncall = sampler.call_count(),
            chain = sampler.state().chain.len(),
            "sampling finished"
        );
        Ok(())
    }
}

/// Runs `sampler` to completion without checkpoints.
pub fn run_without_checkpointing<N: NestedSampler>(
    sampler: &mut N,
    max_calls: Option<u64>,
) -> Result<SamplerResults, NestError> {
    debug!("running sampler without checkpointing");
    sampler.run_burst(max_calls, true)?;
    Ok(sampler.results())
}
