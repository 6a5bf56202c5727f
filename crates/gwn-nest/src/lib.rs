#![deny(missing_docs)]
#![doc = "Nested-sampling runs that checkpoint to disk and resume bit-for-bit after a crash."]

/// Moving run state in and out of checkpoints.
pub mod codec;
/// YAML configuration schema and defaults.
pub mod config;
/// Top-level `run_nested` entry point.
pub mod driver;
/// Serde helpers that keep non-finite floats representable in JSON.
pub mod float_codec;
/// Likelihood interface and the search problem it is explored under.
pub mod problem;
/// Persisted checkpoint record.
pub mod record;
/// Equal-weight posterior resampling.
pub mod resample;
/// Final result assembly and serialization.
pub mod result;
/// Burst loop with checkpoints between bursts.
pub mod runner;
/// Sampler contract and raw sampler output.
pub mod sampler;
/// Chain, live set and run state.
pub mod state;
/// Checkpoint storage backends.
pub mod store;

pub use codec::RunStateCodec;
pub use config::{CheckpointConfig, RunConfig, SamplerOptions, SeedPolicy};
pub use driver::run_nested;
pub use problem::{Likelihood, Parameters, SearchProblem};
pub use record::CheckpointRecord;
pub use result::{NestResult, NestedSamples, ResultAssembler};
pub use runner::{run_without_checkpointing, CheckpointingRunner, RunPhase};
pub use sampler::{NestedSampler, SamplerResults};
pub use state::{ChainElement, ChainSegment, LiveSet, RunState};
pub use store::{CheckpointStore, FileCheckpointStore};
