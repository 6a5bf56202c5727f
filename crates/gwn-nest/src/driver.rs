use gwn_core::errors::NestError;
use gwn_core::RngHandle;
use tracing::{debug, info};

use crate::codec::RunStateCodec;
use crate::config::{RunConfig, SamplerOptions};
use crate::problem::{Likelihood, SearchProblem};
use crate::result::{NestResult, ResultAssembler};
use crate::runner::{run_without_checkpointing, CheckpointingRunner};
use crate::sampler::NestedSampler;
use crate::store::FileCheckpointStore;

/// Prior draws timed to estimate the cost of one likelihood call.
const EVAL_TIME_DRAWS: usize = 10;

/// Substream of the master seed reserved for the timing draws.
const EVAL_TIME_SUBSTREAM: u64 = u64::MAX;

/// Builds a sampler for `problem` through `build` and runs it as configured,
/// checkpointing to `{outdir}/{label}_resume.json` when enabled, then writes
/// the assembled result to `{outdir}/{label}_result.json`.
///
/// `build` receives the problem, which supplies the likelihood, the prior
/// transform and the dimensionality, together with the sampler options
/// resolved for that dimensionality and the master seed.
pub fn run_nested<'p, N, L, B>(
    problem: &'p SearchProblem<L>,
    config: &RunConfig,
    build: B,
) -> Result<NestResult, NestError>
where
    N: NestedSampler,
    L: Likelihood,
    B: FnOnce(&'p SearchProblem<L>, &SamplerOptions, u64) -> Result<N, NestError>,
{
    config.validate()?;
    let seed = config.seed_policy.master_seed;
    let options = config.sampler.resolve(problem.ndim());
    debug!(?options, ndim = problem.ndim(), "sampler options");
    let mut sampler = build(problem, &options, seed)?;

    let eval_time = if config.checkpoint.enabled && config.checkpoint.n_check_point.is_none() {
        let mut rng = RngHandle::substream(seed, EVAL_TIME_SUBSTREAM);
        problem.measure_likelihood_eval_time(&mut rng, EVAL_TIME_DRAWS)?
    } else {
        f64::NAN
    };

    let max_calls = config.sampler.maxcall;
    let results = match config.checkpoint_interval(eval_time) {
        Some(interval) => {
            info!(
                interval,
                path = %config.resume_path().display(),
                "checkpointing enabled"
            );
            let codec = RunStateCodec::new(FileCheckpointStore, config.resume_path(), seed);
            CheckpointingRunner::new(codec, interval)
                .with_resume(config.checkpoint.resume)
                .with_max_calls(max_calls)
                .run(&mut sampler)?
        }
        None => run_without_checkpointing(&mut sampler, max_calls)?,
    };

    let result = ResultAssembler::for_problem(problem, config.label.clone(), seed)
        .with_seed_label(config.seed_policy.label.clone())
        .assemble(&results)?;
    result.write(&config.result_path())?;
    info!(path = %config.result_path().display(), "result written");
    Ok(result)
}
