mod common;

use common::{problem, CountingStore, StalledSampler, ToySampler};
use gwn_nest::{
    run_without_checkpointing, CheckpointingRunner, FileCheckpointStore, NestedSampler,
    RunPhase, RunStateCodec,
};
use tempfile::tempdir;

const NLIVE: usize = 16;
const DLOGZ: f64 = 0.05;
const SEED: u64 = 20_151_026;

#[test]
fn stalled_sampler_ends_loop_without_saving() {
    let dir = tempdir().unwrap();
    let store = CountingStore::default();
    let codec = RunStateCodec::new(&store, dir.path().join("stall_resume.json"), SEED);
    let mut runner = CheckpointingRunner::new(codec, 10);
    let mut sampler = StalledSampler::new(5);

    runner.sample(&mut sampler).unwrap();
    assert_eq!(store.saves.get(), 0);
    assert_eq!(sampler.bursts, 1);
    assert!(!runner.codec().exists());

    runner.finalize(&mut sampler).unwrap();
    assert_eq!(runner.phase(), RunPhase::Finished);
    assert_eq!(store.saves.get(), 0);
}

#[test]
fn run_checkpoints_between_bursts_and_cleans_up() {
    let dir = tempdir().unwrap();
    let store = CountingStore::default();
    let path = dir.path().join("toy_resume.json");
    let problem = problem();
    let mut sampler = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let mut runner = CheckpointingRunner::new(RunStateCodec::new(&store, &path, SEED), 100);
    assert_eq!(runner.phase(), RunPhase::Fresh);

    let results = runner.run(&mut sampler).unwrap();
    assert!(store.saves.get() >= 2);
    assert!(!path.exists());
    assert_eq!(runner.phase(), RunPhase::Finished);
    assert!(sampler.state().live.added_live);
    assert_eq!(results.samples.len(), sampler.state().chain.len());
    assert_eq!(results.call_count, sampler.call_count());
    let log_z = results.final_log_evidence().unwrap();
    // Evidence of a unit-peak Gaussian with sigma 0.25 over the unit square.
    let expected = (2.0 * std::f64::consts::PI * 0.25f64.powi(2)).ln();
    assert!((log_z - expected).abs() < 1.0, "log_z = {log_z}");
}

#[test]
fn finalize_twice_is_harmless() {
    let dir = tempdir().unwrap();
    let problem = problem();
    let mut sampler = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let codec = RunStateCodec::new(FileCheckpointStore, dir.path().join("twice.json"), SEED);
    let mut runner = CheckpointingRunner::new(codec, 250);

    let first = runner.run(&mut sampler).unwrap();
    runner.finalize(&mut sampler).unwrap();
    assert_eq!(sampler.results(), first);
    assert!(!runner.codec().exists());
}

#[test]
fn interrupted_run_resumes_to_identical_results() {
    let problem = problem();

    let reference_dir = tempdir().unwrap();
    let mut reference = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let expected = CheckpointingRunner::new(
        RunStateCodec::new(FileCheckpointStore, reference_dir.path().join("a.json"), SEED),
        150,
    )
    .run(&mut reference)
    .unwrap();

    let dir = tempdir().unwrap();
    let path = dir.path().join("b.json");
    {
        // Stops at the call cap and never finalizes, as if the process died.
        let mut doomed = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
        let mut runner = CheckpointingRunner::new(
            RunStateCodec::new(FileCheckpointStore, &path, SEED),
            70,
        )
        .with_max_calls(Some(expected.call_count / 3));
        runner.sample(&mut doomed).unwrap();
        assert!(doomed.call_count() < expected.call_count);
    }
    assert!(path.exists());

    let mut revived = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let mut runner = CheckpointingRunner::new(
        RunStateCodec::new(FileCheckpointStore, &path, SEED),
        150,
    );
    assert!(runner.resume_from_checkpoint(&mut revived).unwrap());
    assert_eq!(runner.phase(), RunPhase::Resuming);
    assert!(path.exists());
    runner.sample(&mut revived).unwrap();
    runner.finalize(&mut revived).unwrap();

    assert_eq!(revived.results(), expected);
    assert!(!path.exists());
}

#[test]
fn resume_disabled_ignores_existing_checkpoint() {
    let problem = problem();
    let dir = tempdir().unwrap();
    let path = dir.path().join("stale.json");
    {
        let mut doomed = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
        CheckpointingRunner::new(RunStateCodec::new(FileCheckpointStore, &path, SEED), 40)
            .with_max_calls(Some(60))
            .sample(&mut doomed)
            .unwrap();
    }
    assert!(path.exists());

    let mut fresh = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let results =
        CheckpointingRunner::new(RunStateCodec::new(FileCheckpointStore, &path, SEED), 40)
            .with_resume(false)
            .run(&mut fresh)
            .unwrap();

    let mut plain = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    assert_eq!(results, run_without_checkpointing(&mut plain, None).unwrap());
    assert!(!path.exists());
}

#[test]
fn plain_run_matches_checkpointed_run() {
    let problem = problem();
    let dir = tempdir().unwrap();
    let mut checkpointed = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let expected = CheckpointingRunner::new(
        RunStateCodec::new(FileCheckpointStore, dir.path().join("c.json"), SEED),
        90,
    )
    .run(&mut checkpointed)
    .unwrap();

    let mut plain = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let results = run_without_checkpointing(&mut plain, None).unwrap();
    assert_eq!(results, expected);
}

#[test]
fn interval_shorter_than_initialisation_keeps_every_dead_point() {
    let problem = problem();
    let dir = tempdir().unwrap();
    // The first burst is spent drawing the live set and saves an empty chain.
    let mut checkpointed = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let expected = CheckpointingRunner::new(
        RunStateCodec::new(FileCheckpointStore, dir.path().join("c.json"), SEED),
        10,
    )
    .run(&mut checkpointed)
    .unwrap();

    let mut plain = ToySampler::new(&problem, NLIVE, DLOGZ, SEED);
    let results = run_without_checkpointing(&mut plain, None).unwrap();
    assert_eq!(results.samples.len(), expected.samples.len());
    assert_eq!(results, expected);
}
