mod common;

use common::{problem, ToySampler};
use gwn_nest::{run_nested, NestResult, Parameters, RunConfig, SamplerOptions, SearchProblem};
use gwn_prior::{PriorDict, PriorFamily, PriorMeta, Uniform};
use tempfile::tempdir;

fn config(outdir: &std::path::Path, n_check_point: Option<u64>) -> RunConfig {
    let mut config = RunConfig {
        outdir: outdir.to_path_buf(),
        label: "toy".to_string(),
        ..RunConfig::default()
    };
    config.sampler.nlive = 16;
    config.sampler.dlogz = 0.05;
    config.checkpoint.n_check_point = n_check_point;
    config.seed_policy.master_seed = 7;
    config.seed_policy.label = Some("toy-seed".to_string());
    config
}

/// Results compared through their JSON form, where NaN equals NaN.
fn as_json(result: &NestResult) -> serde_json::Value {
    serde_json::to_value(result).unwrap()
}

#[test]
fn writes_result_and_removes_checkpoint() {
    let dir = tempdir().unwrap();
    let problem = problem();
    let config = config(dir.path(), Some(120));
    let result = run_nested(&problem, &config, ToySampler::from_options).unwrap();
    assert!(!config.resume_path().exists());
    assert_eq!(
        as_json(&NestResult::load(&config.result_path()).unwrap()),
        as_json(&result)
    );

    assert_eq!(result.label, "toy");
    assert_eq!(result.search_parameter_keys, vec!["x", "y"]);
    assert_eq!(result.seed_label.as_deref(), Some("toy-seed"));
    assert_eq!(result.posterior.len(), result.nested_samples.samples.len());
    assert_eq!(
        result.log_likelihood_evaluations.len(),
        result.posterior.len()
    );
    assert!(result.log_noise_evidence.is_nan());
    assert!(result.log_bayes_factor.is_nan());
    assert!(result.log_evidence_err > 0.0);
    for row in &result.posterior {
        assert!(row.iter().all(|value| (0.0..=1.0).contains(value)));
    }
}

#[test]
fn disabled_checkpointing_gives_the_same_result() {
    let problem = problem();
    let with_dir = tempdir().unwrap();
    let checkpointed =
        run_nested(&problem, &config(with_dir.path(), Some(75)), ToySampler::from_options)
            .unwrap();

    let without_dir = tempdir().unwrap();
    let mut plain_config = config(without_dir.path(), None);
    plain_config.checkpoint.enabled = false;
    let plain = run_nested(&problem, &plain_config, ToySampler::from_options).unwrap();

    assert_eq!(as_json(&plain), as_json(&checkpointed));
}

struct WithNoise;

impl gwn_nest::Likelihood for WithNoise {
    fn log_likelihood(&self, parameters: &Parameters) -> f64 {
        -parameters["x"].powi(2)
    }

    fn noise_log_likelihood(&self) -> f64 {
        -3.0
    }
}

#[test]
fn ratio_runs_report_bayes_factor_against_noise() {
    let mut priors = PriorDict::new(PriorFamily::Generic);
    priors.insert("x", Uniform::new(PriorMeta::named("x"), -1.0, 1.0).unwrap());
    let ratio = SearchProblem::new(WithNoise, priors, true).unwrap();
    assert_eq!(ratio.log_likelihood(&[0.5]), -0.25 + 3.0);

    let toy = problem();
    let dir = tempdir().unwrap();
    let base = run_nested(&toy, &config(dir.path(), Some(100)), ToySampler::from_options).unwrap();

    let assembler = gwn_nest::ResultAssembler::for_problem(&ratio, "ratio", 7);
    let raw = gwn_nest::SamplerResults {
        samples: base.nested_samples.samples.clone(),
        log_likelihood: base.nested_samples.log_likelihood.clone(),
        log_weight: base
            .nested_samples
            .weights
            .iter()
            .map(|weight| weight.ln() + base.log_evidence)
            .collect(),
        log_evidence: vec![base.log_evidence],
        log_evidence_err: vec![base.log_evidence_err],
        call_count: base.call_count,
    };
    let result = assembler.assemble(&raw).unwrap();
    assert_eq!(result.log_bayes_factor, base.log_evidence);
    assert_eq!(result.log_evidence, base.log_evidence - 3.0);
    assert_eq!(result.log_noise_evidence, -3.0);
}

#[test]
fn empty_sampler_output_is_rejected() {
    let toy = problem();
    let assembler = gwn_nest::ResultAssembler::for_problem(&toy, "empty", 1);
    let err = assembler
        .assemble(&gwn_nest::SamplerResults::default())
        .unwrap_err();
    assert_eq!(err.info().code, "empty-results");
}

#[test]
fn sampler_receives_options_resolved_for_the_problem() {
    let toy = problem();
    let dir = tempdir().unwrap();
    let mut config = config(dir.path(), Some(60));
    config.sampler.maxiter = Some(5);
    let mut seen: Option<(SamplerOptions, u64)> = None;

    let result = run_nested(&toy, &config, |problem, options: &SamplerOptions, seed| {
        seen = Some((options.clone(), seed));
        ToySampler::from_options(problem, options, seed)
    })
    .unwrap();

    let (options, seed) = seen.unwrap();
    assert_eq!(seed, 7);
    assert_eq!(options.nlive, 16);
    assert_eq!(options.walks, Some(10));
    assert_eq!(options.update_interval, Some(9));
    // Five dead points, then the sixteen live points folded in.
    assert_eq!(result.nested_samples.samples.len(), 21);
}

#[test]
fn invalid_config_fails_before_building_a_sampler() {
    let toy = problem();
    let dir = tempdir().unwrap();
    let mut config = config(dir.path(), None);
    config.sampler.nlive = 0;
    let mut built = false;
    let err = run_nested(&toy, &config, |problem, options: &SamplerOptions, seed| {
        built = true;
        ToySampler::from_options(problem, options, seed)
    })
    .unwrap_err();
    assert_eq!(err.info().code, "nlive-zero");
    assert!(!built);
}

#[test]
fn measured_checkpoint_interval_gives_the_same_result() {
    let toy = problem();
    let timed_dir = tempdir().unwrap();
    let timed = run_nested(&toy, &config(timed_dir.path(), None), ToySampler::from_options).unwrap();

    let plain_dir = tempdir().unwrap();
    let mut plain_config = config(plain_dir.path(), None);
    plain_config.checkpoint.enabled = false;
    let plain = run_nested(&toy, &plain_config, ToySampler::from_options).unwrap();

    assert_eq!(as_json(&timed), as_json(&plain));
    assert!(!timed_dir.path().join("toy_resume.json").exists());

    let mut rng = gwn_core::RngHandle::substream(7, 1);
    let seconds = toy.measure_likelihood_eval_time(&mut rng, 50).unwrap();
    assert!(seconds.is_nan() || seconds > 0.0);
}
