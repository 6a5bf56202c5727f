use gwn_core::errors::{ErrorInfo, NestError};

use crate::dict::{PriorDict, PriorFamily};
use crate::numeric::logspace;
use crate::prior::{DeltaFunction, Gaussian, PriorMeta};

/// Calibration spline prior with a frequency-independent uncertainty.
///
/// Amplitude and phase nodes are zero-mean Gaussians; node frequencies are
/// log-spaced over `[minimum_frequency, maximum_frequency]` and held fixed.
pub fn constant_uncertainty_spline(
    amplitude_sigma: f64,
    phase_sigma: f64,
    minimum_frequency: f64,
    maximum_frequency: f64,
    n_nodes: usize,
    label: &str,
) -> Result<PriorDict, NestError> {
    if !(minimum_frequency > 0.0 && maximum_frequency > minimum_frequency) || n_nodes == 0 {
        return Err(NestError::Bounds(
            ErrorInfo::new("calibration-nodes", "need positive increasing frequencies and at least one node")
                .with_context("minimum_frequency", minimum_frequency.to_string())
                .with_context("maximum_frequency", maximum_frequency.to_string())
                .with_context("n_nodes", n_nodes.to_string()),
        ));
    }
    let nodes = logspace(minimum_frequency.log10(), maximum_frequency.log10(), n_nodes);

    let mut prior = PriorDict::new(PriorFamily::Calibration);
    for ii in 0..n_nodes {
        let name = format!("recalib_{label}_amplitude_{ii}");
        let meta = PriorMeta::named(&name).with_latex_label(format!("$A^{label}_{ii}$"));
        prior.insert(name, Gaussian::new(meta, 0.0, amplitude_sigma)?);
    }
    for ii in 0..n_nodes {
        let name = format!("recalib_{label}_phase_{ii}");
        let meta = PriorMeta::named(&name).with_latex_label(format!("$\\phi^{label}_{ii}$"));
        prior.insert(name, Gaussian::new(meta, 0.0, phase_sigma)?);
    }
    for (ii, &frequency) in nodes.iter().enumerate() {
        let name = format!("recalib_{label}_frequency_{ii}");
        let meta = PriorMeta::named(&name).with_latex_label(format!("$f^{label}_{ii}$"));
        prior.insert(name, DeltaFunction::new(meta, frequency));
    }
    Ok(prior)
}
