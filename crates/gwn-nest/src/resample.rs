use gwn_core::errors::{ErrorInfo, NestError};
use gwn_core::RngHandle;
use rand::seq::SliceRandom;
use tracing::warn;

/// Tolerance on the weight sum before it is renormalised with a warning.
const WEIGHT_SUM_TOLERANCE: f64 = 1.490_116_119_384_765_6e-8;

/// Importance weights `exp(log_weight - log_evidence)` of a chain.
pub fn posterior_weights(log_weight: &[f64], final_log_evidence: f64) -> Vec<f64> {
    log_weight
        .iter()
        .map(|&value| (value - final_log_evidence).exp())
        .collect()
}

/// Systematic resampling of `weights` followed by a shuffle.
///
/// Returns indices into the weighted set; the result has as many entries as
/// there are weights. Weights that do not sum to one are renormalised.
pub fn resample_equal(weights: &[f64], rng: &mut RngHandle) -> Result<Vec<usize>, NestError> {
    let count = weights.len();
    if count == 0 {
        return Ok(Vec::new());
    }
    let total: f64 = weights.iter().sum();
    if !(total.is_finite() && total > 0.0) || weights.iter().any(|w| !(*w >= 0.0)) {
        return Err(NestError::Sampler(
            ErrorInfo::new("resample-weights", "weights must be finite and non-negative with a positive sum")
                .with_context("sum", total.to_string()),
        ));
    }
    if (total - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
        warn!(sum = total, "resample weights do not sum to one; renormalising");
    }

    let mut cumulative = Vec::with_capacity(count);
    let mut running = 0.0;
    for weight in weights {
        running += weight / total;
        cumulative.push(running);
    }
    let offset = rng.uniform();
    let mut indices = Vec::with_capacity(count);
    let mut j = 0;
    for i in 0..count {
        let position = (offset + i as f64) / count as f64;
        while j + 1 < count && position >= cumulative[j] {
            j += 1;
        }
        indices.push(j);
    }
    indices.shuffle(rng.inner_mut());
    Ok(indices)
}

/// Rows of `samples` selected by `indices`.
pub fn select_rows(samples: &[Vec<f64>], indices: &[usize]) -> Vec<Vec<f64>> {
    indices
        .iter()
        .filter_map(|&index| samples.get(index).cloned())
        .collect()
}
