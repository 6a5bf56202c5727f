use gwn_core::errors::{ErrorInfo, NestError};
use gwn_core::RngHandle;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::labels::LabelTable;
use crate::prior::{Prior, PriorKind};

const MASS: &[&str] = &[
    "mass_1",
    "mass_2",
    "chirp_mass",
    "total_mass",
    "mass_ratio",
    "symmetric_mass_ratio",
];
const SPIN_MAGNITUDE: &[&str] = &["a_1", "a_2"];
const SPIN_AZIMUTH: &[&str] = &["phi_1", "phi_2", "phi_12", "phi_jl"];
const INCLINATION: &[&str] = &["iota", "cos_iota"];
const DISTANCE: &[&str] = &["luminosity_distance", "comoving_distance", "redshift"];
const TILT_1: &[&str] = &["tilt_1", "cos_tilt_1"];
const TILT_2: &[&str] = &["tilt_2", "cos_tilt_2"];
const TIDAL: &[&str] = &["lambda_1", "lambda_2", "lambda_tilde", "delta_lambda"];

/// Parameter groups fully determined by two members.
const TWO_DEGREE_GROUPS: &[&[&str]] = &[MASS, SPIN_MAGNITUDE, SPIN_AZIMUTH];
/// Parameter groups fully determined by one member.
const ONE_DEGREE_GROUPS: &[&[&str]] = &[INCLINATION, DISTANCE, TILT_1, TILT_2];

/// Source family of a prior dictionary; selects the redundancy rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PriorFamily {
    /// No redundancy rules.
    #[default]
    Generic,
    /// Binary black hole parameters.
    BinaryBlackHole,
    /// Binary neutron star parameters, BBH rules plus tidal terms.
    BinaryNeutronStar,
    /// Detector calibration spline nodes.
    Calibration,
}

/// Insertion-ordered mapping from parameter name to prior.
#[derive(Debug, Clone)]
pub struct PriorDict {
    family: PriorFamily,
    priors: IndexMap<String, PriorKind>,
    labels: LabelTable,
}

impl PriorDict {
    /// Empty dictionary of the given family using the gravitational-wave labels.
    pub fn new(family: PriorFamily) -> Self {
        Self::with_labels(family, LabelTable::gravitational_wave())
    }

    /// Empty dictionary with an explicit label table.
    pub fn with_labels(family: PriorFamily, labels: LabelTable) -> Self {
        Self {
            family,
            priors: IndexMap::new(),
            labels,
        }
    }

    /// Family the dictionary was created for.
    pub fn family(&self) -> PriorFamily {
        self.family
    }

    /// Label table used for display.
    pub fn labels(&self) -> &LabelTable {
        &self.labels
    }

    /// Display label of `key`: the prior's own label, then the table, then
    /// the key itself.
    pub fn latex_label<'a>(&'a self, key: &'a str) -> &'a str {
        self.priors
            .get(key)
            .and_then(|prior| prior.meta().latex_label.as_deref())
            .unwrap_or_else(|| self.labels.label_or_name(key))
    }

    /// Registers `prior` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, prior: impl Into<PriorKind>) {
        self.priors.insert(key.into(), prior.into());
    }

    /// Registers `prior` under `key` unless the key is redundant with the
    /// parameters already present.
    pub fn try_insert(
        &mut self,
        key: impl Into<String>,
        prior: impl Into<PriorKind>,
    ) -> Result<(), NestError> {
        let key = key.into();
        if self.test_redundancy(&key) {
            return Err(NestError::Config(
                ErrorInfo::new("redundant-prior", "parameter is already determined by the dictionary")
                    .with_context("key", key),
            ));
        }
        self.insert(key, prior);
        Ok(())
    }

    /// Prior registered under `key`.
    pub fn get(&self, key: &str) -> Option<&PriorKind> {
        self.priors.get(key)
    }

    /// True if `key` is registered.
    pub fn contains(&self, key: &str) -> bool {
        self.priors.contains_key(key)
    }

    /// Number of registered priors.
    pub fn len(&self) -> usize {
        self.priors.len()
    }

    /// True if no prior is registered.
    pub fn is_empty(&self) -> bool {
        self.priors.is_empty()
    }

    /// Keys in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.priors.keys().map(String::as_str)
    }

    /// `(key, prior)` pairs in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &PriorKind)> {
        self.priors.iter().map(|(key, prior)| (key.as_str(), prior))
    }

    /// Keys that are sampled over.
    pub fn search_keys(&self) -> Vec<String> {
        self.priors
            .iter()
            .filter(|(_, prior)| !prior.is_fixed())
            .map(|(key, _)| key.clone())
            .collect()
    }

    /// Keys pinned by a delta function, with their values.
    pub fn fixed_values(&self) -> IndexMap<String, f64> {
        self.priors
            .iter()
            .filter(|(_, prior)| prior.is_fixed())
            .map(|(key, prior)| (key.clone(), prior.rescale(0.5)))
            .collect()
    }

    /// Draws one value per prior.
    pub fn sample(&self, rng: &mut RngHandle) -> IndexMap<String, f64> {
        self.priors
            .iter()
            .map(|(key, prior)| (key.clone(), prior.sample(rng)))
            .collect()
    }

    /// Maps unit-cube values onto the priors registered under `keys`.
    pub fn rescale(&self, keys: &[String], unit: &[f64]) -> Result<Vec<f64>, NestError> {
        if keys.len() != unit.len() {
            return Err(NestError::Config(
                ErrorInfo::new("rescale-shape", "keys and unit-cube values differ in length")
                    .with_context("keys", keys.len().to_string())
                    .with_context("unit", unit.len().to_string()),
            ));
        }
        keys.iter()
            .zip(unit)
            .map(|(key, &value)| Ok(self.require(key)?.rescale(value)))
            .collect()
    }

    /// Sum of log densities of `values` under the priors of `keys`.
    pub fn ln_prob(&self, keys: &[String], values: &[f64]) -> Result<f64, NestError> {
        let mut total = 0.0;
        for (key, &value) in keys.iter().zip(values) {
            total += self.require(key)?.ln_prob(value);
        }
        Ok(total)
    }

    fn require(&self, key: &str) -> Result<&PriorKind, NestError> {
        self.priors.get(key).ok_or_else(|| {
            NestError::Config(
                ErrorInfo::new("missing-prior", "no prior registered for parameter")
                    .with_context("key", key),
            )
        })
    }

    /// True if adding `key` would over-determine a group of parameters the
    /// dictionary already constrains. Keys already present are never
    /// redundant.
    pub fn test_redundancy(&self, key: &str) -> bool {
        if self.contains(key) {
            debug!(key, "already in prior");
            return false;
        }
        match self.family {
            PriorFamily::Generic | PriorFamily::Calibration => false,
            PriorFamily::BinaryBlackHole => self.bbh_redundant(key),
            PriorFamily::BinaryNeutronStar => {
                self.bbh_redundant(key) || self.group_redundant(key, TIDAL, 2)
            }
        }
    }

    fn bbh_redundant(&self, key: &str) -> bool {
        TWO_DEGREE_GROUPS
            .iter()
            .any(|group| self.group_redundant(key, group, 2))
            || ONE_DEGREE_GROUPS
                .iter()
                .any(|group| self.group_redundant(key, group, 1))
    }

    fn group_redundant(&self, key: &str, group: &[&str], degrees: usize) -> bool {
        if !group.contains(&key) {
            return false;
        }
        let present: Vec<&str> = group
            .iter()
            .copied()
            .filter(|name| self.contains(name))
            .collect();
        if present.len() > degrees {
            warn!(?present, "over-determined parameters in prior; this may lead to unexpected behaviour");
        }
        present.len() >= degrees
    }
}

impl Default for PriorDict {
    fn default() -> Self {
        Self::new(PriorFamily::Generic)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prior::{PriorMeta, Uniform};

    fn uniform(name: &str) -> Uniform {
        Uniform::new(PriorMeta::named(name), 0.0, 1.0).unwrap()
    }

    #[test]
    fn generic_dict_is_never_redundant() {
        let mut dict = PriorDict::default();
        dict.insert("mass_1", uniform("mass_1"));
        dict.insert("mass_2", uniform("mass_2"));
        assert!(!dict.test_redundancy("chirp_mass"));
    }

    #[test]
    fn rescale_rejects_unknown_keys() {
        let mut dict = PriorDict::default();
        dict.insert("psi", uniform("psi"));
        let err = dict.rescale(&["ra".to_string()], &[0.5]).unwrap_err();
        assert!(matches!(err, NestError::Config(_)));
        let values = dict.rescale(&["psi".to_string()], &[0.25]).unwrap();
        assert_eq!(values, vec![0.25]);
    }
}
