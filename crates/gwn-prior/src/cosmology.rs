use std::fmt;

use gwn_core::errors::{ErrorInfo, NestError};
use serde::{Deserialize, Serialize};

use crate::numeric::{bisect_increasing, simpson};

/// Speed of light in km/s.
pub const SPEED_OF_LIGHT_KM_S: f64 = 299_792.458;

/// Upper end of the redshift bracket searched when inverting a distance.
pub const MAX_INVERSION_REDSHIFT: f64 = 1000.0;

const INTEGRATION_PANELS: usize = 256;

/// Distance measures that can be inverted back to redshift.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DistanceKind {
    /// Luminosity distance in Mpc.
    Luminosity,
    /// Line-of-sight comoving distance in Mpc.
    Comoving,
}

/// Call contract of a cosmological model.
pub trait Cosmology: fmt::Debug + Send + Sync {
    /// Name of the model, e.g. `Planck15`.
    fn name(&self) -> &str;

    /// Luminosity distance at redshift `z`, in Mpc.
    fn luminosity_distance(&self, z: f64) -> f64;

    /// Comoving distance at redshift `z`, in Mpc.
    fn comoving_distance(&self, z: f64) -> f64;

    /// Differential comoving volume `dV_c / dz / dΩ` at redshift `z`, in Mpc³/sr.
    fn differential_comoving_volume(&self, z: f64) -> f64;

    /// Evaluates the requested distance measure at redshift `z`.
    fn distance(&self, kind: DistanceKind, z: f64) -> f64 {
        match kind {
            DistanceKind::Luminosity => self.luminosity_distance(z),
            DistanceKind::Comoving => self.comoving_distance(z),
        }
    }

    /// Inverts a distance measure, returning the redshift at which it equals `value`.
    fn redshift_at(&self, kind: DistanceKind, value: f64) -> Result<f64, NestError> {
        bisect_increasing(|z| self.distance(kind, z), value, 0.0, MAX_INVERSION_REDSHIFT).map_err(
            |err| {
                NestError::Numeric(
                    ErrorInfo::new("redshift-inversion", err.info().message.clone())
                        .with_context("cosmology", self.name())
                        .with_context("kind", format!("{kind:?}"))
                        .with_context("value", value.to_string()),
                )
            },
        )
    }
}

/// Flat ΛCDM cosmology without radiation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlatLambdaCdm {
    /// Model name.
    pub name: String,
    /// Hubble constant in km/s/Mpc.
    pub h0: f64,
    /// Matter density today in units of the critical density.
    pub om0: f64,
}

impl FlatLambdaCdm {
    /// Builds a named flat ΛCDM model.
    pub fn new(name: impl Into<String>, h0: f64, om0: f64) -> Result<Self, NestError> {
        if !(h0 > 0.0 && h0.is_finite()) || !(0.0..=1.0).contains(&om0) {
            return Err(NestError::Config(
                ErrorInfo::new("cosmology-parameters", "H0 must be positive and Om0 in [0, 1]")
                    .with_context("h0", h0.to_string())
                    .with_context("om0", om0.to_string()),
            ));
        }
        Ok(Self {
            name: name.into(),
            h0,
            om0,
        })
    }

    /// Planck 2015 parameters.
    pub fn planck15() -> Self {
        Self {
            name: "Planck15".to_string(),
            h0: 67.74,
            om0: 0.3075,
        }
    }

    /// Hubble distance `c / H0` in Mpc.
    pub fn hubble_distance(&self) -> f64 {
        SPEED_OF_LIGHT_KM_S / self.h0
    }

    /// Dimensionless Hubble parameter `E(z)`.
    pub fn efunc(&self, z: f64) -> f64 {
        let zp1 = 1.0 + z;
        (self.om0 * zp1 * zp1 * zp1 + (1.0 - self.om0)).sqrt()
    }

    /// `∫_0^z dz' / E(z')`, evaluated in `u = (1 + z)^{-1/2}` where the
    /// integrand `2 / sqrt(Om0 + (1 - Om0) u^6)` is smooth and bounded.
    fn comoving_integral(&self, z: f64) -> f64 {
        if z <= 0.0 {
            return 0.0;
        }
        let lower = (1.0 + z).powf(-0.5);
        let ode0 = 1.0 - self.om0;
        simpson(
            |u| 2.0 / (self.om0 + ode0 * u.powi(6)).sqrt(),
            lower,
            1.0,
            INTEGRATION_PANELS,
        )
    }
}

impl Default for FlatLambdaCdm {
    fn default() -> Self {
        Self::planck15()
    }
}

impl Cosmology for FlatLambdaCdm {
    fn name(&self) -> &str {
        &self.name
    }

    fn luminosity_distance(&self, z: f64) -> f64 {
        (1.0 + z) * self.comoving_distance(z)
    }

    fn comoving_distance(&self, z: f64) -> f64 {
        self.hubble_distance() * self.comoving_integral(z)
    }

    fn differential_comoving_volume(&self, z: f64) -> f64 {
        let dc = self.comoving_distance(z);
        self.hubble_distance() * dc * dc / self.efunc(z)
    }
}

/// Serializable selection of a cosmology: a preset name or explicit parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CosmologySpec {
    /// One of the built-in presets.
    Named(String),
    /// Explicit flat ΛCDM parameters.
    Custom {
        /// Hubble constant in km/s/Mpc.
        h0: f64,
        /// Matter density parameter.
        om0: f64,
    },
}

impl CosmologySpec {
    /// Resolves the name or explicit parameters into a concrete model.
    pub fn resolve(&self) -> Result<FlatLambdaCdm, NestError> {
        match self {
            CosmologySpec::Named(name) => get_cosmology(Some(name)),
            CosmologySpec::Custom { h0, om0 } => FlatLambdaCdm::new("FlatLambdaCDM", *h0, *om0),
        }
    }
}

/// Returns the named preset, or `Planck15` when `name` is `None`.
pub fn get_cosmology(name: Option<&str>) -> Result<FlatLambdaCdm, NestError> {
    let Some(name) = name else {
        return Ok(FlatLambdaCdm::planck15());
    };
    let (h0, om0) = match name {
        "Planck15" => return Ok(FlatLambdaCdm::planck15()),
        "Planck13" => (67.77, 0.30712),
        "WMAP9" => (69.32, 0.2865),
        "WMAP7" => (70.4, 0.272),
        "WMAP5" => (70.2, 0.277),
        other => {
            return Err(NestError::Coordinate(
                ErrorInfo::new("unknown-cosmology", format!("cosmology {other} not recognised"))
                    .with_hint("use one of Planck15, Planck13, WMAP9, WMAP7, WMAP5"),
            ))
        }
    };
    FlatLambdaCdm::new(name, h0, om0)
}
