#![deny(missing_docs)]
#![doc = "Cosmology-aware priors and the prior dictionary consumed by the nested-sampling runner."]

/// Priors that are products of simpler priors.
pub mod spin;
/// Detector calibration priors.
pub mod calibration;
/// Uniform-in-comoving-volume priors in redshift and distance coordinates.
pub mod cosmological;
/// Flat ΛCDM distance relations and named presets.
pub mod cosmology;
/// Ordered dictionary of priors with redundancy checks.
pub mod dict;
/// Tabulated densities.
pub mod interped;
/// Display labels for parameters.
pub mod labels;
/// Grid, quadrature and interpolation helpers.
pub mod numeric;
/// Prior capability interface and leaf priors.
pub mod prior;

pub use calibration::constant_uncertainty_spline;
pub use cosmological::{
    BoundEdge, CosmologicalOptions, CosmologicalPrior, Coordinate, CoordinateRange,
    DistanceBounds, UniformComovingVolume,
};
pub use cosmology::{get_cosmology, Cosmology, CosmologySpec, DistanceKind, FlatLambdaCdm};
pub use dict::{PriorDict, PriorFamily};
pub use interped::Interped;
pub use labels::LabelTable;
pub use prior::{DeltaFunction, Gaussian, Prior, PriorKind, PriorMeta, Uniform};
pub use spin::AlignedSpin;
