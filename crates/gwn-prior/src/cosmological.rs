use std::fmt;
use std::str::FromStr;

use gwn_core::errors::{ErrorInfo, NestError};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::cosmology::{Cosmology, CosmologySpec, DistanceKind, FlatLambdaCdm};
use crate::interped::Interped;
use crate::numeric::{gradient, linspace};
use crate::prior::{Prior, PriorMeta};

/// Default number of redshift nodes used to tabulate the density.
pub const DEFAULT_GRID_POINTS: usize = 1000;

/// Fractional padding applied to the redshift range before tabulating.
const GRID_PADDING: f64 = 0.01;

/// The three coordinate systems of a source's distance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Coordinate {
    /// Cosmological redshift `z`.
    Redshift,
    /// Luminosity distance `d_L` in Mpc.
    LuminosityDistance,
    /// Comoving distance `d_C` in Mpc.
    ComovingDistance,
}

impl Coordinate {
    /// All coordinates, in a fixed order.
    pub const ALL: [Coordinate; 3] = [
        Coordinate::Redshift,
        Coordinate::LuminosityDistance,
        Coordinate::ComovingDistance,
    ];

    /// Parameter name of the coordinate.
    pub fn as_str(&self) -> &'static str {
        match self {
            Coordinate::Redshift => "redshift",
            Coordinate::LuminosityDistance => "luminosity_distance",
            Coordinate::ComovingDistance => "comoving_distance",
        }
    }

    /// Distance measure behind the coordinate; `None` for redshift.
    pub fn distance_kind(&self) -> Option<DistanceKind> {
        match self {
            Coordinate::Redshift => None,
            Coordinate::LuminosityDistance => Some(DistanceKind::Luminosity),
            Coordinate::ComovingDistance => Some(DistanceKind::Comoving),
        }
    }

    fn default_latex_label(&self) -> &'static str {
        match self {
            Coordinate::Redshift => "$z$",
            Coordinate::LuminosityDistance => "$d_L$",
            Coordinate::ComovingDistance => "$d_C$",
        }
    }

    fn default_unit(&self) -> Option<&'static str> {
        match self {
            Coordinate::Redshift => None,
            _ => Some("Mpc"),
        }
    }

    fn default_meta(&self) -> PriorMeta {
        PriorMeta {
            name: self.as_str().to_string(),
            latex_label: Some(self.default_latex_label().to_string()),
            unit: self.default_unit().map(str::to_string),
        }
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Coordinate {
    type Err = NestError;

    fn from_str(name: &str) -> Result<Self, Self::Err> {
        Coordinate::ALL
            .into_iter()
            .find(|coordinate| coordinate.as_str() == name)
            .ok_or_else(|| {
                NestError::Coordinate(
                    ErrorInfo::new("unknown-coordinate", format!("name {name} not recognised"))
                        .with_hint("must be one of luminosity_distance, comoving_distance, redshift"),
                )
            })
    }
}

/// Which end of a range is being updated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoundEdge {
    /// Lower bound.
    Minimum,
    /// Upper bound.
    Maximum,
}

/// Closed interval in one coordinate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateRange {
    /// Lower bound.
    pub minimum: f64,
    /// Upper bound.
    pub maximum: f64,
}

/// One point expressed in all three coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Mirrored {
    redshift: f64,
    luminosity_distance: f64,
    comoving_distance: f64,
}

impl Mirrored {
    fn get(&self, coordinate: Coordinate) -> f64 {
        match coordinate {
            Coordinate::Redshift => self.redshift,
            Coordinate::LuminosityDistance => self.luminosity_distance,
            Coordinate::ComovingDistance => self.comoving_distance,
        }
    }

    /// Expresses `value` of `native` in every coordinate. The native value is
    /// kept verbatim; a zero distance maps to redshift zero without inversion.
    fn resolve<C: Cosmology>(
        cosmology: &C,
        native: Coordinate,
        value: f64,
    ) -> Result<Self, NestError> {
        let redshift = match native.distance_kind() {
            None => value,
            Some(_) if value == 0.0 => 0.0,
            Some(kind) => cosmology.redshift_at(kind, value)?,
        };
        let mut mirrored = Self {
            redshift,
            luminosity_distance: cosmology.luminosity_distance(redshift),
            comoving_distance: cosmology.comoving_distance(redshift),
        };
        match native {
            Coordinate::Redshift => {}
            Coordinate::LuminosityDistance => mirrored.luminosity_distance = value,
            Coordinate::ComovingDistance => mirrored.comoving_distance = value,
        }
        Ok(mirrored)
    }
}

/// Immutable snapshot of the bounds of one prior in all three coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DistanceBounds {
    native: Coordinate,
    minimum: Mirrored,
    maximum: Mirrored,
}

impl DistanceBounds {
    /// Resolves `[minimum, maximum]` given in `native` into all three
    /// coordinates at once.
    pub fn resolve<C: Cosmology>(
        cosmology: &C,
        native: Coordinate,
        minimum: f64,
        maximum: f64,
    ) -> Result<Self, NestError> {
        validate_range(native, minimum, maximum)?;
        Ok(Self {
            native,
            minimum: Mirrored::resolve(cosmology, native, minimum)?,
            maximum: Mirrored::resolve(cosmology, native, maximum)?,
        })
    }

    /// Returns a new snapshot with one edge moved, keeping the other edge.
    pub fn with_edge<C: Cosmology>(
        &self,
        cosmology: &C,
        edge: BoundEdge,
        value: f64,
    ) -> Result<Self, NestError> {
        let current = self.range(self.native);
        let (minimum, maximum) = match edge {
            BoundEdge::Minimum => (value, current.maximum),
            BoundEdge::Maximum => (current.minimum, value),
        };
        validate_range(self.native, minimum, maximum)?;
        let moved = Mirrored::resolve(cosmology, self.native, value)?;
        let mut next = *self;
        match edge {
            BoundEdge::Minimum => next.minimum = moved,
            BoundEdge::Maximum => next.maximum = moved,
        }
        Ok(next)
    }

    /// Coordinate in which the bounds were specified.
    pub fn native(&self) -> Coordinate {
        self.native
    }

    /// Range expressed in `coordinate`.
    pub fn range(&self, coordinate: Coordinate) -> CoordinateRange {
        CoordinateRange {
            minimum: self.minimum.get(coordinate),
            maximum: self.maximum.get(coordinate),
        }
    }
}

fn validate_range(native: Coordinate, minimum: f64, maximum: f64) -> Result<(), NestError> {
    let failure = if !minimum.is_finite() || !maximum.is_finite() {
        Some(("bounds-finite", "bounds must be finite"))
    } else if minimum < 0.0 {
        Some(("bounds-negative", "distances and redshifts cannot be negative"))
    } else if minimum >= maximum {
        Some(("bounds-order", "minimum must be strictly below maximum"))
    } else {
        None
    };
    match failure {
        Some((code, message)) => Err(NestError::Bounds(
            ErrorInfo::new(code, message)
                .with_context("coordinate", native.as_str())
                .with_context("minimum", minimum.to_string())
                .with_context("maximum", maximum.to_string()),
        )),
        None => Ok(()),
    }
}

/// Construction options shared by every coordinate view of a cosmological prior.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CosmologicalOptions {
    /// Cosmology; `None` selects Planck15.
    #[serde(default)]
    pub cosmology: Option<CosmologySpec>,
    /// Display label override.
    #[serde(default)]
    pub latex_label: Option<String>,
    /// Unit override.
    #[serde(default)]
    pub unit: Option<String>,
    /// Number of redshift nodes used to tabulate the density.
    #[serde(default = "default_grid_points")]
    pub grid_points: usize,
}

fn default_grid_points() -> usize {
    DEFAULT_GRID_POINTS
}

impl Default for CosmologicalOptions {
    fn default() -> Self {
        Self {
            cosmology: None,
            latex_label: None,
            unit: None,
            grid_points: default_grid_points(),
        }
    }
}

/// Prior uniform in comoving volume, expressed in redshift, luminosity
/// distance or comoving distance.
///
/// The density is built in redshift as `dV_c/dz` on a grid padded by 1% on
/// each side, then carried to distance coordinates by dividing through the
/// numerical derivative of the distance relation.
#[derive(Debug, Clone, PartialEq)]
pub struct CosmologicalPrior {
    coordinate: Coordinate,
    cosmology: FlatLambdaCdm,
    options: CosmologicalOptions,
    bounds: DistanceBounds,
    density: Interped,
}

/// Alias naming the density model of [`CosmologicalPrior`].
pub type UniformComovingVolume = CosmologicalPrior;

impl CosmologicalPrior {
    /// Builds the prior for the coordinate called `name`.
    pub fn new(
        name: &str,
        minimum: f64,
        maximum: f64,
        options: CosmologicalOptions,
    ) -> Result<Self, NestError> {
        Self::for_coordinate(name.parse()?, minimum, maximum, options)
    }

    /// Builds the prior for `coordinate`.
    pub fn for_coordinate(
        coordinate: Coordinate,
        minimum: f64,
        maximum: f64,
        options: CosmologicalOptions,
    ) -> Result<Self, NestError> {
        let cosmology = match &options.cosmology {
            Some(spec) => spec.resolve()?,
            None => FlatLambdaCdm::planck15(),
        };
        let bounds = DistanceBounds::resolve(&cosmology, coordinate, minimum, maximum)?;
        let density = build_density(&cosmology, &bounds, &options)?;
        Ok(Self {
            coordinate,
            cosmology,
            options,
            bounds,
            density,
        })
    }

    /// Native coordinate of the prior.
    pub fn coordinate(&self) -> Coordinate {
        self.coordinate
    }

    /// Cosmology used for every conversion.
    pub fn cosmology(&self) -> &FlatLambdaCdm {
        &self.cosmology
    }

    /// Current bounds snapshot.
    pub fn bounds(&self) -> &DistanceBounds {
        &self.bounds
    }

    /// Tabulated density over the native coordinate.
    pub fn density(&self) -> &Interped {
        &self.density
    }

    /// Moves one bound. `value` is given in `coordinate` and converted to the
    /// native coordinate first; all three mirrored bounds and the density are
    /// rebuilt together, and the prior is left untouched on error.
    pub fn set_bound(
        &mut self,
        coordinate: Coordinate,
        edge: BoundEdge,
        value: f64,
    ) -> Result<(), NestError> {
        let native_value = convert(&self.cosmology, coordinate, self.coordinate, value)?;
        let bounds = self.bounds.with_edge(&self.cosmology, edge, native_value)?;
        let density = build_density(&self.cosmology, &bounds, &self.options)?;
        self.bounds = bounds;
        self.density = density;
        Ok(())
    }

    /// Returns a copy of the prior with both native bounds replaced.
    pub fn set_bounds(&self, minimum: f64, maximum: f64) -> Result<Self, NestError> {
        let bounds = DistanceBounds::resolve(&self.cosmology, self.coordinate, minimum, maximum)?;
        let density = build_density(&self.cosmology, &bounds, &self.options)?;
        Ok(Self {
            bounds,
            density,
            ..self.clone()
        })
    }

    /// Builds the prior for another coordinate of the same quantity with the
    /// same cosmology and grid; labels and unit revert to that coordinate's
    /// defaults unless `unit` is given.
    pub fn get_corresponding_prior(
        &self,
        coordinate: Coordinate,
        unit: Option<String>,
    ) -> Result<Self, NestError> {
        let range = self.bounds.range(coordinate);
        let options = CosmologicalOptions {
            cosmology: Some(CosmologySpec::Custom {
                h0: self.cosmology.h0,
                om0: self.cosmology.om0,
            }),
            latex_label: None,
            unit,
            grid_points: self.options.grid_points,
        };
        let mut prior = Self::for_coordinate(coordinate, range.minimum, range.maximum, options)?;
        prior.cosmology.name = self.cosmology.name.clone();
        Ok(prior)
    }
}

impl Prior for CosmologicalPrior {
    fn meta(&self) -> &PriorMeta {
        self.density.meta()
    }

    fn minimum(&self) -> f64 {
        self.bounds.range(self.coordinate).minimum
    }

    fn maximum(&self) -> f64 {
        self.bounds.range(self.coordinate).maximum
    }

    fn rescale(&self, unit: f64) -> f64 {
        self.density.rescale(unit)
    }

    fn prob(&self, value: f64) -> f64 {
        self.density.prob(value)
    }
}

fn convert<C: Cosmology>(
    cosmology: &C,
    from: Coordinate,
    to: Coordinate,
    value: f64,
) -> Result<f64, NestError> {
    if from == to {
        return Ok(value);
    }
    Ok(Mirrored::resolve(cosmology, from, value)?.get(to))
}

/// Redshift grid and `dV_c/dz` over the padded redshift range.
fn redshift_arrays<C: Cosmology>(
    cosmology: &C,
    bounds: &DistanceBounds,
    grid_points: usize,
) -> (Vec<f64>, Vec<f64>) {
    let range = bounds.range(Coordinate::Redshift);
    let zs = linspace(
        range.minimum * (1.0 - GRID_PADDING),
        range.maximum * (1.0 + GRID_PADDING),
        grid_points,
    );
    let p_dz = zs
        .iter()
        .map(|&z| cosmology.differential_comoving_volume(z))
        .collect();
    (zs, p_dz)
}

fn build_density(
    cosmology: &FlatLambdaCdm,
    bounds: &DistanceBounds,
    options: &CosmologicalOptions,
) -> Result<Interped, NestError> {
    if options.grid_points < 3 {
        return Err(NestError::Numeric(
            ErrorInfo::new("grid-size", "density grid needs at least three nodes")
                .with_context("grid_points", options.grid_points.to_string()),
        ));
    }
    let native = bounds.native();
    let (zs, p_dz) = redshift_arrays(cosmology, bounds, options.grid_points);
    let (xx, yy) = match native.distance_kind() {
        None => (zs, p_dz),
        Some(kind) => {
            let d_of_z: Vec<f64> = zs.iter().map(|&z| cosmology.distance(kind, z)).collect();
            let dd_dz = gradient(&d_of_z, &zs)?;
            let p_dd = p_dz
                .iter()
                .zip(&dd_dz)
                .map(|(density, jacobian)| density / jacobian)
                .collect();
            (d_of_z, p_dd)
        }
    };

    let mut meta = native.default_meta();
    if let Some(label) = &options.latex_label {
        meta.latex_label = Some(label.clone());
    }
    if let Some(unit) = &options.unit {
        meta.unit = Some(unit.clone());
    }
    let range = bounds.range(native);
    debug!(
        coordinate = native.as_str(),
        minimum = range.minimum,
        maximum = range.maximum,
        nodes = xx.len(),
        "rebuilt cosmological density"
    );
    Interped::new(meta, xx, yy, Some(range.minimum), Some(range.maximum))
}
