//! Goniometer construction surface.
//!
//! [`GoniometerFactory`] is the single entry point format adapters and
//! user-override tooling use to build goniometer models:
//!
//! - from an explicit [`GoniometerOptions`] set, optionally overriding an
//!   existing reference model,
//! - from a previously serialized dictionary, optionally merged over a
//!   template dictionary,
//! - from header-derived axis data (an [`AxisTable`] or its resolved
//!   chain),
//! - from geometric presets: the canonical single axis, its reverse, a
//!   known axis, and the three-axis kappa design,
//! - from raw axis/angle/name arrays.
//!
//! Every path runs the same validation rules; an inconsistent parameter
//! combination fails the construction call instead of degrading silently.

use nalgebra::{Matrix3, Vector3};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::axis::{AxisTable, ResolvedAxes};
use crate::error::{GonioError, GonioResult};
use crate::goniometer::{Goniometer, GoniometerModel, MultiAxisGoniometer};

// =============================================================================
// Options
// =============================================================================

/// Explicit goniometer construction options.
///
/// This is the recognized key set of the flat configuration object format
/// adapters and override files supply. `axis` and `axes` are alternative
/// spellings of the same concept and are mutually exclusive; `angles`,
/// `names` and `scan_axis` apply to multi-axis construction only, while
/// `fixed_rotation` and `setting_rotation` apply to single-axis
/// construction only.
///
/// # Example
///
/// ```rust
/// use gonio_models::{GoniometerFactory, GoniometerOptions};
///
/// let options = GoniometerOptions::from_toml(
///     r#"
///     axes = [1.0, 0.0, 0.0, 0.0, 1.0, 0.0]
///     names = ["PHI", "OMEGA"]
///     "#,
/// )?;
/// let model = GoniometerFactory::from_options(&options, None)?;
/// assert!(model.is_some());
/// # Ok::<(), gonio_models::GonioError>(())
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GoniometerOptions {
    /// Rotation axis for a single-axis goniometer (exactly 3 values).
    pub axis: Option<Vec<f64>>,
    /// Axis vectors in crystal-to-base order, flattened into consecutive
    /// triples (e.g. for a kappa goniometer: phi, kappa, omega).
    pub axes: Option<Vec<f64>>,
    /// Current angle of each axis in degrees, multi-axis only.
    pub angles: Option<Vec<f64>>,
    /// Axis names, multi-axis only.
    pub names: Option<Vec<String>>,
    /// Index of the scanned axis; settable at fresh multi-axis
    /// construction only.
    pub scan_axis: Option<usize>,
    /// Fixed rotation matrix override (9 values, row-major), single-axis
    /// only.
    pub fixed_rotation: Option<Vec<f64>>,
    /// Setting rotation matrix override (9 values, row-major), single-axis
    /// only.
    pub setting_rotation: Option<Vec<f64>>,
    /// Negate the rotation axis (or every axis of a multi-axis chain).
    pub invert_rotation_axis: bool,
}

impl GoniometerOptions {
    /// Parse options from a TOML fragment.
    ///
    /// Unrecognized keys are rejected, so a typo in an override file fails
    /// loudly rather than being ignored.
    pub fn from_toml(text: &str) -> GonioResult<Self> {
        toml::from_str(text)
            .map_err(|e| GonioError::Configuration(format!("invalid goniometer options: {e}")))
    }

    /// Whether any option is set.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}

fn mat3_from_values(values: &[f64], context: &'static str) -> GonioResult<Matrix3<f64>> {
    if values.len() != 9 {
        return Err(GonioError::DimensionMismatch {
            context,
            expected: 9,
            got: values.len(),
        });
    }
    Ok(Matrix3::from_row_slice(values))
}

fn vec3_triples(values: &[f64]) -> GonioResult<Vec<Vector3<f64>>> {
    if values.len() % 3 != 0 {
        return Err(GonioError::Configuration(
            "number of values for 'axes' must be a multiple of 3".into(),
        ));
    }
    Ok(values
        .chunks_exact(3)
        .map(|chunk| Vector3::new(chunk[0], chunk[1], chunk[2]))
        .collect())
}

// =============================================================================
// Kappa direction
// =============================================================================

/// Direction of the kappa arm at omega = 0, relative to the omega axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KappaDirection {
    /// Kappa arm tilted towards +y.
    PlusY,
    /// Kappa arm tilted towards +z.
    PlusZ,
    /// Kappa arm tilted towards -y.
    MinusY,
    /// Kappa arm tilted towards -z.
    MinusZ,
}

impl std::str::FromStr for KappaDirection {
    type Err = GonioError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "+y" => Ok(KappaDirection::PlusY),
            "+z" => Ok(KappaDirection::PlusZ),
            "-y" => Ok(KappaDirection::MinusY),
            "-z" => Ok(KappaDirection::MinusZ),
            other => Err(GonioError::InvalidDirection(other.to_owned())),
        }
    }
}

// =============================================================================
// Factory
// =============================================================================

/// Factory for goniometer models.
///
/// Encapsulates the standard goniometer designs and the override plumbing
/// so format adapters get started without hand-assembling models; adapters
/// reading a header with full axis information use the
/// [`GoniometerFactory::from_axis_table`] path instead.
pub struct GoniometerFactory;

impl GoniometerFactory {
    /// Build or override a model from explicit options.
    ///
    /// With a `reference`, the options are applied as overrides to it and
    /// the updated model is returned; the reference's variant chooses the
    /// single- or multi-axis rules. Without one, more than 3 `axes` values
    /// select multi-axis construction, any `axis`/`axes` values select
    /// single-axis construction, and an empty option set yields `Ok(None)`.
    ///
    /// # Errors
    ///
    /// [`GonioError::ConflictingAxisSpec`] when both `axis` and `axes` are
    /// set, plus the per-path validation failures described in
    /// [`GoniometerOptions`].
    pub fn from_options(
        options: &GoniometerOptions,
        reference: Option<GoniometerModel>,
    ) -> GonioResult<Option<GoniometerModel>> {
        if options.axis.is_some() && options.axes.is_some() {
            return Err(GonioError::ConflictingAxisSpec);
        }
        match reference {
            Some(GoniometerModel::MultiAxis(reference)) => {
                tracing::trace!("overriding multi-axis goniometer from options");
                Self::multi_axis_from_options(options, Some(reference))
                    .map(|g| Some(GoniometerModel::MultiAxis(g)))
            }
            Some(GoniometerModel::SingleAxis(reference)) => {
                tracing::trace!("overriding single-axis goniometer from options");
                Self::single_axis_from_options(options, Some(reference))
                    .map(|g| Some(GoniometerModel::SingleAxis(g)))
            }
            None => {
                if options.axes.as_ref().is_some_and(|axes| axes.len() > 3) {
                    tracing::trace!("building multi-axis goniometer from options");
                    Self::multi_axis_from_options(options, None)
                        .map(|g| Some(GoniometerModel::MultiAxis(g)))
                } else if options.axis.is_some() || options.axes.is_some() {
                    tracing::trace!("building single-axis goniometer from options");
                    Self::single_axis_from_options(options, None)
                        .map(|g| Some(GoniometerModel::SingleAxis(g)))
                } else {
                    Ok(None)
                }
            }
        }
    }

    /// Build or override a single-axis goniometer from explicit options.
    pub fn single_axis_from_options(
        options: &GoniometerOptions,
        reference: Option<Goniometer>,
    ) -> GonioResult<Goniometer> {
        // `axes` with exactly 3 values is accepted as an alternative
        // spelling of `axis`.
        let axis_values = options.axis.as_deref().or(options.axes.as_deref());
        if let Some(values) = axis_values {
            if values.len() != 3 {
                return Err(GonioError::DimensionMismatch {
                    context: "axis",
                    expected: 3,
                    got: values.len(),
                });
            }
        }
        if options.angles.is_some() {
            return Err(GonioError::Configuration(
                "single-axis goniometer does not accept 'angles'".into(),
            ));
        }
        if options.names.is_some() {
            return Err(GonioError::Configuration(
                "single-axis goniometer does not accept 'names'".into(),
            ));
        }

        let mut goniometer = reference.unwrap_or_default();
        if let Some(values) = axis_values {
            goniometer.set_rotation_axis_datum(Vector3::new(values[0], values[1], values[2]));
        }
        if let Some(values) = &options.fixed_rotation {
            goniometer.set_fixed_rotation(mat3_from_values(values, "fixed_rotation")?);
        }
        if let Some(values) = &options.setting_rotation {
            goniometer.set_setting_rotation(mat3_from_values(values, "setting_rotation")?);
        }
        if options.invert_rotation_axis {
            goniometer.set_rotation_axis_datum(-goniometer.get_rotation_axis_datum());
        }
        Ok(goniometer)
    }

    /// Build or override a multi-axis goniometer from explicit options.
    pub fn multi_axis_from_options(
        options: &GoniometerOptions,
        reference: Option<MultiAxisGoniometer>,
    ) -> GonioResult<MultiAxisGoniometer> {
        if options.fixed_rotation.is_some() {
            return Err(GonioError::Configuration(
                "multi-axis goniometer does not accept 'fixed_rotation'".into(),
            ));
        }
        if options.setting_rotation.is_some() {
            return Err(GonioError::Configuration(
                "multi-axis goniometer does not accept 'setting_rotation'".into(),
            ));
        }

        match reference {
            None => {
                let Some(axes_values) = options.axes.as_deref() else {
                    return Err(GonioError::Configuration("no axes set".into()));
                };
                let mut axes = vec3_triples(axes_values)?;
                if options.invert_rotation_axis {
                    for axis in &mut axes {
                        *axis = -*axis;
                    }
                }

                let angles = match &options.angles {
                    Some(angles) => {
                        if angles.len() != axes.len() {
                            return Err(GonioError::DimensionMismatch {
                                context: "angles",
                                expected: axes.len(),
                                got: angles.len(),
                            });
                        }
                        angles.clone()
                    }
                    None => vec![0.0; axes.len()],
                };
                let names = match &options.names {
                    Some(names) => {
                        if names.len() != axes.len() {
                            return Err(GonioError::DimensionMismatch {
                                context: "names",
                                expected: axes.len(),
                                got: names.len(),
                            });
                        }
                        names.clone()
                    }
                    None => vec![String::new(); axes.len()],
                };
                let scan_axis = options.scan_axis.unwrap_or(0);
                MultiAxisGoniometer::new(axes, angles, names, scan_axis)
            }
            Some(mut goniometer) => {
                if let Some(axes_values) = options.axes.as_deref() {
                    let axes = vec3_triples(axes_values)?;
                    goniometer.set_axes(axes)?;
                }
                if options.invert_rotation_axis {
                    let inverted: Vec<_> =
                        goniometer.get_axes().iter().map(|axis| -*axis).collect();
                    goniometer.set_axes(inverted)?;
                }
                if let Some(angles) = &options.angles {
                    goniometer.set_angles(angles.clone())?;
                }
                if let Some(names) = &options.names {
                    goniometer.set_names(names.clone())?;
                }
                if options.scan_axis.is_some() {
                    return Err(GonioError::ImmutableScanAxis);
                }
                Ok(goniometer)
            }
        }
    }

    /// Build a multi-axis goniometer from a resolved header axis chain.
    ///
    /// This is the header-derived construction path: the resolved order is
    /// used directly, with no options merging.
    pub fn from_resolved(resolved: ResolvedAxes) -> GonioResult<MultiAxisGoniometer> {
        Self::multi_axis(
            resolved.axes,
            resolved.angles,
            resolved.names,
            resolved.scan_axis,
        )
    }

    /// Resolve a header axis table and build the multi-axis goniometer it
    /// describes.
    pub fn from_axis_table(table: &AxisTable) -> GonioResult<MultiAxisGoniometer> {
        Self::from_resolved(table.resolve()?)
    }

    /// Build a model from a serialized dictionary, optionally merged over a
    /// template dictionary.
    ///
    /// Template values are base defaults; explicit values override them.
    /// Both absent yields `Ok(None)`.
    pub fn from_dict(
        dict: Option<&Value>,
        template: Option<&Value>,
    ) -> GonioResult<Option<GoniometerModel>> {
        if dict.is_none() && template.is_none() {
            return Ok(None);
        }
        let mut joint = match template {
            Some(template) => template
                .as_object()
                .ok_or_else(|| GonioError::Dictionary("template must be a dictionary".into()))?
                .clone(),
            None => Map::new(),
        };
        if let Some(dict) = dict {
            let explicit = dict
                .as_object()
                .ok_or_else(|| GonioError::Dictionary("expected a dictionary".into()))?;
            for (key, value) in explicit {
                joint.insert(key.clone(), value.clone());
            }
        }
        GoniometerModel::from_dict(&Value::Object(joint)).map(Some)
    }

    /// The canonical single-axis goniometer: axis `(1, 0, 0)`, identity
    /// fixed rotation.
    pub fn single_axis() -> Goniometer {
        Goniometer::new(Vector3::x())
    }

    /// The canonical single-axis goniometer, reversed in rotation: axis
    /// `(-1, 0, 0)`.
    pub fn single_axis_reverse() -> Goniometer {
        Goniometer::new(-Vector3::x())
    }

    /// A single-axis goniometer for a known rotation axis, assuming nothing
    /// is known about the fixed element of the rotation.
    pub fn known_axis(axis: Vector3<f64>) -> Goniometer {
        Goniometer::new(axis)
    }

    /// The three-axis kappa goniometer design.
    ///
    /// Omega is the primary axis, aligned with x; the kappa arm with
    /// half-angle `alpha` (degrees) is attached to it, tilted towards
    /// `direction` (one of `+y`, `+z`, `-y`, `-z`) at omega = 0; phi is
    /// fixed to the kappa arm and coincident with omega at kappa = 0.
    /// `scan_axis` selects the scanned axis: `"phi"` scans phi, anything
    /// else scans omega. All angles are in degrees.
    ///
    /// # Errors
    ///
    /// [`GonioError::InvalidDirection`] for an unrecognized `direction`.
    pub fn kappa(
        alpha: f64,
        omega: f64,
        kappa: f64,
        phi: f64,
        direction: &str,
        scan_axis: &str,
    ) -> GonioResult<MultiAxisGoniometer> {
        let direction: KappaDirection = direction.parse()?;
        let omega_axis = Vector3::x();
        let phi_axis = Vector3::x();

        let (c, s) = {
            let alpha = alpha.to_radians();
            (alpha.cos(), alpha.sin())
        };
        let kappa_axis = match direction {
            KappaDirection::PlusY => Vector3::new(c, s, 0.0),
            KappaDirection::PlusZ => Vector3::new(c, 0.0, s),
            KappaDirection::MinusY => Vector3::new(c, -s, 0.0),
            KappaDirection::MinusZ => Vector3::new(c, 0.0, -s),
        };

        let scan_axis = if scan_axis == "phi" { 0 } else { 2 };

        Self::multi_axis(
            vec![phi_axis, kappa_axis, omega_axis],
            vec![phi, kappa, omega],
            vec!["PHI".into(), "KAPPA".into(), "OMEGA".into()],
            scan_axis,
        )
    }

    /// Build a multi-axis goniometer from raw axis/angle/name arrays.
    ///
    /// A direct pass-through: only the model's own length invariant is
    /// checked.
    pub fn multi_axis(
        axes: Vec<Vector3<f64>>,
        angles: Vec<f64>,
        names: Vec<String>,
        scan_axis: usize,
    ) -> GonioResult<MultiAxisGoniometer> {
        MultiAxisGoniometer::new(axes, angles, names, scan_axis)
    }
}
