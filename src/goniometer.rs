//! Goniometer model value objects.
//!
//! Two variants cover the goniometer designs found on diffraction
//! beamlines:
//!
//! - [`Goniometer`] - a single physical rotation axis plus two static
//!   orientation corrections (`fixed_rotation` applied on the crystal side
//!   of the scan rotation, `setting_rotation` applied outside it).
//! - [`MultiAxisGoniometer`] - an ordered chain of rotation axes in
//!   crystal-to-base order with their current angles, names, and the index
//!   of the scanned axis. The chain's single-axis equivalent (rotation axis
//!   datum, fixed and setting rotations) is derived by composing the
//!   per-axis rotations on either side of the scan axis and kept current
//!   through every mutation.
//!
//! [`GoniometerModel`] is the sum of the two, used where construction may
//! yield either variant. Models are plain value objects: no lifecycle
//! beyond construction, mutation and read, compared by value in tests.
//!
//! # Serialization
//!
//! Models serialize to a flat key-value dictionary
//! ([`serde_json::Value`] object). The dictionary of a multi-axis model is
//! distinguished from a single-axis one solely by the simultaneous presence
//! of the three keys `axes`, `angles` and `scan_axis`; any other
//! combination deserializes as single-axis. This structural discriminator
//! is a compatibility contract with existing serialized models, so there is
//! no explicit variant tag at the serialization boundary.

use nalgebra::{Matrix3, Rotation3, Unit, Vector3};
use serde_json::{json, Map, Value};

use crate::error::{GonioError, GonioResult};

// =============================================================================
// Dictionary helpers
// =============================================================================

fn f64_from_value(value: &Value, context: &str) -> GonioResult<f64> {
    value
        .as_f64()
        .ok_or_else(|| GonioError::Dictionary(format!("'{context}' must be a number")))
}

fn vec3_from_value(value: &Value, context: &str) -> GonioResult<Vector3<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| GonioError::Dictionary(format!("'{context}' must be a 3-element list")))?;
    if items.len() != 3 {
        return Err(GonioError::Dictionary(format!(
            "'{context}' must hold 3 values, got {}",
            items.len()
        )));
    }
    Ok(Vector3::new(
        f64_from_value(&items[0], context)?,
        f64_from_value(&items[1], context)?,
        f64_from_value(&items[2], context)?,
    ))
}

fn mat3_from_value(value: &Value, context: &str) -> GonioResult<Matrix3<f64>> {
    let items = value
        .as_array()
        .ok_or_else(|| GonioError::Dictionary(format!("'{context}' must be a 9-element list")))?;
    if items.len() != 9 {
        return Err(GonioError::Dictionary(format!(
            "'{context}' must hold 9 values, got {}",
            items.len()
        )));
    }
    let mut elements = [0.0; 9];
    for (slot, item) in elements.iter_mut().zip(items) {
        *slot = f64_from_value(item, context)?;
    }
    Ok(Matrix3::from_row_slice(&elements))
}

fn vec3_to_value(v: &Vector3<f64>) -> Value {
    json!([v.x, v.y, v.z])
}

fn mat3_to_value(m: &Matrix3<f64>) -> Value {
    // Row-major, matching the serialized layout of existing models.
    Value::Array(
        (0..3)
            .flat_map(|r| (0..3).map(move |c| (r, c)))
            .map(|(r, c)| json!(m[(r, c)]))
            .collect(),
    )
}

/// Rotation matrix for one axis at one angle, both in the header
/// conventions (arbitrary-scale direction vector, angle in degrees).
fn axis_rotation(axis: &Vector3<f64>, angle_deg: f64) -> Matrix3<f64> {
    let axis = Unit::new_normalize(*axis);
    Rotation3::from_axis_angle(&axis, angle_deg.to_radians()).into_inner()
}

// =============================================================================
// Single-axis model
// =============================================================================

/// A goniometer with one physical rotation axis.
///
/// Static orientation corrections are carried as two matrices:
/// `fixed_rotation` sits between the crystal and the scan rotation and
/// `setting_rotation` outside it, so the effective crystal orientation is
/// `S * R(angle) * F` for scan rotation `R` about the axis datum.
#[derive(Debug, Clone, PartialEq)]
pub struct Goniometer {
    rotation_axis: Vector3<f64>,
    fixed_rotation: Matrix3<f64>,
    setting_rotation: Matrix3<f64>,
}

impl Default for Goniometer {
    /// The canonical reference-frame goniometer: axis `(1, 0, 0)`, identity
    /// corrections.
    fn default() -> Self {
        Self::new(Vector3::x())
    }
}

impl Goniometer {
    /// Create a goniometer about `rotation_axis` with identity corrections.
    pub fn new(rotation_axis: Vector3<f64>) -> Self {
        Self::with_rotations(rotation_axis, Matrix3::identity(), Matrix3::identity())
    }

    /// Create a goniometer with explicit orientation corrections.
    pub fn with_rotations(
        rotation_axis: Vector3<f64>,
        fixed_rotation: Matrix3<f64>,
        setting_rotation: Matrix3<f64>,
    ) -> Self {
        Self {
            rotation_axis,
            fixed_rotation,
            setting_rotation,
        }
    }

    /// The rotation axis datum, before the setting rotation is applied.
    pub fn get_rotation_axis_datum(&self) -> Vector3<f64> {
        self.rotation_axis
    }

    /// The rotation axis in the laboratory frame
    /// (`setting_rotation * datum`).
    pub fn get_rotation_axis(&self) -> Vector3<f64> {
        self.setting_rotation * self.rotation_axis
    }

    /// The fixed orientation correction.
    pub fn get_fixed_rotation(&self) -> Matrix3<f64> {
        self.fixed_rotation
    }

    /// The setting orientation correction.
    pub fn get_setting_rotation(&self) -> Matrix3<f64> {
        self.setting_rotation
    }

    /// Replace the rotation axis datum.
    pub fn set_rotation_axis_datum(&mut self, axis: Vector3<f64>) {
        self.rotation_axis = axis;
    }

    /// Replace the fixed orientation correction.
    pub fn set_fixed_rotation(&mut self, fixed_rotation: Matrix3<f64>) {
        self.fixed_rotation = fixed_rotation;
    }

    /// Replace the setting orientation correction.
    pub fn set_setting_rotation(&mut self, setting_rotation: Matrix3<f64>) {
        self.setting_rotation = setting_rotation;
    }

    /// Serialize to the flat key-value dictionary representation.
    pub fn to_dict(&self) -> Value {
        json!({
            "rotation_axis": vec3_to_value(&self.rotation_axis),
            "fixed_rotation": mat3_to_value(&self.fixed_rotation),
            "setting_rotation": mat3_to_value(&self.setting_rotation),
        })
    }

    /// Deserialize from the flat key-value dictionary representation.
    ///
    /// `rotation_axis` is required; either rotation matrix defaults to the
    /// identity when absent, so sparse dictionaries merged over a template
    /// stay valid.
    pub fn from_dict(value: &Value) -> GonioResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| GonioError::Dictionary("expected a dictionary".into()))?;
        let rotation_axis = obj
            .get("rotation_axis")
            .ok_or_else(|| GonioError::Dictionary("missing required key 'rotation_axis'".into()))?;
        let rotation_axis = vec3_from_value(rotation_axis, "rotation_axis")?;
        let fixed_rotation = match obj.get("fixed_rotation") {
            Some(v) => mat3_from_value(v, "fixed_rotation")?,
            None => Matrix3::identity(),
        };
        let setting_rotation = match obj.get("setting_rotation") {
            Some(v) => mat3_from_value(v, "setting_rotation")?,
            None => Matrix3::identity(),
        };
        Ok(Self::with_rotations(
            rotation_axis,
            fixed_rotation,
            setting_rotation,
        ))
    }
}

// =============================================================================
// Multi-axis model
// =============================================================================

/// A goniometer built from an ordered chain of rotation axes.
///
/// Axes are held in crystal-to-base order: index 0 is the axis closest to
/// the sample, the last index the outermost axis on the goniometer base.
/// The invariant `axes.len() == angles.len() == names.len()` and
/// `scan_axis < axes.len()` holds for every constructed value.
#[derive(Debug, Clone, PartialEq)]
pub struct MultiAxisGoniometer {
    axes: Vec<Vector3<f64>>,
    angles: Vec<f64>,
    names: Vec<String>,
    scan_axis: usize,
    /// Single-axis equivalent derived from the chain; recomputed on every
    /// mutation.
    derived: Goniometer,
}

impl MultiAxisGoniometer {
    /// Construct a multi-axis goniometer, validating the length invariant.
    ///
    /// # Errors
    ///
    /// [`GonioError::DimensionMismatch`] when `angles` or `names` do not
    /// match the axis count; [`GonioError::Configuration`] for an empty
    /// chain or an out-of-range `scan_axis`.
    pub fn new(
        axes: Vec<Vector3<f64>>,
        angles: Vec<f64>,
        names: Vec<String>,
        scan_axis: usize,
    ) -> GonioResult<Self> {
        if axes.is_empty() {
            return Err(GonioError::Configuration(
                "multi-axis goniometer requires at least one axis".into(),
            ));
        }
        if angles.len() != axes.len() {
            return Err(GonioError::DimensionMismatch {
                context: "angles",
                expected: axes.len(),
                got: angles.len(),
            });
        }
        if names.len() != axes.len() {
            return Err(GonioError::DimensionMismatch {
                context: "names",
                expected: axes.len(),
                got: names.len(),
            });
        }
        if scan_axis >= axes.len() {
            return Err(GonioError::Configuration(format!(
                "scan_axis {scan_axis} is out of range for {} axes",
                axes.len()
            )));
        }
        let derived = Self::compose(&axes, &angles, scan_axis);
        Ok(Self {
            axes,
            angles,
            names,
            scan_axis,
            derived,
        })
    }

    /// Compose the chain into its single-axis equivalent.
    ///
    /// Axes below the scan axis (crystal side) fold into the fixed
    /// rotation, axes above it into the setting rotation; the scan axis
    /// itself becomes the rotation axis datum.
    fn compose(axes: &[Vector3<f64>], angles: &[f64], scan_axis: usize) -> Goniometer {
        let mut fixed_rotation = Matrix3::identity();
        for i in 0..scan_axis {
            fixed_rotation = axis_rotation(&axes[i], angles[i]) * fixed_rotation;
        }
        let mut setting_rotation = Matrix3::identity();
        for i in (scan_axis + 1)..axes.len() {
            setting_rotation = axis_rotation(&axes[i], angles[i]) * setting_rotation;
        }
        Goniometer::with_rotations(axes[scan_axis], fixed_rotation, setting_rotation)
    }

    fn recompute(&mut self) {
        self.derived = Self::compose(&self.axes, &self.angles, self.scan_axis);
    }

    /// Axis direction vectors, crystal-to-base.
    pub fn get_axes(&self) -> &[Vector3<f64>] {
        &self.axes
    }

    /// Current axis angles in degrees, same order as the axes.
    pub fn get_angles(&self) -> &[f64] {
        &self.angles
    }

    /// Axis names, same order as the axes.
    pub fn get_names(&self) -> &[String] {
        &self.names
    }

    /// Index of the scanned axis.
    pub fn get_scan_axis(&self) -> usize {
        self.scan_axis
    }

    /// The scanned axis direction, before the setting rotation is applied.
    pub fn get_rotation_axis_datum(&self) -> Vector3<f64> {
        self.derived.get_rotation_axis_datum()
    }

    /// The scanned axis direction in the laboratory frame.
    pub fn get_rotation_axis(&self) -> Vector3<f64> {
        self.derived.get_rotation_axis()
    }

    /// Composition of the axes on the crystal side of the scan axis.
    pub fn get_fixed_rotation(&self) -> Matrix3<f64> {
        self.derived.get_fixed_rotation()
    }

    /// Composition of the axes outside the scan axis.
    pub fn get_setting_rotation(&self) -> Matrix3<f64> {
        self.derived.get_setting_rotation()
    }

    /// Replace the axis directions.
    ///
    /// # Errors
    ///
    /// [`GonioError::DimensionMismatch`] when the new sequence does not
    /// match the current axis count.
    pub fn set_axes(&mut self, axes: Vec<Vector3<f64>>) -> GonioResult<()> {
        if axes.len() != self.axes.len() {
            return Err(GonioError::DimensionMismatch {
                context: "axes",
                expected: self.axes.len(),
                got: axes.len(),
            });
        }
        self.axes = axes;
        self.recompute();
        Ok(())
    }

    /// Replace the axis angles.
    ///
    /// # Errors
    ///
    /// [`GonioError::DimensionMismatch`] when the new sequence does not
    /// match the current axis count.
    pub fn set_angles(&mut self, angles: Vec<f64>) -> GonioResult<()> {
        if angles.len() != self.axes.len() {
            return Err(GonioError::DimensionMismatch {
                context: "angles",
                expected: self.axes.len(),
                got: angles.len(),
            });
        }
        self.angles = angles;
        self.recompute();
        Ok(())
    }

    /// Replace the axis names.
    ///
    /// # Errors
    ///
    /// [`GonioError::DimensionMismatch`] when the new sequence does not
    /// match the current axis count.
    pub fn set_names(&mut self, names: Vec<String>) -> GonioResult<()> {
        if names.len() != self.axes.len() {
            return Err(GonioError::DimensionMismatch {
                context: "names",
                expected: self.axes.len(),
                got: names.len(),
            });
        }
        self.names = names;
        Ok(())
    }

    /// Serialize to the flat key-value dictionary representation.
    ///
    /// The dictionary carries the derived single-axis keys alongside the
    /// chain, so downstream consumers that only understand single-axis
    /// models still read a usable rotation axis.
    pub fn to_dict(&self) -> Value {
        let mut dict = match self.derived.to_dict() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        dict.insert(
            "axes".into(),
            Value::Array(self.axes.iter().map(vec3_to_value).collect()),
        );
        dict.insert(
            "angles".into(),
            Value::Array(self.angles.iter().map(|a| json!(a)).collect()),
        );
        dict.insert(
            "names".into(),
            Value::Array(self.names.iter().map(|n| json!(n)).collect()),
        );
        dict.insert("scan_axis".into(), json!(self.scan_axis));
        Value::Object(dict)
    }

    /// Deserialize from the flat key-value dictionary representation.
    ///
    /// `axes`, `angles` and `scan_axis` are required (they are the
    /// discriminator that routed the dictionary here); `names` defaults to
    /// empty strings. The single-axis keys, if present, are ignored and
    /// recomputed from the chain.
    pub fn from_dict(value: &Value) -> GonioResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| GonioError::Dictionary("expected a dictionary".into()))?;
        let axes_value = obj
            .get("axes")
            .ok_or_else(|| GonioError::Dictionary("missing required key 'axes'".into()))?
            .as_array()
            .ok_or_else(|| GonioError::Dictionary("'axes' must be a list of 3-vectors".into()))?;
        let axes = axes_value
            .iter()
            .map(|v| vec3_from_value(v, "axes"))
            .collect::<GonioResult<Vec<_>>>()?;

        let angles_value = obj
            .get("angles")
            .ok_or_else(|| GonioError::Dictionary("missing required key 'angles'".into()))?
            .as_array()
            .ok_or_else(|| GonioError::Dictionary("'angles' must be a list of numbers".into()))?;
        let angles = angles_value
            .iter()
            .map(|v| f64_from_value(v, "angles"))
            .collect::<GonioResult<Vec<_>>>()?;

        let names = match obj.get("names") {
            Some(value) => value
                .as_array()
                .ok_or_else(|| GonioError::Dictionary("'names' must be a list of strings".into()))?
                .iter()
                .map(|v| {
                    v.as_str().map(str::to_owned).ok_or_else(|| {
                        GonioError::Dictionary("'names' must be a list of strings".into())
                    })
                })
                .collect::<GonioResult<Vec<_>>>()?,
            None => vec![String::new(); axes.len()],
        };

        let scan_axis = obj
            .get("scan_axis")
            .ok_or_else(|| GonioError::Dictionary("missing required key 'scan_axis'".into()))?
            .as_u64()
            .ok_or_else(|| {
                GonioError::Dictionary("'scan_axis' must be a non-negative integer".into())
            })? as usize;

        Self::new(axes, angles, names, scan_axis)
    }
}

// =============================================================================
// Sum type
// =============================================================================

/// Either goniometer variant, as produced by the construction surface.
///
/// Internally an explicit sum type; at the serialization boundary the
/// variant is recovered structurally from the key set (see the module
/// documentation).
#[derive(Debug, Clone, PartialEq)]
pub enum GoniometerModel {
    /// One rotation axis with static orientation corrections.
    SingleAxis(Goniometer),
    /// An ordered chain of rotation axes.
    MultiAxis(MultiAxisGoniometer),
}

impl GoniometerModel {
    /// The keys whose simultaneous presence marks a multi-axis dictionary.
    const MULTI_AXIS_KEYS: [&'static str; 3] = ["axes", "angles", "scan_axis"];

    /// The rotation axis in the laboratory frame, for either variant.
    pub fn get_rotation_axis(&self) -> Vector3<f64> {
        match self {
            GoniometerModel::SingleAxis(g) => g.get_rotation_axis(),
            GoniometerModel::MultiAxis(g) => g.get_rotation_axis(),
        }
    }

    /// The rotation axis datum, for either variant.
    pub fn get_rotation_axis_datum(&self) -> Vector3<f64> {
        match self {
            GoniometerModel::SingleAxis(g) => g.get_rotation_axis_datum(),
            GoniometerModel::MultiAxis(g) => g.get_rotation_axis_datum(),
        }
    }

    /// The fixed orientation correction, for either variant.
    pub fn get_fixed_rotation(&self) -> Matrix3<f64> {
        match self {
            GoniometerModel::SingleAxis(g) => g.get_fixed_rotation(),
            GoniometerModel::MultiAxis(g) => g.get_fixed_rotation(),
        }
    }

    /// The setting orientation correction, for either variant.
    pub fn get_setting_rotation(&self) -> Matrix3<f64> {
        match self {
            GoniometerModel::SingleAxis(g) => g.get_setting_rotation(),
            GoniometerModel::MultiAxis(g) => g.get_setting_rotation(),
        }
    }

    /// Borrow the single-axis variant, if that is what this model is.
    pub fn as_single_axis(&self) -> Option<&Goniometer> {
        match self {
            GoniometerModel::SingleAxis(g) => Some(g),
            GoniometerModel::MultiAxis(_) => None,
        }
    }

    /// Borrow the multi-axis variant, if that is what this model is.
    pub fn as_multi_axis(&self) -> Option<&MultiAxisGoniometer> {
        match self {
            GoniometerModel::SingleAxis(_) => None,
            GoniometerModel::MultiAxis(g) => Some(g),
        }
    }

    /// Serialize to the flat key-value dictionary representation.
    pub fn to_dict(&self) -> Value {
        match self {
            GoniometerModel::SingleAxis(g) => g.to_dict(),
            GoniometerModel::MultiAxis(g) => g.to_dict(),
        }
    }

    /// Deserialize from the flat key-value dictionary representation,
    /// recovering the variant from the structural discriminator.
    pub fn from_dict(value: &Value) -> GonioResult<Self> {
        let obj = value
            .as_object()
            .ok_or_else(|| GonioError::Dictionary("expected a dictionary".into()))?;
        let is_multi = Self::MULTI_AXIS_KEYS
            .iter()
            .all(|key| obj.contains_key(*key));
        if is_multi {
            MultiAxisGoniometer::from_dict(value).map(GoniometerModel::MultiAxis)
        } else {
            Goniometer::from_dict(value).map(GoniometerModel::SingleAxis)
        }
    }
}

impl From<Goniometer> for GoniometerModel {
    fn from(value: Goniometer) -> Self {
        GoniometerModel::SingleAxis(value)
    }
}

impl From<MultiAxisGoniometer> for GoniometerModel {
    fn from(value: MultiAxisGoniometer) -> Self {
        GoniometerModel::MultiAxis(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn kappa_chain(scan_axis: usize) -> MultiAxisGoniometer {
        let alpha = 50.0_f64.to_radians();
        MultiAxisGoniometer::new(
            vec![
                Vector3::x(),
                Vector3::new(alpha.cos(), alpha.sin(), 0.0),
                Vector3::x(),
            ],
            vec![45.0, 30.0, 90.0],
            vec!["PHI".into(), "KAPPA".into(), "OMEGA".into()],
            scan_axis,
        )
        .unwrap()
    }

    #[test]
    fn test_default_is_canonical_frame() {
        let g = Goniometer::default();
        assert_eq!(g.get_rotation_axis_datum(), Vector3::x());
        assert_eq!(g.get_fixed_rotation(), Matrix3::identity());
        assert_eq!(g.get_setting_rotation(), Matrix3::identity());
    }

    #[test]
    fn test_rotation_axis_applies_setting_rotation() {
        // Setting rotation of 90 degrees about z sends +x to +y.
        let setting = axis_rotation(&Vector3::z(), 90.0);
        let g = Goniometer::with_rotations(Vector3::x(), Matrix3::identity(), setting);
        assert_relative_eq!(g.get_rotation_axis(), Vector3::y(), epsilon = 1e-12);
        assert_eq!(g.get_rotation_axis_datum(), Vector3::x());
    }

    #[test]
    fn test_single_axis_dict_round_trip() {
        let g = Goniometer::with_rotations(
            Vector3::new(0.0, 1.0, 0.0),
            axis_rotation(&Vector3::z(), 12.5),
            axis_rotation(&Vector3::x(), -3.0),
        );
        let restored = Goniometer::from_dict(&g.to_dict()).unwrap();
        assert_eq!(g, restored);
    }

    #[test]
    fn test_single_axis_dict_has_no_multi_axis_discriminator() {
        let dict = Goniometer::default().to_dict();
        let obj = dict.as_object().unwrap();
        assert!(!obj.contains_key("axes"));
        assert!(!obj.contains_key("angles"));
        assert!(!obj.contains_key("scan_axis"));
    }

    #[test]
    fn test_single_axis_dict_defaults_matrices_to_identity() {
        let dict = json!({ "rotation_axis": [0.0, 0.0, 1.0] });
        let g = Goniometer::from_dict(&dict).unwrap();
        assert_eq!(g.get_fixed_rotation(), Matrix3::identity());
        assert_eq!(g.get_setting_rotation(), Matrix3::identity());
    }

    #[test]
    fn test_single_axis_dict_requires_rotation_axis() {
        let dict = json!({ "fixed_rotation": [1.0, 0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0] });
        let err = Goniometer::from_dict(&dict).unwrap_err();
        assert!(matches!(err, GonioError::Dictionary(_)));
    }

    #[test]
    fn test_multi_axis_length_invariant() {
        let err = MultiAxisGoniometer::new(
            vec![Vector3::x(), Vector3::y()],
            vec![0.0],
            vec![String::new(), String::new()],
            0,
        )
        .unwrap_err();
        assert!(matches!(
            err,
            GonioError::DimensionMismatch {
                context: "angles",
                expected: 2,
                got: 1
            }
        ));
    }

    #[test]
    fn test_multi_axis_rejects_empty_chain() {
        let err = MultiAxisGoniometer::new(vec![], vec![], vec![], 0).unwrap_err();
        assert!(matches!(err, GonioError::Configuration(_)));
    }

    #[test]
    fn test_multi_axis_rejects_out_of_range_scan_axis() {
        let err = MultiAxisGoniometer::new(
            vec![Vector3::x()],
            vec![0.0],
            vec!["OMEGA".into()],
            1,
        )
        .unwrap_err();
        assert!(matches!(err, GonioError::Configuration(_)));
    }

    #[test]
    fn test_composition_scan_axis_at_base() {
        let g = kappa_chain(2);
        // Nothing sits outside the scan axis.
        assert_eq!(g.get_setting_rotation(), Matrix3::identity());
        assert_eq!(g.get_rotation_axis_datum(), Vector3::x());
        // Crystal-side axes fold into the fixed rotation, kappa after phi.
        let expected = axis_rotation(&g.get_axes()[1], 30.0) * axis_rotation(&Vector3::x(), 45.0);
        assert_relative_eq!(g.get_fixed_rotation(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_composition_scan_axis_at_crystal() {
        let g = kappa_chain(0);
        // Nothing sits on the crystal side of the scan axis.
        assert_eq!(g.get_fixed_rotation(), Matrix3::identity());
        let expected = axis_rotation(&Vector3::x(), 90.0) * axis_rotation(&g.get_axes()[1], 30.0);
        assert_relative_eq!(g.get_setting_rotation(), expected, epsilon = 1e-12);
    }

    #[test]
    fn test_mutators_recompute_composition() {
        let mut g = kappa_chain(2);
        g.set_angles(vec![0.0, 0.0, 0.0]).unwrap();
        assert_eq!(g.get_fixed_rotation(), Matrix3::identity());

        let err = g.set_angles(vec![0.0, 0.0]).unwrap_err();
        assert!(matches!(
            err,
            GonioError::DimensionMismatch {
                context: "angles",
                expected: 3,
                got: 2
            }
        ));
    }

    #[test]
    fn test_multi_axis_dict_round_trip() {
        let g = kappa_chain(2);
        let restored = MultiAxisGoniometer::from_dict(&g.to_dict()).unwrap();
        assert_eq!(g, restored);
    }

    #[test]
    fn test_model_dict_discriminator() {
        let multi = GoniometerModel::from(kappa_chain(2));
        let restored = GoniometerModel::from_dict(&multi.to_dict()).unwrap();
        assert_eq!(multi, restored);
        assert!(restored.as_multi_axis().is_some());

        let single = GoniometerModel::from(Goniometer::default());
        let restored = GoniometerModel::from_dict(&single.to_dict()).unwrap();
        assert_eq!(single, restored);
        assert!(restored.as_single_axis().is_some());
    }

    #[test]
    fn test_partial_discriminator_reads_as_single_axis() {
        // Dropping scan_axis from a multi-axis dictionary leaves the
        // single-axis keys, which still form a valid single-axis model.
        let mut dict = kappa_chain(2).to_dict();
        dict.as_object_mut().unwrap().remove("scan_axis");
        let model = GoniometerModel::from_dict(&dict).unwrap();
        assert!(model.as_single_axis().is_some());
    }
}
