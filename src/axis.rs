//! Goniometer axis table and rotation-graph resolution.
//!
//! Instrument headers describe a goniometer as a set of named rotation axes,
//! each with a direction vector and a `depends_on` reference to the axis it
//! is mounted on (or to the sentinel root `"."` for the base axis). A second
//! table gives each axis a starting angle and an angle increment; the single
//! axis with a nonzero increment is the one scanned during the image
//! sequence.
//!
//! [`AxisTable`] collects both tables as a format adapter parses them, then
//! [`AxisTable::resolve`] walks the dependency chain from the root and
//! produces a [`ResolvedAxes`] in crystal-to-base order, ready for
//! multi-axis goniometer construction.
//!
//! # Example
//!
//! ```rust
//! use gonio_models::axis::{AxisTable, Equipment};
//! use nalgebra::Vector3;
//!
//! let mut table = AxisTable::new();
//! table.add_axis("OMEGA", Equipment::Goniometer, Vector3::x(), AxisTable::ROOT);
//! table.add_axis("PHI", Equipment::Goniometer, Vector3::x(), "OMEGA");
//! table.add_scan_setting("OMEGA", 45.0, 0.5);
//! table.add_scan_setting("PHI", 0.0, 0.0);
//!
//! let resolved = table.resolve()?;
//! // Crystal-to-base order: PHI first, OMEGA (the base and scan axis) last.
//! assert_eq!(resolved.names, vec!["PHI", "OMEGA"]);
//! assert_eq!(resolved.scan_axis, 1);
//! # Ok::<(), gonio_models::GonioError>(())
//! ```

use std::collections::HashMap;

use nalgebra::Vector3;

use crate::error::{GonioError, GonioResult};

/// Equipment role carried by a header axis row.
///
/// Headers describe every mechanical axis of the instrument; only rows whose
/// role is `Goniometer` participate in rotation-model construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Equipment {
    /// Sample rotation stage axis.
    Goniometer,
    /// Detector positioning axis.
    Detector,
    /// General-purpose axis (e.g. the laboratory frame).
    General,
    /// Any role this crate does not recognize.
    Other,
}

impl From<&str> for Equipment {
    fn from(value: &str) -> Self {
        match value {
            "goniometer" => Equipment::Goniometer,
            "detector" => Equipment::Detector,
            "general" => Equipment::General,
            _ => Equipment::Other,
        }
    }
}

/// Starting angle and per-image increment of one axis, in degrees.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ScanSetting {
    start_angle: f64,
    angle_increment: f64,
}

/// Axis chain resolved into crystal-to-base order.
///
/// Index 0 is the axis closest to the sample; the last index is the
/// outermost axis, mounted on the goniometer base.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedAxes {
    /// Axis names, crystal-to-base.
    pub names: Vec<String>,
    /// Axis direction vectors, same order as `names`.
    pub axes: Vec<Vector3<f64>>,
    /// Starting angles in degrees, same order as `names`.
    pub angles: Vec<f64>,
    /// Index of the scanned axis, or 0 for a still exposure.
    pub scan_axis: usize,
}

/// Collects goniometer axis rows from an instrument header.
///
/// The table owns the raw geometric facts for exactly one resolution pass:
/// direction vectors, reversed dependency edges, and scan settings. It is
/// built row by row as the format adapter walks the header, then consumed
/// through [`AxisTable::resolve`].
#[derive(Debug, Clone, Default)]
pub struct AxisTable {
    /// Direction vector per goniometer axis.
    vectors: HashMap<String, Vector3<f64>>,
    /// Reversed dependency edges: `dependants[parent] = child`.
    ///
    /// "Axis X depends on axis Y" is recorded as `dependants[Y] = X`, which
    /// makes the base-to-crystal walk from the root a plain map lookup.
    dependants: HashMap<String, String>,
    /// Scan setting per goniometer axis.
    scan: HashMap<String, ScanSetting>,
}

impl AxisTable {
    /// Sentinel `depends_on` value marking the goniometer base.
    pub const ROOT: &'static str = ".";

    /// Create an empty axis table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one axis row from the header's axis table.
    ///
    /// Rows whose equipment role is not [`Equipment::Goniometer`] are
    /// dropped. `depends_on` names the axis this one is mounted on, or
    /// [`AxisTable::ROOT`] for the base axis.
    pub fn add_axis(
        &mut self,
        name: impl Into<String>,
        equipment: Equipment,
        vector: Vector3<f64>,
        depends_on: impl Into<String>,
    ) {
        let name = name.into();
        if equipment != Equipment::Goniometer {
            tracing::trace!(axis = %name, ?equipment, "skipping non-goniometer axis row");
            return;
        }
        self.dependants.insert(depends_on.into(), name.clone());
        self.vectors.insert(name, vector);
    }

    /// Record one row from the header's scan-axis table.
    ///
    /// Rows naming an axis without a direction vector (detector axes, or
    /// goniometer axes filtered out earlier) are ignored, matching the
    /// header convention that the scan table covers all moving equipment.
    pub fn add_scan_setting(&mut self, name: &str, start_angle: f64, angle_increment: f64) {
        if !self.vectors.contains_key(name) {
            tracing::trace!(axis = %name, "skipping scan setting for unknown axis");
            return;
        }
        self.scan.insert(
            name.to_owned(),
            ScanSetting {
                start_angle,
                angle_increment,
            },
        );
    }

    /// Number of goniometer axes recorded so far.
    pub fn len(&self) -> usize {
        self.vectors.len()
    }

    /// Whether any goniometer axis has been recorded.
    pub fn is_empty(&self) -> bool {
        self.vectors.is_empty()
    }

    /// Resolve the dependency graph into a crystal-to-base axis chain.
    ///
    /// The walk starts at the sentinel root and repeatedly follows the
    /// reversed dependency edges, collecting axes in base-to-crystal order;
    /// the result is reversed to the crystal-to-base convention required by
    /// the multi-axis goniometer model. The walk is capped at the known axis
    /// count, so cyclic dependency data terminates with an error instead of
    /// looping.
    ///
    /// # Errors
    ///
    /// - [`GonioError::HeaderInconsistency`] when the axis and scan tables
    ///   cover different axis sets.
    /// - [`GonioError::AmbiguousScanAxis`] when two or more axes carry a
    ///   nonzero angle increment.
    /// - [`GonioError::MalformedAxisGraph`] when the chain reachable from
    ///   the root does not cover the axis set exactly (disconnected or
    ///   cyclic `depends_on` data).
    pub fn resolve(&self) -> GonioResult<ResolvedAxes> {
        if self.vectors.len() != self.scan.len() {
            return Err(GonioError::HeaderInconsistency {
                vectors: self.vectors.len(),
                scan_settings: self.scan.len(),
            });
        }

        let mut scanned: Vec<&str> = self
            .scan
            .iter()
            .filter(|(_, setting)| setting.angle_increment != 0.0)
            .map(|(name, _)| name.as_str())
            .collect();
        if scanned.len() > 1 {
            scanned.sort_unstable();
            return Err(GonioError::AmbiguousScanAxis(
                scanned.into_iter().map(str::to_owned).collect(),
            ));
        }
        let scan_name = scanned.pop();

        // Walk base-to-crystal from the sentinel root.
        let expected = self.vectors.len();
        let mut base_to_tip: Vec<&str> = Vec::with_capacity(expected);
        let mut current = Self::ROOT;
        while let Some(child) = self.dependants.get(current) {
            if base_to_tip.len() == expected {
                return Err(GonioError::MalformedAxisGraph {
                    resolved: expected + 1,
                    expected,
                });
            }
            base_to_tip.push(child.as_str());
            current = child.as_str();
        }
        if base_to_tip.len() != expected {
            return Err(GonioError::MalformedAxisGraph {
                resolved: base_to_tip.len(),
                expected,
            });
        }

        // Multi-axis goniometers take axes as viewed from crystal to base,
        // the reverse of the walk order.
        let names: Vec<String> = base_to_tip.iter().rev().map(|&s| s.to_owned()).collect();
        let mut axes = Vec::with_capacity(expected);
        let mut angles = Vec::with_capacity(expected);
        for name in &names {
            let vector = self.vectors.get(name).ok_or(GonioError::MalformedAxisGraph {
                resolved: axes.len(),
                expected,
            })?;
            let setting = self.scan.get(name).ok_or(GonioError::HeaderInconsistency {
                vectors: self.vectors.len(),
                scan_settings: self.scan.len(),
            })?;
            axes.push(*vector);
            angles.push(setting.start_angle);
        }

        // A header without a scanned axis is a still exposure; the scan axis
        // index defaults to 0 in that case.
        let scan_axis = match scan_name {
            Some(name) => names
                .iter()
                .position(|n| n == name)
                .ok_or(GonioError::HeaderInconsistency {
                    vectors: self.vectors.len(),
                    scan_settings: self.scan.len(),
                })?,
            None => 0,
        };

        tracing::debug!(chain = ?names, scan_axis, "resolved goniometer axis chain");

        Ok(ResolvedAxes {
            names,
            axes,
            angles,
            scan_axis,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn two_axis_table() -> AxisTable {
        let mut table = AxisTable::new();
        table.add_axis("A", Equipment::Goniometer, Vector3::x(), AxisTable::ROOT);
        table.add_axis("B", Equipment::Goniometer, Vector3::y(), "A");
        table
    }

    #[test]
    fn test_resolves_crystal_to_base_order() {
        let mut table = two_axis_table();
        table.add_scan_setting("A", 0.0, 0.0);
        table.add_scan_setting("B", 10.0, 1.0);

        let resolved = table.resolve().unwrap();
        // Base-to-tip walk from the root gives [A, B]; reversed gives [B, A].
        assert_eq!(resolved.names, vec!["B", "A"]);
        assert_eq!(resolved.axes, vec![Vector3::y(), Vector3::x()]);
        assert_eq!(resolved.angles, vec![10.0, 0.0]);
        assert_eq!(resolved.scan_axis, 0);
    }

    #[test]
    fn test_scan_axis_index_follows_reversal() {
        let mut table = two_axis_table();
        table.add_scan_setting("A", 0.0, 0.5);
        table.add_scan_setting("B", 10.0, 0.0);

        let resolved = table.resolve().unwrap();
        assert_eq!(resolved.names, vec!["B", "A"]);
        // A is the scanned axis; after reversal it sits at index 1.
        assert_eq!(resolved.scan_axis, 1);
    }

    #[test]
    fn test_still_exposure_defaults_scan_axis_to_zero() {
        let mut table = two_axis_table();
        table.add_scan_setting("A", 0.0, 0.0);
        table.add_scan_setting("B", 0.0, 0.0);

        let resolved = table.resolve().unwrap();
        assert_eq!(resolved.scan_axis, 0);
    }

    #[test]
    fn test_non_goniometer_rows_are_filtered() {
        let mut table = two_axis_table();
        table.add_axis("TWO_THETA", Equipment::Detector, Vector3::x(), AxisTable::ROOT);
        assert_eq!(table.len(), 2);

        // Scan settings for filtered axes are ignored too.
        table.add_scan_setting("TWO_THETA", 0.0, 0.0);
        table.add_scan_setting("A", 0.0, 0.0);
        table.add_scan_setting("B", 0.0, 0.0);
        assert!(table.resolve().is_ok());
    }

    #[test]
    fn test_mismatched_tables_rejected() {
        let mut table = two_axis_table();
        table.add_scan_setting("A", 0.0, 0.0);

        let err = table.resolve().unwrap_err();
        assert!(matches!(
            err,
            GonioError::HeaderInconsistency {
                vectors: 2,
                scan_settings: 1
            }
        ));
    }

    #[test]
    fn test_two_scan_axes_rejected() {
        let mut table = two_axis_table();
        table.add_scan_setting("A", 0.0, 1.0);
        table.add_scan_setting("B", 0.0, 0.5);

        let err = table.resolve().unwrap_err();
        match err {
            GonioError::AmbiguousScanAxis(names) => {
                assert_eq!(names, vec!["A".to_string(), "B".to_string()]);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_disconnected_graph_rejected() {
        let mut table = AxisTable::new();
        table.add_axis("A", Equipment::Goniometer, Vector3::x(), AxisTable::ROOT);
        // B depends on an axis that does not exist, so it is unreachable.
        table.add_axis("B", Equipment::Goniometer, Vector3::y(), "GHOST");
        table.add_scan_setting("A", 0.0, 0.0);
        table.add_scan_setting("B", 0.0, 0.0);

        let err = table.resolve().unwrap_err();
        assert!(matches!(
            err,
            GonioError::MalformedAxisGraph {
                resolved: 1,
                expected: 2
            }
        ));
    }

    #[test]
    fn test_cyclic_graph_rejected() {
        let mut table = AxisTable::new();
        table.add_axis("A", Equipment::Goniometer, Vector3::x(), AxisTable::ROOT);
        table.add_axis("B", Equipment::Goniometer, Vector3::y(), "A");
        // A also claims to depend on B, closing a cycle through the chain.
        table.add_axis("A", Equipment::Goniometer, Vector3::x(), "B");
        table.add_scan_setting("A", 0.0, 0.0);
        table.add_scan_setting("B", 0.0, 0.0);

        let err = table.resolve().unwrap_err();
        assert!(matches!(err, GonioError::MalformedAxisGraph { .. }));
    }

    #[test]
    fn test_equipment_parsing() {
        assert_eq!(Equipment::from("goniometer"), Equipment::Goniometer);
        assert_eq!(Equipment::from("detector"), Equipment::Detector);
        assert_eq!(Equipment::from("general"), Equipment::General);
        assert_eq!(Equipment::from("cryostat"), Equipment::Other);
    }
}
