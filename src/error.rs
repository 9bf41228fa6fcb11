//! Error types for goniometer model construction.
//!
//! All errors in this crate are construction-time validation failures. A
//! failed construction never returns a partial model: the error is raised
//! synchronously at the point of detection and reported to the caller.
//!
//! Errors fall into two broad categories:
//!
//! 1. **Parameter-contract violations** - [`GonioError::ConflictingAxisSpec`],
//!    [`GonioError::DimensionMismatch`], [`GonioError::ImmutableScanAxis`],
//!    [`GonioError::InvalidDirection`] and the generic
//!    [`GonioError::Configuration`] - the caller supplied an inconsistent
//!    combination of options.
//! 2. **Malformed header data** - [`GonioError::HeaderInconsistency`],
//!    [`GonioError::AmbiguousScanAxis`], [`GonioError::MalformedAxisGraph`],
//!    [`GonioError::Dictionary`] - the instrument header (or a serialized
//!    model) is internally inconsistent. These are fatal because no safe
//!    default rotation model exists for a broken header.

use thiserror::Error;

/// Convenience alias for results using the crate error type.
pub type GonioResult<T> = std::result::Result<T, GonioError>;

/// Primary error type for goniometer model construction.
#[derive(Error, Debug)]
pub enum GonioError {
    /// Both the `axis` and `axes` options were supplied.
    ///
    /// The two options are alternative spellings of the same concept; exactly
    /// one may be set per construction call.
    #[error("only one of 'axis' or 'axes' may be set")]
    ConflictingAxisSpec,

    /// A sequence-valued parameter did not match the expected length.
    ///
    /// Overrides must match the expected or existing length exactly; values
    /// are never silently truncated or padded.
    #[error("number of values for '{context}' must be {expected}, got {got}")]
    DimensionMismatch {
        /// Name of the offending option or field.
        context: &'static str,
        /// Length required by the model or reference being overridden.
        expected: usize,
        /// Length actually supplied.
        got: usize,
    },

    /// Attempted to override the scan axis of an existing multi-axis model.
    ///
    /// The scan axis may be set at fresh construction only; overriding it on
    /// a reference model fails unconditionally, even when the supplied value
    /// equals the current one.
    #[error("cannot override the scan axis of an existing multi-axis goniometer")]
    ImmutableScanAxis,

    /// Unrecognized kappa arm direction.
    #[error("invalid kappa direction '{0}' (expected one of +y, +z, -y, -z)")]
    InvalidDirection(String),

    /// The header's axis and scan-axis tables disagree.
    ///
    /// Every goniometer axis with a direction vector must also carry scan
    /// data, and vice versa.
    #[error(
        "the number of goniometer axes with direction vectors ({vectors}) does not match \
         the number with scan settings ({scan_settings})"
    )]
    HeaderInconsistency {
        /// Axes carrying a direction vector.
        vectors: usize,
        /// Axes carrying a scan setting.
        scan_settings: usize,
    },

    /// More than one axis carries a nonzero angle increment.
    #[error("more than one scan axis is defined: {}", .0.join(", "))]
    AmbiguousScanAxis(Vec<String>),

    /// The axis dependency data does not form a single chain from the root.
    ///
    /// Cyclic or disconnected `depends_on` relationships leave the walk from
    /// the sentinel root with a chain shorter (or longer) than the axis set.
    #[error("malformed axis dependency graph: resolved {resolved} of {expected} axes from the root")]
    MalformedAxisGraph {
        /// Number of axes reached by the root walk.
        resolved: usize,
        /// Number of axes in the header.
        expected: usize,
    },

    /// An option combination that is not meaningful for the selected model.
    ///
    /// Covers the remaining contract violations: multi-axis-only options
    /// supplied to a single-axis construction, single-axis-only rotation
    /// matrices supplied to a multi-axis construction, and similar.
    #[error("invalid goniometer configuration: {0}")]
    Configuration(String),

    /// A serialized goniometer dictionary was malformed.
    #[error("malformed goniometer dictionary: {0}")]
    Dictionary(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimension_mismatch_display() {
        let err = GonioError::DimensionMismatch {
            context: "angles",
            expected: 3,
            got: 2,
        };
        assert_eq!(
            err.to_string(),
            "number of values for 'angles' must be 3, got 2"
        );
    }

    #[test]
    fn test_ambiguous_scan_axis_lists_all_offenders() {
        let err = GonioError::AmbiguousScanAxis(vec!["OMEGA".into(), "PHI".into()]);
        let msg = err.to_string();
        assert!(msg.contains("OMEGA"));
        assert!(msg.contains("PHI"));
    }
}
