//! `gonio-models`
//!
//! Goniometer model construction for diffraction instrument geometry.
//!
//! Diffraction image formats (CBF, SMV, the HDF5/NeXus family) describe the
//! goniometer that oriented the crystal in wildly different ways: some
//! headers carry a full axis table with dependency relationships, some name
//! a single known rotation axis, and some need user overrides on top of
//! either. This crate is the shared construction core those format
//! adapters call into: it turns raw geometric facts into a validated
//! rotation model that downstream geometry code (detector positioning,
//! orientation matrices, scan-angle lookup) can query uniformly.
//!
//! ## Key Types
//!
//! - [`Goniometer`] / [`MultiAxisGoniometer`]: the single-axis and
//!   axis-chain model variants, united under [`GoniometerModel`]
//! - [`GoniometerFactory`]: the construction surface - explicit options,
//!   serialized dictionaries, header-derived axis data, and geometric
//!   presets (canonical single axis, kappa designs)
//! - [`AxisTable`]: header axis rows plus the dependency-graph resolver
//!   that orders them crystal-to-base
//! - [`ModelCache`]: read-through model reuse across the images of a run
//! - [`GonioError`]: construction-time validation failures
//!
//! ## Example
//!
//! ```rust
//! use gonio_models::{AxisTable, Equipment, GoniometerFactory};
//! use nalgebra::Vector3;
//!
//! // A format adapter fills the table while parsing an instrument header.
//! let mut table = AxisTable::new();
//! table.add_axis("GONIOMETER_OMEGA", Equipment::Goniometer, Vector3::x(), AxisTable::ROOT);
//! table.add_axis("GONIOMETER_PHI", Equipment::Goniometer, Vector3::x(), "GONIOMETER_OMEGA");
//! table.add_scan_setting("GONIOMETER_OMEGA", 0.0, 0.1);
//! table.add_scan_setting("GONIOMETER_PHI", 90.0, 0.0);
//!
//! let goniometer = GoniometerFactory::from_axis_table(&table)?;
//! assert_eq!(goniometer.get_names(), &["GONIOMETER_PHI", "GONIOMETER_OMEGA"]);
//! assert_eq!(goniometer.get_scan_axis(), 1);
//! # Ok::<(), gonio_models::GonioError>(())
//! ```

pub mod axis;
pub mod cache;
pub mod error;
pub mod factory;
pub mod goniometer;

pub use axis::{AxisTable, Equipment, ResolvedAxes};
pub use cache::ModelCache;
pub use error::{GonioError, GonioResult};
pub use factory::{GoniometerFactory, GoniometerOptions, KappaDirection};
pub use goniometer::{Goniometer, GoniometerModel, MultiAxisGoniometer};
