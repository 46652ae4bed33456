//! # grismprep
//!
//! Input staging and **catalog back-projection** for slitless-spectroscopy
//! reduction pipelines.
//!
//! A drizzled grism mosaic combines several exposures into one frame, and
//! object detection runs once on that mosaic. The extraction tools,
//! however, work per exposure: each one needs an input object list in its
//! own pixel system. This crate recovers those lists — it reads the
//! mosaic's provenance header, projects every catalog object back through
//! sky coordinates into each contributing frame, re-measures position
//! angles under the (generally non-linear) transform, and writes one
//! filtered catalog per frame.
//!
//! ## Example
//!
//! ```no_run
//! use std::path::Path;
//!
//! use grismprep::{make_object_lists, BatchConfig, Margins, MemoryArchive, TanWcs};
//! use nalgebra::Matrix2;
//!
//! // Register the mosaic and its exposures with header values parsed by
//! // whatever FITS reader the environment uses.
//! let mut archive = MemoryArchive::new();
//! archive.insert_primary_keyword("big_drz.fits", "D001DATA", "expo1.fits[sci,1]");
//! archive.insert_mosaic_wcs(
//!     "big_drz.fits",
//!     TanWcs::new(
//!         "big_drz.fits",
//!         [2048.5, 1024.5],
//!         [150.1, 2.3],
//!         Matrix2::new(-1.1e-5, 0.0, 0.0, 1.1e-5),
//!     )?,
//! );
//! archive.insert_extension(
//!     "expo1.fits",
//!     "sci",
//!     1,
//!     (1014, 1014),
//!     TanWcs::new(
//!         "expo1.fits",
//!         [507.0, 507.0],
//!         [150.08, 2.29],
//!         Matrix2::new(-1.1e-5, 2.0e-7, 2.0e-7, 1.1e-5),
//!     )?,
//! );
//!
//! let config = BatchConfig {
//!     margins: Margins::parse("5,5,5,5")?,
//!     ..Default::default()
//! };
//! let reports = make_object_lists(
//!     &archive,
//!     Path::new("big_drz.fits"),
//!     Path::new("big_drz.cat"),
//!     &config,
//! )?;
//! for report in &reports {
//!     println!(
//!         "{}: {} of {} objects",
//!         report.output.display(),
//!         report.rows_out,
//!         report.rows_in,
//!     );
//! }
//! # Ok::<(), grismprep::PrepError>(())
//! ```
//!
//! ## How the projection works
//!
//! 1. **Discovery** — the mosaic's primary header records each
//!    contributing exposure under `D001DATA`, `D002DATA`, … as
//!    `<root>.fits[<ext>,<ver>]`; the scan stops at the first absent key.
//! 2. **Bounds** — each frame's native dimensions plus caller-supplied
//!    margins define the pixel rectangle an object must land in (object
//!    centers on an image of width W lie in `[0.5, W + 0.5]`).
//! 3. **Projection** — every object, and a probe point displaced 10 px
//!    along its position angle, is mapped mosaic pixels → sky → frame
//!    pixels through the per-extension WCS solutions.
//! 4. **Selection** — objects inside the bounds keep corrected positions
//!    and the angle of the projected probe offset; the rest are dropped.
//!    Each frame's pass starts from a fresh copy of the source catalog.
//!
//! FITS reading itself stays outside this crate: implement
//! [`ImageArchive`] (or populate [`MemoryArchive`]) with headers parsed by
//! your FITS layer, and supply WCS solutions via [`SkyProjection`] —
//! [`TanWcs`] covers the standard gnomonic case.

pub mod archive;
pub mod batch;
pub mod catalog;
pub mod error;
pub mod frames;
pub mod geometry;
pub mod projection;
pub mod stage;
pub mod wcs;

pub use archive::{ImageArchive, MemoryArchive};
pub use batch::{make_object_lists, BatchConfig, FailurePolicy, FrameReport};
pub use catalog::{Catalog, CatalogRow};
pub use error::PrepError;
pub use frames::{
    compute_bounds, discover_frames, FrameBounds, FrameDescriptor, Margins,
};
pub use geometry::{displaced_point, project_between, recompute_angle};
pub use projection::{CatalogProjector, ProjectionReport};
pub use stage::{require_file, ExtractionTools};
pub use wcs::{SkyProjection, TanWcs};
