//! Batch driver: one input object list per contributing frame.
//!
//! Discovers every exposure recorded in the mosaic's provenance header and
//! projects the mosaic-frame catalog into each one, producing one filtered
//! catalog file per frame. Frames are processed strictly sequentially;
//! each projection starts from a fresh reload of the source catalog, since
//! a frame's pass both rewrites positions and drops rows.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::archive::ImageArchive;
use crate::catalog::Catalog;
use crate::error::PrepError;
use crate::frames::{compute_bounds, discover_frames, FrameDescriptor, Margins};
use crate::projection::CatalogProjector;
use crate::stage::require_file;

/// What to do when a single frame's projection fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Abort the whole batch. The default: the scientific output is not
    /// usable if any exposure's catalog could not be derived.
    #[default]
    Abort,
    /// Log the failure and continue with the remaining frames.
    Skip,
}

/// Batch parameters.
#[derive(Debug, Clone, Default)]
pub struct BatchConfig {
    /// Extra rows/columns accepted on each frame side.
    pub margins: Margins,
    /// Per-frame failure handling.
    pub failure_policy: FailurePolicy,
}

/// Outcome of one frame within a batch.
#[derive(Debug, Clone)]
pub struct FrameReport {
    pub frame: FrameDescriptor,
    /// The output catalog file, `<root>_<ext_ver>.cat`.
    pub output: PathBuf,
    /// Source rows examined.
    pub rows_in: usize,
    /// Rows written for this frame.
    pub rows_out: usize,
}

/// Create one input object list per frame contributing to `mosaic`.
///
/// Validates that the mosaic and the source catalog exist, discovers the
/// contributing frames, and projects a fresh reload of `catalog_path` into
/// each. Returns one [`FrameReport`] per completed frame; under
/// [`FailurePolicy::Abort`] the first frame failure terminates the batch.
pub fn make_object_lists<A: ImageArchive>(
    archive: &A,
    mosaic: &Path,
    catalog_path: &Path,
    config: &BatchConfig,
) -> Result<Vec<FrameReport>, PrepError> {
    if !archive.exists(mosaic) {
        return Err(PrepError::missing("Mosaic image", mosaic));
    }
    require_file(catalog_path, "Input catalog")?;

    let descriptors = discover_frames(archive, mosaic)?;
    info!(
        "{}: {} input object lists will be created",
        mosaic.display(),
        descriptors.len(),
    );

    let mut reports = Vec::with_capacity(descriptors.len());
    for (number, descriptor) in descriptors.iter().enumerate() {
        match project_frame(archive, mosaic, catalog_path, descriptor, config) {
            Ok(report) => reports.push(report),
            Err(err) => match config.failure_policy {
                FailurePolicy::Abort => return Err(err),
                FailurePolicy::Skip => {
                    warn!("skipping frame {} ({}): {}", number + 1, descriptor, err);
                }
            },
        }
    }

    Ok(reports)
}

/// Project the source catalog into a single frame.
fn project_frame<A: ImageArchive>(
    archive: &A,
    mosaic: &Path,
    catalog_path: &Path,
    descriptor: &str,
    config: &BatchConfig,
) -> Result<FrameReport, PrepError> {
    let frame = FrameDescriptor::parse(descriptor)?;
    let bounds = compute_bounds(archive, &frame, config.margins)?;

    let mosaic_wcs = archive.mosaic_wcs(mosaic)?;
    let frame_wcs = archive.wcs(&frame.image_path, &frame.ext_name, frame.ext_ver)?;

    // Fresh reload per frame: every projection starts from the original rows
    let catalog = Catalog::read(catalog_path)?;

    let projector = CatalogProjector {
        frame: &frame,
        bounds,
        mosaic_wcs: &mosaic_wcs,
        frame_wcs: &frame_wcs,
    };
    let report = projector.run(catalog)?;

    Ok(FrameReport {
        frame,
        output: report.output,
        rows_in: report.rows_in,
        rows_out: report.rows_out,
    })
}
