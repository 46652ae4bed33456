//! Projecting a mosaic-frame catalog into one contributing frame.
//!
//! Every source row is classified exactly once: its position (and a probe
//! point displaced along its position angle) is projected from the mosaic
//! pixel frame through sky coordinates into the frame's pixel system. Rows
//! landing inside the frame's bounds keep their place with corrected
//! position and re-measured angle; rows landing outside are dropped. A row
//! falling inside no frame at all is a legitimate outcome, not an error.

use std::path::PathBuf;

use tracing::{debug, info};

use crate::catalog::Catalog;
use crate::error::PrepError;
use crate::frames::{FrameBounds, FrameDescriptor};
use crate::geometry::{displaced_point, project_between, recompute_angle};
use crate::wcs::SkyProjection;

/// Outcome of one frame's projection.
#[derive(Debug, Clone)]
pub struct ProjectionReport {
    /// The output catalog file, `<root>_<ext_ver>.cat`.
    pub output: PathBuf,
    /// Source rows examined.
    pub rows_in: usize,
    /// Rows accepted into the frame.
    pub rows_out: usize,
}

/// Projects one mosaic-derived catalog into one contributing frame.
pub struct CatalogProjector<'a, M, F> {
    pub frame: &'a FrameDescriptor,
    pub bounds: FrameBounds,
    pub mosaic_wcs: &'a M,
    pub frame_wcs: &'a F,
}

impl<M: SkyProjection, F: SkyProjection> CatalogProjector<'_, M, F> {
    /// Classify, correct, and filter the rows of `catalog`.
    ///
    /// The caller hands over a fresh copy of the source catalog; the
    /// returned catalog contains only the rows belonging to this frame,
    /// with corrected `X_IMAGE`/`Y_IMAGE`/`THETA_IMAGE`.
    pub fn project(&self, mut catalog: Catalog) -> Result<Catalog, PrepError> {
        let mut keep = vec![false; catalog.len()];

        for index in 0..catalog.len() {
            let (x, y) = catalog.position(index)?;
            let theta = catalog.theta(index)?;

            let projected =
                project_between(self.mosaic_wcs, self.frame_wcs, (x, y))?;
            let probe = project_between(
                self.mosaic_wcs,
                self.frame_wcs,
                displaced_point(x, y, theta),
            )?;

            if self.bounds.contains(projected.0, projected.1) {
                catalog.set_position(index, projected.0, projected.1);
                catalog.set_theta(index, recompute_angle(projected, probe));
                keep[index] = true;
            } else {
                debug!(
                    "object {} projects to ({:.2}, {:.2}), outside {}",
                    index + 1,
                    projected.0,
                    projected.1,
                    self.frame.display(),
                );
            }
        }

        catalog.retain_rows(&keep);
        Ok(catalog)
    }

    /// Project `catalog` and write the result to
    /// `<root>_<ext_ver>.cat`, overwriting any existing file.
    pub fn run(&self, catalog: Catalog) -> Result<ProjectionReport, PrepError> {
        let output = self.frame.catalog_name();
        let rows_in = catalog.len();
        info!(
            "Working on input object list {} ({} objects)",
            output.display(),
            rows_in,
        );

        let projected = self.project(catalog)?;
        projected.write(&output)?;

        info!(
            "Catalog {} written with {} entries",
            output.display(),
            projected.len(),
        );
        Ok(ProjectionReport {
            output,
            rows_in,
            rows_out: projected.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frames::Margins;
    use crate::wcs::TanWcs;
    use nalgebra::Matrix2;
    use std::path::Path;

    const CATALOG: &str = "\
#   1 NUMBER
#   2 X_IMAGE
#   3 Y_IMAGE
#   4 THETA_IMAGE
#   5 MAG_AUTO
1 300.0 400.0 45.0 18.3
2 600.0 500.0 0.0 19.1
3 1800.0 300.0 -30.0 20.5
";

    // 2000-wide mosaic; a 1000-wide frame whose reference pixel names the
    // same sky position as mosaic pixel (500.5, 500.5).
    fn mosaic_wcs() -> TanWcs {
        let cd = Matrix2::new(1e-5, 0.0, 0.0, 1e-5);
        TanWcs::new("moz.fits", [1000.5, 500.5], [150.0, 2.0], cd).unwrap()
    }

    fn frame_wcs() -> TanWcs {
        let cd = Matrix2::new(1e-5, 0.0, 0.0, 1e-5);
        let (ra, dec) = mosaic_wcs().pixel_to_sky(500.5, 500.5).unwrap();
        TanWcs::new("a.fits", [500.5, 500.5], [ra, dec], cd).unwrap()
    }

    fn projector<'a>(
        frame: &'a FrameDescriptor,
        mosaic: &'a TanWcs,
        fwcs: &'a TanWcs,
    ) -> CatalogProjector<'a, TanWcs, TanWcs> {
        CatalogProjector {
            frame,
            bounds: FrameBounds::from_dimensions((1000, 1000), Margins::default()),
            mosaic_wcs: mosaic,
            frame_wcs: fwcs,
        }
    }

    #[test]
    fn rows_inside_are_corrected_and_outside_dropped() {
        let frame = FrameDescriptor::parse("a.fits[sci,1]").unwrap();
        let mosaic = mosaic_wcs();
        let fwcs = frame_wcs();
        let catalog = Catalog::parse(CATALOG, Path::new("src.cat")).unwrap();

        let result = projector(&frame, &mosaic, &fwcs).project(catalog).unwrap();

        // Objects 1 and 2 land in the frame; object 3 projects to
        // x ≈ 1800 and is dropped.
        assert_eq!(result.len(), 2);
        let (x, y) = result.position(0).unwrap();
        assert!((x - 300.0).abs() < 0.01, "x: {}", x);
        assert!((y - 400.0).abs() < 0.01, "y: {}", y);

        // The aligned, equal-scale frames preserve angles up to
        // projection curvature.
        let theta = result.theta(0).unwrap();
        assert!((theta - 45.0).abs() < 0.1, "theta: {}", theta);

        // Pass-through column survives
        assert_eq!(result.rows()[0].cells()[4], "18.3");
        assert_eq!(result.rows()[1].cells()[0], "2");
    }

    #[test]
    fn accepted_rows_lie_within_bounds() {
        let frame = FrameDescriptor::parse("a.fits[sci,1]").unwrap();
        let mosaic = mosaic_wcs();
        let fwcs = frame_wcs();
        let catalog = Catalog::parse(CATALOG, Path::new("src.cat")).unwrap();

        let p = projector(&frame, &mosaic, &fwcs);
        let result = p.project(catalog).unwrap();
        for index in 0..result.len() {
            let (x, y) = result.position(index).unwrap();
            assert!(p.bounds.contains(x, y), "row {index} at ({x}, {y})");
        }
    }

    #[test]
    fn empty_catalog_projects_to_empty() {
        let frame = FrameDescriptor::parse("a.fits[sci,1]").unwrap();
        let mosaic = mosaic_wcs();
        let fwcs = frame_wcs();
        let empty = Catalog::parse(
            "# 1 X_IMAGE\n# 2 Y_IMAGE\n# 3 THETA_IMAGE\n",
            Path::new("empty.cat"),
        )
        .unwrap();

        let result = projector(&frame, &mosaic, &fwcs).project(empty).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn run_writes_the_frame_catalog() {
        let dir = tempfile::tempdir().unwrap();
        let root = dir.path().join("a");
        let descriptor = format!("{}.fits[sci,1]", root.display());
        let frame = FrameDescriptor::parse(&descriptor).unwrap();
        let mosaic = mosaic_wcs();
        let fwcs = frame_wcs();
        let catalog = Catalog::parse(CATALOG, Path::new("src.cat")).unwrap();

        let report = projector(&frame, &mosaic, &fwcs).run(catalog).unwrap();
        assert_eq!(report.rows_in, 3);
        assert_eq!(report.rows_out, 2);
        assert_eq!(report.output, dir.path().join("a_1.cat"));

        let written = Catalog::read(&report.output).unwrap();
        assert_eq!(written.len(), 2);
    }
}
