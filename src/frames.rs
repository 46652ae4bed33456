//! Resolving contributing frames from mosaic provenance.
//!
//! A drizzled mosaic records each contributing exposure in its primary
//! header under `D001DATA`, `D002DATA`, … (dense, 1-based). Each value is a
//! frame descriptor of the form `<root>.fits[<ext_name>,<ext_ver>]` naming
//! the exposure file and the calibrated extension that went into the
//! combination. This module parses those descriptors and derives, per
//! frame, the pixel rectangle a projected object must fall in to belong to
//! that frame.

use std::path::{Path, PathBuf};

use crate::archive::ImageArchive;
use crate::error::PrepError;

/// One contributing exposure, parsed from a mosaic provenance entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameDescriptor {
    /// Image filename without the `.fits` suffix.
    pub root: String,
    /// Image filename, `<root>.fits`.
    pub image_path: PathBuf,
    /// Extension name, e.g. `sci`.
    pub ext_name: String,
    /// Extension version, 1-based.
    pub ext_ver: u32,
}

impl FrameDescriptor {
    /// Parse a provenance entry of the form `<root>.fits[<name>,<ver>]`.
    pub fn parse(descriptor: &str) -> Result<Self, PrepError> {
        let malformed = |reason: &str| PrepError::MalformedDescriptor {
            descriptor: descriptor.to_string(),
            reason: reason.to_string(),
        };

        let (root, rest) = descriptor
            .split_once(".fits")
            .ok_or_else(|| malformed("no '.fits' filename marker"))?;
        let inner = rest
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| malformed("no bracketed extension spec"))?;
        let (ext_name, ext_ver) = inner
            .split_once(',')
            .ok_or_else(|| malformed("extension spec must be '<name>,<version>'"))?;
        let ext_ver: u32 = ext_ver
            .trim()
            .parse()
            .map_err(|_| malformed("extension version must be an integer"))?;
        if ext_ver == 0 {
            return Err(malformed("extension version must be >= 1"));
        }

        Ok(Self {
            root: root.to_string(),
            image_path: PathBuf::from(format!("{root}.fits")),
            ext_name: ext_name.trim().to_string(),
            ext_ver,
        })
    }

    /// Name of the per-frame output catalog, `<root>_<ext_ver>.cat`.
    pub fn catalog_name(&self) -> PathBuf {
        PathBuf::from(format!("{}_{}.cat", self.root, self.ext_ver))
    }

    /// Display form `<root>.fits[<name>,<ver>]`.
    pub fn display(&self) -> String {
        format!("{}.fits[{},{}]", self.root, self.ext_name, self.ext_ver)
    }
}

// ── Margins ────────────────────────────────────────────────────────────────

/// Extra rows/columns accepted on each side of a frame, in pixels.
///
/// Positive margins admit objects slightly outside the exposure (their
/// spectra may still disperse onto it).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Margins {
    pub left: u32,
    pub right: u32,
    pub bottom: u32,
    pub top: u32,
}

impl Margins {
    pub fn new(left: u32, right: u32, bottom: u32, top: u32) -> Self {
        Self {
            left,
            right,
            bottom,
            top,
        }
    }

    /// Parse a comma-separated margin term, e.g. `"5,0,0,10"`.
    ///
    /// There must be exactly four entries and each must be a non-negative
    /// integer; anything else is a configuration error.
    pub fn parse(term: &str) -> Result<Self, PrepError> {
        let entries: Vec<&str> = term.split(',').collect();
        if entries.len() != 4 {
            return Err(PrepError::Configuration(format!(
                "There must be 4 entries in the term: {term}, not {}!",
                entries.len()
            )));
        }

        let mut values = [0u32; 4];
        for (value, entry) in values.iter_mut().zip(&entries) {
            *value = entry.trim().parse().map_err(|_| {
                PrepError::Configuration(format!("Item: {} must be integer!", entry.trim()))
            })?;
        }

        Ok(Self::new(values[0], values[1], values[2], values[3]))
    }
}

// ── Frame bounds ───────────────────────────────────────────────────────────

/// The pixel rectangle, in a frame's own coordinate system, that a
/// projected object must fall in to belong to that frame.
///
/// Object centers on an image of width W can lie in `[0.5, W + 0.5]`
/// (pixel N spans ±0.5 around its integer center coordinate); margins
/// widen that range per side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameBounds {
    pub x_min: f64,
    pub x_max: f64,
    pub y_min: f64,
    pub y_max: f64,
}

impl FrameBounds {
    /// Bounds for a frame of the given (NAXIS1, NAXIS2) dimensions.
    pub fn from_dimensions(dimensions: (u32, u32), margins: Margins) -> Self {
        Self {
            x_min: 0.5 - f64::from(margins.left),
            x_max: 0.5 + f64::from(margins.right) + f64::from(dimensions.0),
            y_min: 0.5 - f64::from(margins.bottom),
            y_max: 0.5 + f64::from(margins.top) + f64::from(dimensions.1),
        }
    }

    /// Whether a position lies within the bounds (inclusive).
    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.x_min && x <= self.x_max && y >= self.y_min && y <= self.y_max
    }
}

/// Look up a frame's native dimensions and derive its bounds.
///
/// Fails with a missing-file error when the frame image is absent.
pub fn compute_bounds<A: ImageArchive>(
    archive: &A,
    frame: &FrameDescriptor,
    margins: Margins,
) -> Result<FrameBounds, PrepError> {
    if !archive.exists(&frame.image_path) {
        return Err(PrepError::missing("Frame image", &frame.image_path));
    }
    let dimensions = archive.dimensions(&frame.image_path, &frame.ext_name, frame.ext_ver)?;
    Ok(FrameBounds::from_dimensions(dimensions, margins))
}

// ── Provenance discovery ───────────────────────────────────────────────────

/// Read the ordered frame descriptors from a mosaic's provenance header.
///
/// Scans `D001DATA`, `D002DATA`, … until the first absent key. A mosaic
/// without `D001DATA` has zero contributing frames, which is not an error.
pub fn discover_frames<A: ImageArchive>(
    archive: &A,
    mosaic: &Path,
) -> Result<Vec<String>, PrepError> {
    let mut descriptors = Vec::new();
    loop {
        let key = format!("D{:03}DATA", descriptors.len() + 1);
        match archive.primary_keyword(mosaic, &key)? {
            Some(value) => descriptors.push(value),
            None => break,
        }
    }
    Ok(descriptors)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::MemoryArchive;

    #[test]
    fn parse_descriptor() {
        let frame = FrameDescriptor::parse("j123.fits[sci,2]").unwrap();
        assert_eq!(frame.root, "j123");
        assert_eq!(frame.image_path, PathBuf::from("j123.fits"));
        assert_eq!(frame.ext_name, "sci");
        assert_eq!(frame.ext_ver, 2);
        assert_eq!(frame.catalog_name(), PathBuf::from("j123_2.cat"));
    }

    #[test]
    fn parse_descriptor_rejects_malformed_input() {
        for bad in [
            "j123.fits",          // no bracketed spec
            "j123[sci,2]",        // no .fits marker
            "j123.fits[sci]",     // no version
            "j123.fits[sci,two]", // non-integer version
            "j123.fits[sci,0]",   // versions are 1-based
            "j123.fits(sci,2)",   // wrong brackets
        ] {
            let err = FrameDescriptor::parse(bad).unwrap_err();
            assert!(
                matches!(err, PrepError::MalformedDescriptor { .. }),
                "{bad}: {err}"
            );
        }
    }

    #[test]
    fn margins_parse() {
        assert_eq!(Margins::parse("5,0,0,10").unwrap(), Margins::new(5, 0, 0, 10));
        assert_eq!(Margins::parse(" 1 , 2 , 3 , 4 ").unwrap(), Margins::new(1, 2, 3, 4));

        for bad in ["1,2,3", "1,2,3,4,5", "1,2,3,x", "1,2,3,-4"] {
            let err = Margins::parse(bad).unwrap_err();
            assert!(matches!(err, PrepError::Configuration(_)), "{bad}: {err}");
        }
    }

    #[test]
    fn bounds_formula() {
        let bounds = FrameBounds::from_dimensions((1000, 1000), Margins::default());
        assert_eq!(bounds.x_min, 0.5);
        assert_eq!(bounds.x_max, 1000.5);
        assert_eq!(bounds.y_min, 0.5);
        assert_eq!(bounds.y_max, 1000.5);

        let bounds = FrameBounds::from_dimensions((1000, 1000), Margins::new(5, 0, 0, 10));
        assert_eq!(bounds.x_min, -4.5);
        assert_eq!(bounds.x_max, 1000.5);
        assert_eq!(bounds.y_min, 0.5);
        assert_eq!(bounds.y_max, 1010.5);
    }

    #[test]
    fn bounds_are_inclusive() {
        let bounds = FrameBounds::from_dimensions((100, 100), Margins::default());
        assert!(bounds.contains(0.5, 0.5));
        assert!(bounds.contains(100.5, 100.5));
        assert!(!bounds.contains(0.499, 50.0));
        assert!(!bounds.contains(50.0, 100.501));
    }

    #[test]
    fn discovery_stops_at_first_gap() {
        let mut archive = MemoryArchive::new();
        archive.insert_primary_keyword("moz.fits", "D001DATA", "a.fits[sci,1]");
        archive.insert_primary_keyword("moz.fits", "D002DATA", "b.fits[sci,1]");
        archive.insert_primary_keyword("moz.fits", "D003DATA", "c.fits[sci,2]");
        // D005DATA past a gap is never reached
        archive.insert_primary_keyword("moz.fits", "D005DATA", "e.fits[sci,1]");

        let frames = discover_frames(&archive, Path::new("moz.fits")).unwrap();
        assert_eq!(
            frames,
            ["a.fits[sci,1]", "b.fits[sci,1]", "c.fits[sci,2]"]
        );
    }

    #[test]
    fn discovery_tolerates_empty_mosaic() {
        let mut archive = MemoryArchive::new();
        archive.insert_image("empty.fits");
        let frames = discover_frames(&archive, Path::new("empty.fits")).unwrap();
        assert!(frames.is_empty());
    }

    #[test]
    fn compute_bounds_requires_frame_image() {
        let archive = MemoryArchive::new();
        let frame = FrameDescriptor::parse("gone.fits[sci,1]").unwrap();
        let err = compute_bounds(&archive, &frame, Margins::default()).unwrap_err();
        assert!(matches!(err, PrepError::MissingFile { .. }), "{err}");
    }
}
