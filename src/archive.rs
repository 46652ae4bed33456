//! Image-access seam between the projection core and FITS storage.
//!
//! The core needs exactly four capabilities from the image layer: pixel
//! dimensions of a named extension, a WCS solution for a named extension,
//! the mosaic-level WCS, and primary-header keyword lookup for the
//! provenance scan. [`ImageArchive`] captures that contract; the reduction
//! environment supplies an implementation backed by whatever FITS reader it
//! uses.
//!
//! [`MemoryArchive`] is the bundled implementation: an in-memory table of
//! image entries. It backs the test suite and suits callers that read
//! headers once up front and hand the parsed values to this crate.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::error::PrepError;
use crate::wcs::{SkyProjection, TanWcs};

/// Read-only access to images referenced by a mosaic and its frames.
///
/// All methods must be deterministic and side-effect-free from the caller's
/// perspective.
pub trait ImageArchive {
    type Wcs: SkyProjection;

    /// Whether the image file is present.
    fn exists(&self, image: &Path) -> bool;

    /// Pixel dimensions (NAXIS1, NAXIS2) of a named extension.
    fn dimensions(
        &self,
        image: &Path,
        ext_name: &str,
        ext_ver: u32,
    ) -> Result<(u32, u32), PrepError>;

    /// WCS solution of a named extension.
    fn wcs(&self, image: &Path, ext_name: &str, ext_ver: u32) -> Result<Self::Wcs, PrepError>;

    /// WCS solution of a mosaic image. Mosaics carry a single science
    /// plane, so no extension spec is needed; the implementation decides
    /// where the solution lives.
    fn mosaic_wcs(&self, image: &Path) -> Result<Self::Wcs, PrepError>;

    /// Value of a primary-header keyword, or `None` if absent.
    fn primary_keyword(&self, image: &Path, key: &str) -> Result<Option<String>, PrepError>;
}

// ── In-memory implementation ───────────────────────────────────────────────

#[derive(Debug, Clone)]
struct ExtensionEntry {
    dimensions: (u32, u32),
    wcs: TanWcs,
}

#[derive(Debug, Clone, Default)]
struct ImageEntry {
    primary: HashMap<String, String>,
    extensions: HashMap<(String, u32), ExtensionEntry>,
    mosaic_wcs: Option<TanWcs>,
}

/// In-memory [`ImageArchive`] over [`TanWcs`] solutions.
#[derive(Debug, Clone, Default)]
pub struct MemoryArchive {
    images: HashMap<PathBuf, ImageEntry>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an image file with no content yet. Registered paths count
    /// as existing even before any extension is added.
    pub fn insert_image(&mut self, image: impl Into<PathBuf>) {
        self.images.entry(image.into()).or_default();
    }

    /// Register a calibrated extension of an image.
    pub fn insert_extension(
        &mut self,
        image: impl Into<PathBuf>,
        ext_name: &str,
        ext_ver: u32,
        dimensions: (u32, u32),
        wcs: TanWcs,
    ) {
        self.images
            .entry(image.into())
            .or_default()
            .extensions
            .insert((ext_name.to_string(), ext_ver), ExtensionEntry { dimensions, wcs });
    }

    /// Set a primary-header keyword of an image.
    pub fn insert_primary_keyword(
        &mut self,
        image: impl Into<PathBuf>,
        key: &str,
        value: &str,
    ) {
        self.images
            .entry(image.into())
            .or_default()
            .primary
            .insert(key.to_string(), value.to_string());
    }

    /// Set the mosaic-level WCS of an image.
    pub fn insert_mosaic_wcs(&mut self, image: impl Into<PathBuf>, wcs: TanWcs) {
        self.images.entry(image.into()).or_default().mosaic_wcs = Some(wcs);
    }

    fn entry(&self, image: &Path) -> Result<&ImageEntry, PrepError> {
        self.images
            .get(image)
            .ok_or_else(|| PrepError::missing("Image", image))
    }
}

impl ImageArchive for MemoryArchive {
    type Wcs = TanWcs;

    fn exists(&self, image: &Path) -> bool {
        self.images.contains_key(image)
    }

    fn dimensions(
        &self,
        image: &Path,
        ext_name: &str,
        ext_ver: u32,
    ) -> Result<(u32, u32), PrepError> {
        let entry = self.entry(image)?;
        entry
            .extensions
            .get(&(ext_name.to_string(), ext_ver))
            .map(|ext| ext.dimensions)
            .ok_or_else(|| {
                PrepError::transform(
                    format!("{}[{},{}]", image.display(), ext_name, ext_ver),
                    "extension not present",
                )
            })
    }

    fn wcs(&self, image: &Path, ext_name: &str, ext_ver: u32) -> Result<TanWcs, PrepError> {
        let entry = self.entry(image)?;
        entry
            .extensions
            .get(&(ext_name.to_string(), ext_ver))
            .map(|ext| ext.wcs.clone())
            .ok_or_else(|| {
                PrepError::transform(
                    format!("{}[{},{}]", image.display(), ext_name, ext_ver),
                    "no WCS solution for extension",
                )
            })
    }

    fn mosaic_wcs(&self, image: &Path) -> Result<TanWcs, PrepError> {
        let entry = self.entry(image)?;
        entry.mosaic_wcs.clone().ok_or_else(|| {
            PrepError::transform(
                image.display().to_string(),
                "no mosaic-level WCS solution",
            )
        })
    }

    fn primary_keyword(&self, image: &Path, key: &str) -> Result<Option<String>, PrepError> {
        Ok(self.entry(image)?.primary.get(key).cloned())
    }
}
