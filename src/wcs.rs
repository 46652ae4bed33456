//! Pixel ↔ sky transforms for calibrated image extensions.
//!
//! The projection subsystem never reads WCS keywords itself; it consumes the
//! [`SkyProjection`] trait, one instance per calibrated image extension.
//! [`TanWcs`] is the concrete gnomonic (TAN) implementation covering the
//! common drizzled-mosaic and flat-fielded-exposure case: a CD matrix maps
//! pixel offsets from the reference pixel (CRPIX) to tangent-plane
//! coordinates at the reference point (CRVAL).
//!
//! # Conventions
//!
//! - **Pixel coordinates** are 1-based FITS coordinates: the center of the
//!   first pixel is (1, 1), and object centers on an image of width W lie in
//!   `[0.5, W + 0.5]`.
//! - **Sky coordinates** are (RA, Dec) in degrees at the trait boundary;
//!   radians internally.
//!
//! The TAN conventions follow FITS WCS Paper II (Calabretta & Greisen
//! 2002).

use nalgebra::{Matrix2, Vector2, Vector3};

use crate::error::PrepError;

/// Deterministic, side-effect-free pixel ↔ sky mapping for one image
/// extension.
///
/// Both directions may fail: a sky position can be unprojectable (e.g.
/// behind the tangent plane of a TAN solution), and implementations backed
/// by lookup tables may reject out-of-domain pixels.
pub trait SkyProjection {
    /// Map a 1-based pixel position to (RA, Dec) in degrees.
    fn pixel_to_sky(&self, x: f64, y: f64) -> Result<(f64, f64), PrepError>;

    /// Map (RA, Dec) in degrees to a 1-based pixel position.
    fn sky_to_pixel(&self, ra_deg: f64, dec_deg: f64) -> Result<(f64, f64), PrepError>;
}

// ── TAN projection ─────────────────────────────────────────────────────────
//
// Both directions work on unit vectors. The tangent plane at the
// reference point is spanned by the local east and north directions, and
// the gnomonic projection of a sky position is the intersection of its
// direction ray with that plane: rescale the direction until its
// component along the reference direction equals one, then read off the
// east/north components.

/// Unit direction vector of a celestial position, angles in radians.
fn celestial_direction(ra: f64, dec: f64) -> Vector3<f64> {
    let (sin_ra, cos_ra) = ra.sin_cos();
    let (sin_dec, cos_dec) = dec.sin_cos();
    Vector3::new(cos_dec * cos_ra, cos_dec * sin_ra, sin_dec)
}

/// Orthonormal tangent-plane basis at a reference point: the unit vectors
/// toward local east (+ξ) and local north (+η), and the reference
/// direction itself.
fn tangent_basis(ra0: f64, dec0: f64) -> (Vector3<f64>, Vector3<f64>, Vector3<f64>) {
    let (sin_ra0, cos_ra0) = ra0.sin_cos();
    let (sin_dec0, cos_dec0) = dec0.sin_cos();
    let east = Vector3::new(-sin_ra0, cos_ra0, 0.0);
    let north = Vector3::new(-sin_dec0 * cos_ra0, -sin_dec0 * sin_ra0, cos_dec0);
    (east, north, celestial_direction(ra0, dec0))
}

/// Forward gnomonic (TAN) projection.
///
/// Maps celestial `(ra, dec)` to tangent-plane `(ξ, η)` at the reference
/// point `(ra0, dec0)`, all in radians. Returns `None` when the position
/// is a quarter turn or more from the reference point: its direction ray
/// never pierces the tangent plane.
pub fn tan_project(ra: f64, dec: f64, ra0: f64, dec0: f64) -> Option<(f64, f64)> {
    let dir = celestial_direction(ra, dec);
    let (east, north, center) = tangent_basis(ra0, dec0);

    let depth = dir.dot(&center);
    if depth <= 1e-10 {
        return None;
    }
    Some((dir.dot(&east) / depth, dir.dot(&north) / depth))
}

/// Inverse gnomonic (TAN) projection.
///
/// Maps tangent-plane `(ξ, η)` at the reference point `(ra0, dec0)` back
/// to celestial `(ra, dec)`, all in radians; the returned RA is the
/// `atan2` branch in (−π, π]. Defined for every finite `(ξ, η)`.
pub fn inverse_tan_project(xi: f64, eta: f64, ra0: f64, dec0: f64) -> (f64, f64) {
    let (east, north, center) = tangent_basis(ra0, dec0);
    let dir = center + east * xi + north * eta;

    let ra = dir.y.atan2(dir.x);
    let dec = dir.z.atan2((dir.x * dir.x + dir.y * dir.y).sqrt());
    (ra, dec)
}

// ── TanWcs ─────────────────────────────────────────────────────────────────

/// Gnomonic WCS solution: CRPIX + CRVAL + CD matrix.
///
/// The CD matrix is stored in radians per pixel; the inverse is computed
/// once at construction so both transform directions are pure lookups.
#[derive(Debug, Clone)]
pub struct TanWcs {
    /// Reference pixel (1-based FITS convention).
    crpix: [f64; 2],
    /// Reference point (RA, Dec) in radians.
    crval_rad: [f64; 2],
    /// Pixel offsets → tangent-plane radians.
    cd: Matrix2<f64>,
    cd_inv: Matrix2<f64>,
    /// Identifies the solution in error messages, e.g. `j8m8_drz.fits`.
    label: String,
}

impl TanWcs {
    /// Build a TAN solution from FITS-style keywords: `crpix` 1-based,
    /// `crval_deg` in degrees, `cd_deg` in degrees per pixel.
    ///
    /// Fails with a transform error when the CD matrix is singular.
    pub fn new(
        label: impl Into<String>,
        crpix: [f64; 2],
        crval_deg: [f64; 2],
        cd_deg: Matrix2<f64>,
    ) -> Result<Self, PrepError> {
        let label = label.into();
        let cd = cd_deg.map(f64::to_radians);
        let cd_inv = cd
            .try_inverse()
            .ok_or_else(|| PrepError::transform(&label, "CD matrix is singular"))?;
        Ok(Self {
            crpix,
            crval_rad: [crval_deg[0].to_radians(), crval_deg[1].to_radians()],
            cd,
            cd_inv,
            label,
        })
    }

    /// Reference point (RA, Dec) in degrees.
    pub fn crval_deg(&self) -> [f64; 2] {
        [self.crval_rad[0].to_degrees(), self.crval_rad[1].to_degrees()]
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl SkyProjection for TanWcs {
    fn pixel_to_sky(&self, x: f64, y: f64) -> Result<(f64, f64), PrepError> {
        let tan = self.cd * Vector2::new(x - self.crpix[0], y - self.crpix[1]);
        let (ra, dec) = inverse_tan_project(tan.x, tan.y, self.crval_rad[0], self.crval_rad[1]);
        Ok((ra.to_degrees().rem_euclid(360.0), dec.to_degrees()))
    }

    fn sky_to_pixel(&self, ra_deg: f64, dec_deg: f64) -> Result<(f64, f64), PrepError> {
        let (xi, eta) = tan_project(
            ra_deg.to_radians(),
            dec_deg.to_radians(),
            self.crval_rad[0],
            self.crval_rad[1],
        )
        .ok_or_else(|| {
            PrepError::transform(
                &self.label,
                format!(
                    "sky position ({ra_deg:.6}, {dec_deg:.6}) lies behind the tangent plane"
                ),
            )
        })?;
        let px = self.cd_inv * Vector2::new(xi, eta);
        Ok((px.x + self.crpix[0], px.y + self.crpix[1]))
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────
