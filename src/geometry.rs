//! Pure geometry: cross-frame point projection and position-angle
//! recovery.
//!
//! Projection between pixel frames is chained through sky coordinates and
//! need not be linear (drizzle solutions carry distortion), so an object's
//! position angle cannot be rotated analytically. Instead the angle is
//! re-measured: a synthetic point is displaced from the object along its
//! original angle, both points are projected independently, and the angle
//! of the projected offset vector is the new position angle.

use crate::error::PrepError;
use crate::wcs::SkyProjection;

/// Displacement of the synthetic probe point, in pixels.
///
/// Large enough that transform noise does not dominate the recovered
/// angle, small enough that transform curvature stays negligible over the
/// offset.
pub const ANGLE_PROBE_DISTANCE: f64 = 10.0;

/// The probe point for an object at `(x, y)` with position angle
/// `theta_deg`, displaced [`ANGLE_PROBE_DISTANCE`] pixels along the angle.
pub fn displaced_point(x: f64, y: f64, theta_deg: f64) -> (f64, f64) {
    let theta = theta_deg.to_radians();
    (
        x + ANGLE_PROBE_DISTANCE * theta.cos(),
        y + ANGLE_PROBE_DISTANCE * theta.sin(),
    )
}

/// Position angle, in degrees, of the vector from `original` to
/// `displaced`.
///
/// The result is whatever `atan2` yields (−180°, 180°]; it is not
/// normalized to any catalog convention.
pub fn recompute_angle(original: (f64, f64), displaced: (f64, f64)) -> f64 {
    let dx = displaced.0 - original.0;
    let dy = displaced.1 - original.1;
    dy.atan2(dx).to_degrees()
}

/// Project a pixel position from one frame into another through sky
/// coordinates.
pub fn project_between<S, T>(
    from: &S,
    to: &T,
    point: (f64, f64),
) -> Result<(f64, f64), PrepError>
where
    S: SkyProjection + ?Sized,
    T: SkyProjection + ?Sized,
{
    let (ra_deg, dec_deg) = from.pixel_to_sky(point.0, point.1)?;
    to.sky_to_pixel(ra_deg, dec_deg)
}
