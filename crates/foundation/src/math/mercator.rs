//! Spherical Web Mercator (EPSG:3857) in world-pixel space.
//!
//! World size at zoom `z` is `TILE_SIZE * 2^z` pixels; x grows east from the
//! antimeridian, y grows south from the northern clamp latitude.

use std::f64::consts::PI;

/// Tile edge length in pixels.
pub const TILE_SIZE: f64 = 256.0;
/// Latitude where the Mercator square ends.
pub const MAX_MERCATOR_LAT: f64 = 85.051_128_78;

pub fn world_size(zoom: f64) -> f64 {
    TILE_SIZE * zoom.exp2()
}

/// Project degrees to world pixels at `zoom`.
pub fn project(lat_deg: f64, lon_deg: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lat = lat_deg.clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT).to_radians();
    let x = (lon_deg + 180.0) / 360.0 * size;
    let y = (1.0 - (lat.tan() + 1.0 / lat.cos()).ln() / PI) / 2.0 * size;
    (x, y)
}

/// Inverse of [`project`]; results are clamped to the valid degree range.
pub fn unproject(x: f64, y: f64, zoom: f64) -> (f64, f64) {
    let size = world_size(zoom);
    let lon = (x / size * 360.0 - 180.0).clamp(-180.0, 180.0);
    let n = PI - 2.0 * PI * y / size;
    let lat = (0.5 * (n.exp() - (-n).exp()))
        .atan()
        .to_degrees()
        .clamp(-MAX_MERCATOR_LAT, MAX_MERCATOR_LAT);
    (lat, lon)
}

#[cfg(test)]
mod tests {
    use super::{project, unproject, world_size};

    fn assert_close(a: f64, b: f64, eps: f64) {
        let diff = (a - b).abs();
        assert!(diff <= eps, "expected {a} ~= {b} (diff {diff})");
    }

    #[test]
    fn origin_maps_to_world_center() {
        let (x, y) = project(0.0, 0.0, 0.0);
        assert_close(x, 128.0, 1e-9);
        assert_close(y, 128.0, 1e-9);
        assert_close(world_size(13.0), 256.0 * 8192.0, 1e-9);
    }

    #[test]
    fn unproject_inverts_project() {
        let (x, y) = project(37.5665, 126.978, 13.0);
        let (lat, lon) = unproject(x, y, 13.0);
        assert_close(lat, 37.5665, 1e-9);
        assert_close(lon, 126.978, 1e-9);
    }

    #[test]
    fn unproject_clamps_outside_world() {
        let (lat, lon) = unproject(-10.0, -10.0, 0.0);
        assert!(lat <= 85.06);
        assert_close(lon, -180.0, 1e-12);
    }
}
