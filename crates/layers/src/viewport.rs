use foundation::math::{project, unproject, world_size};
use foundation::{Coordinate, GeoBounds};
use serde::{Deserialize, Serialize};

/// Visible map extent plus zoom level.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinate,
    pub zoom: f64,
    pub bounds: GeoBounds,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, bounds: GeoBounds) -> Self {
        Self {
            center,
            zoom,
            bounds,
        }
    }

    /// Extent of a `width_px` × `height_px` surface centered on `center` at `zoom`.
    ///
    /// Edges past ±180° wrap, giving `west > east`. A surface wider than the
    /// world covers every longitude.
    pub fn around(center: Coordinate, zoom: f64, width_px: u32, height_px: u32) -> Self {
        let (cx, cy) = project(center.latitude(), center.longitude(), zoom);
        let half_h = f64::from(height_px) / 2.0;

        // Screen y grows south.
        let (north, _) = unproject(cx, cy - half_h, zoom);
        let (south, _) = unproject(cx, cy + half_h, zoom);

        let span = f64::from(width_px) / world_size(zoom) * 360.0;
        let (west, east) = if span >= 360.0 {
            (-180.0, 180.0)
        } else {
            (
                wrap_longitude(center.longitude() - span / 2.0),
                wrap_longitude(center.longitude() + span / 2.0),
            )
        };

        Self {
            center,
            zoom,
            bounds: GeoBounds::new(south, west, north, east),
        }
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        self.bounds.contains(coord)
    }
}

fn wrap_longitude(lon: f64) -> f64 {
    if lon > 180.0 {
        lon - 360.0
    } else if lon < -180.0 {
        lon + 360.0
    } else {
        lon
    }
}

#[cfg(test)]
mod tests {
    use super::Viewport;
    use foundation::Coordinate;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn around_is_centered_and_ordered() {
        let center = Coordinate::new(37.50, 127.03).unwrap();
        let vp = Viewport::around(center, 13.0, 1080, 1920);
        assert!(vp.bounds.south < 37.50 && 37.50 < vp.bounds.north);
        assert!(vp.bounds.west < 127.03 && 127.03 < vp.bounds.east);
        assert!(vp.contains(&center));
        // 1080 px at z13 spans ~0.185 degrees of longitude.
        let span = vp.bounds.east - vp.bounds.west;
        assert!((span - 0.185).abs() < 0.001, "span {span}");
    }

    #[test]
    fn higher_zoom_shrinks_extent() {
        let center = Coordinate::new(37.50, 127.03).unwrap();
        let wide = Viewport::around(center, 10.0, 512, 512);
        let narrow = Viewport::around(center, 14.0, 512, 512);
        assert!(narrow.bounds.east - narrow.bounds.west < wide.bounds.east - wide.bounds.west);
        assert!(narrow.bounds.north < wide.bounds.north);
    }

    #[test]
    fn extent_wraps_across_the_antimeridian() {
        let vp = Viewport::around(c(0.0, 179.99), 13.0, 1080, 1920);
        assert!(vp.bounds.crosses_antimeridian());
        assert!(vp.bounds.east < -179.9 && vp.bounds.east > -180.0, "east {}", vp.bounds.east);
        assert!(vp.contains(&c(0.0, -179.995)));
        assert!(vp.contains(&c(0.0, 179.95)));
        assert!(!vp.contains(&c(0.0, -179.5)));

        let west = Viewport::around(c(0.0, -179.99), 13.0, 1080, 1920);
        assert!(west.bounds.crosses_antimeridian());
        assert!(west.contains(&c(0.0, 179.995)));
    }

    #[test]
    fn surface_wider_than_the_world_spans_every_longitude() {
        let vp = Viewport::around(c(10.0, 100.0), 0.0, 1024, 256);
        assert_eq!(vp.bounds.west, -180.0);
        assert_eq!(vp.bounds.east, 180.0);
        assert!(vp.contains(&c(0.0, -100.0)));
    }
}
