use serde::{Deserialize, Serialize};

use crate::coord::Coordinate;

/// Geographic bounding box in degrees.
///
/// Edges are inclusive. A box whose `west` is greater than its `east` spans
/// the antimeridian.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    pub fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        GeoBounds {
            south,
            west,
            north,
            east,
        }
    }

    pub fn crosses_antimeridian(&self) -> bool {
        self.west > self.east
    }

    pub fn contains(&self, coord: &Coordinate) -> bool {
        let lat = coord.latitude();
        let lon = coord.longitude();
        if lat < self.south || lat > self.north {
            return false;
        }
        if self.crosses_antimeridian() {
            lon >= self.west || lon <= self.east
        } else {
            lon >= self.west && lon <= self.east
        }
    }
}

#[cfg(test)]
mod tests {
    use super::GeoBounds;
    use crate::coord::Coordinate;

    fn c(lat: f64, lon: f64) -> Coordinate {
        Coordinate::new(lat, lon).unwrap()
    }

    #[test]
    fn contains_is_edge_inclusive() {
        let b = GeoBounds::new(37.0, 127.0, 38.0, 128.0);
        assert!(b.contains(&c(37.0, 127.0)));
        assert!(b.contains(&c(38.0, 128.0)));
        assert!(b.contains(&c(37.5, 127.5)));
        assert!(!b.contains(&c(36.99, 127.5)));
        assert!(!b.contains(&c(37.5, 128.01)));
    }

    #[test]
    fn wraps_across_antimeridian() {
        let b = GeoBounds::new(-10.0, 170.0, 10.0, -170.0);
        assert!(b.crosses_antimeridian());
        assert!(b.contains(&c(0.0, 175.0)));
        assert!(b.contains(&c(0.0, -175.0)));
        assert!(!b.contains(&c(0.0, 0.0)));
    }
}
