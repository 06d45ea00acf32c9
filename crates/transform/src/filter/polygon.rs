//! Point-in-polygon test on latitude/longitude pairs

/// A (lat, lng) position
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Point {
    /// Latitude, used as y
    pub lat: f64,
    /// Longitude, used as x
    pub lng: f64,
}

impl Point {
    /// Create a point
    pub const fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Ray-casting test of `point` against a closed ring of vertices
///
/// Fewer than three vertices never contain anything. Points exactly on an
/// edge may land on either side.
pub fn inside(point: Point, polygon: &[Point]) -> bool {
    if polygon.len() < 3 {
        return false;
    }

    let (x, y) = (point.lng, point.lat);
    let mut result = false;
    let mut j = polygon.len() - 1;

    for (i, vi) in polygon.iter().enumerate() {
        let vj = polygon[j];
        let (xi, yi) = (vi.lng, vi.lat);
        let (xj, yj) = (vj.lng, vj.lat);

        // yi != yj whenever the first condition holds, so no division by zero
        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            result = !result;
        }
        j = i;
    }

    result
}
