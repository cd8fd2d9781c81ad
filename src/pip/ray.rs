//! Ray-casting containment test.

use geo::Coord;

/// Whether `point` lies inside the implicitly-closed ring `ring`.
///
/// Casts a ray towards +x and toggles on every edge crossing. An edge only
/// counts when exactly one endpoint is strictly above the point's latitude,
/// which keeps horizontal edges away from the division and counts a vertex
/// on the ray once. Points exactly on an edge or vertex may go either way.
/// Rings with fewer than 3 vertices never contain anything.
pub fn ring_contains(ring: &[Coord<f64>], point: Coord<f64>) -> bool {
    if ring.len() < 3 {
        return false;
    }

    let (x, y) = (point.x, point.y);
    let mut inside = false;
    let mut j = ring.len() - 1;

    for i in 0..ring.len() {
        let (xi, yi) = (ring[i].x, ring[i].y);
        let (xj, yj) = (ring[j].x, ring[j].y);

        if (yi > y) != (yj > y) && x < (xj - xi) * (y - yi) / (yj - yi) + xi {
            inside = !inside;
        }
        j = i;
    }

    inside
}
