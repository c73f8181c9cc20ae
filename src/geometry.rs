//! Minimal planar geometry over farm boundaries.
//!
//! Stand-in for a full geometry library: validation, bounding box and
//! vertex centroid are all the pipeline needs.

use crate::error::{MrvError, Result};
use crate::models::{BoundingBox, Coordinates, Polygon};

// ---

/// Approximate metres per degree, used for planar distance estimates.
pub const METRES_PER_DEGREE: f64 = 111_000.0;

/// Reject polygons that are not closed or have fewer than 3 distinct vertices.
pub fn validate(polygon: &Polygon) -> Result<()> {
    // ---
    let ring = polygon.outer_ring();

    if ring.iter().flatten().any(|c| !c.is_finite()) {
        return Err(MrvError::InvalidGeometry(
            "polygon contains non-finite coordinates".to_string(),
        ));
    }

    let (first, last) = match (ring.first(), ring.last()) {
        (Some(first), Some(last)) if ring.len() >= 2 => (first, last),
        _ => {
            return Err(MrvError::InvalidGeometry(format!(
                "polygon ring has {} positions",
                ring.len()
            )))
        }
    };

    if first != last {
        return Err(MrvError::InvalidGeometry(
            "polygon ring is not closed".to_string(),
        ));
    }

    let mut distinct: Vec<[f64; 2]> = Vec::with_capacity(ring.len());
    for position in &ring[..ring.len() - 1] {
        if !distinct.contains(position) {
            distinct.push(*position);
        }
    }

    if distinct.len() < 3 {
        return Err(MrvError::InvalidGeometry(format!(
            "polygon has {} distinct vertices, need at least 3",
            distinct.len()
        )));
    }

    Ok(())
}

pub fn bounding_box(polygon: &Polygon) -> BoundingBox {
    // ---
    let ring = polygon.outer_ring();
    if ring.is_empty() {
        return BoundingBox {
            min_lng: 0.0,
            min_lat: 0.0,
            max_lng: 0.0,
            max_lat: 0.0,
        };
    }

    ring.iter().fold(
        BoundingBox {
            min_lng: f64::INFINITY,
            min_lat: f64::INFINITY,
            max_lng: f64::NEG_INFINITY,
            max_lat: f64::NEG_INFINITY,
        },
        |bbox, [lng, lat]| BoundingBox {
            min_lng: bbox.min_lng.min(*lng),
            min_lat: bbox.min_lat.min(*lat),
            max_lng: bbox.max_lng.max(*lng),
            max_lat: bbox.max_lat.max(*lat),
        },
    )
}

/// Mean of the ring's vertices, closing position excluded.
pub fn centroid(polygon: &Polygon) -> Coordinates {
    // ---
    let ring = polygon.outer_ring();
    let open = match ring.split_last() {
        Some((last, rest)) if !rest.is_empty() && rest.first() == Some(last) => rest,
        _ => ring,
    };

    if open.is_empty() {
        return Coordinates { lng: 0.0, lat: 0.0 };
    }

    let n = open.len() as f64;
    let (lng, lat) = open
        .iter()
        .fold((0.0, 0.0), |(lng, lat), [x, y]| (lng + x, lat + y));

    Coordinates {
        lng: lng / n,
        lat: lat / n,
    }
}

impl BoundingBox {
    /// Diagonal length in metres under the flat ~111 km/degree approximation.
    pub fn diagonal_m(&self) -> f64 {
        let dx = (self.max_lng - self.min_lng) * METRES_PER_DEGREE;
        let dy = (self.max_lat - self.min_lat) * METRES_PER_DEGREE;
        (dx * dx + dy * dy).sqrt()
    }

    /// Rough area in hectares (degrees² scaled by 10⁴).
    pub fn approx_area_ha(&self) -> f64 {
        ((self.max_lng - self.min_lng) * (self.max_lat - self.min_lat)).abs() * 10_000.0
    }

    pub fn as_array(&self) -> [f64; 4] {
        [self.min_lng, self.min_lat, self.max_lng, self.max_lat]
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;

    fn square() -> Polygon {
        Polygon::from_ring(vec![
            [-91.5123, 15.3245],
            [-91.5089, 15.3245],
            [-91.5089, 15.3212],
            [-91.5123, 15.3212],
            [-91.5123, 15.3245],
        ])
    }

    #[test]
    fn test_valid_square() {
        assert!(validate(&square()).is_ok());
    }

    #[test]
    fn test_open_ring_rejected() {
        // ---
        let polygon = Polygon::from_ring(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 1.0]]);
        let err = validate(&polygon).unwrap_err();
        assert!(err.to_string().contains("not closed"));
    }

    #[test]
    fn test_degenerate_ring_rejected() {
        // ---
        let polygon = Polygon::from_ring(vec![[0.0, 0.0], [1.0, 0.0], [1.0, 0.0], [0.0, 0.0]]);
        assert!(matches!(validate(&polygon), Err(MrvError::InvalidGeometry(_))));

        let empty = Polygon {
            kind: crate::models::GeometryKind::Polygon,
            coordinates: vec![],
        };
        assert!(validate(&empty).is_err());
    }

    #[test]
    fn test_bbox_and_centroid() {
        // ---
        let polygon = square();
        let bbox = bounding_box(&polygon);
        assert_eq!(bbox.min_lng, -91.5123);
        assert_eq!(bbox.max_lat, 15.3245);

        let c = centroid(&polygon);
        assert!((c.lng - -91.5106).abs() < 1e-9);
        assert!((c.lat - 15.32285).abs() < 1e-9);
    }
}
