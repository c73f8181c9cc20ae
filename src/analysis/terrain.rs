//! Terrain descriptors derived from a 5-point elevation profile.

use crate::models::{Aspect, ElevationProfile, SlopeClass, TerrainProfile};
use crate::stats::{mean, round_to};

// ---

/// Slope from the elevation range over the bbox diagonal, aspect from the
/// east-west vs north-south gradient, elevation at the centroid.
pub fn classify(profile: &ElevationProfile) -> TerrainProfile {
    // ---
    let samples = profile.samples();
    let min = samples.iter().copied().fold(f64::INFINITY, f64::min);
    let max = samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);

    let horizontal = profile.bbox.diagonal_m();
    let slope_degrees = if horizontal > 0.0 {
        ((max - min) / horizontal).atan().to_degrees()
    } else {
        0.0
    };

    TerrainProfile {
        slope_degrees: round_to(slope_degrees, 1),
        aspect: aspect(profile),
        elevation_m: profile.centroid.round(),
    }
}

/// Bucket `atan2(ew, ns)` into 45° sectors centred on the compass points.
pub fn aspect(profile: &ElevationProfile) -> Aspect {
    // ---
    let north = mean(&[profile.north_east, profile.north_west]);
    let south = mean(&[profile.south_east, profile.south_west]);
    let east = mean(&[profile.north_east, profile.south_east]);
    let west = mean(&[profile.north_west, profile.south_west]);

    aspect_from_gradient(east - west, north - south)
}

pub fn aspect_from_gradient(ew_gradient: f64, ns_gradient: f64) -> Aspect {
    // ---
    let angle = ew_gradient.atan2(ns_gradient).to_degrees();
    // shift so sector 0 spans [-22.5, 22.5)
    let sector = ((angle + 22.5).rem_euclid(360.0) / 45.0).floor() as usize;
    Aspect::ALL[sector % Aspect::ALL.len()]
}

pub fn slope_class(slope_degrees: f64) -> SlopeClass {
    // ---
    match slope_degrees {
        s if s < 5.0 => SlopeClass::Flat,
        s if s < 15.0 => SlopeClass::Gentle,
        s if s < 25.0 => SlopeClass::Moderate,
        s if s < 35.0 => SlopeClass::Steep,
        _ => SlopeClass::VerySteep,
    }
}

impl TerrainProfile {
    pub fn slope_class(&self) -> SlopeClass {
        slope_class(self.slope_degrees)
    }

    /// Afforestation/reforestation eligibility.
    pub fn is_arr_suitable(&self) -> bool {
        self.slope_degrees < 30.0 && self.elevation_m < 2500.0
    }

    /// Improved forest management eligibility.
    pub fn is_ifm_suitable(&self) -> bool {
        self.slope_degrees < 35.0
    }
}

#[cfg(test)]
mod tests {
    // ---
    use super::*;
    use crate::models::BoundingBox;

    fn profile(sw: f64, ne: f64, se: f64, nw: f64) -> ElevationProfile {
        // ---
        ElevationProfile {
            // ~111 m x ~111 m
            bbox: BoundingBox {
                min_lng: -91.0,
                min_lat: 15.0,
                max_lng: -90.999,
                max_lat: 15.001,
            },
            centroid: (sw + ne + se + nw) / 4.0,
            south_west: sw,
            north_east: ne,
            south_east: se,
            north_west: nw,
        }
    }

    #[test]
    fn test_flat_terrain() {
        // ---
        let terrain = classify(&profile(1500.0, 1500.0, 1500.0, 1500.0));
        assert_eq!(terrain.slope_degrees, 0.0);
        assert_eq!(terrain.elevation_m, 1500.0);
        assert_eq!(terrain.slope_class(), SlopeClass::Flat);
    }

    #[test]
    fn test_slope_from_range_over_diagonal() {
        // ---
        let p = profile(1000.0, 1157.0, 1000.0, 1000.0);
        let terrain = classify(&p);
        let expected = (157.0 / p.bbox.diagonal_m()).atan().to_degrees();
        assert_eq!(terrain.slope_degrees, round_to(expected, 1));
        assert!((terrain.slope_degrees - 45.0).abs() < 0.5);
    }

    #[test]
    fn test_degenerate_bbox_has_zero_slope() {
        // ---
        let mut p = profile(1000.0, 1200.0, 1000.0, 1000.0);
        p.bbox.max_lng = p.bbox.min_lng;
        p.bbox.max_lat = p.bbox.min_lat;
        assert_eq!(classify(&p).slope_degrees, 0.0);
    }

    #[test]
    fn test_aspect_buckets() {
        // ---
        assert_eq!(aspect_from_gradient(0.0, 1.0), Aspect::N);
        assert_eq!(aspect_from_gradient(1.0, 1.0), Aspect::NE);
        assert_eq!(aspect_from_gradient(1.0, 0.0), Aspect::E);
        assert_eq!(aspect_from_gradient(1.0, -1.0), Aspect::SE);
        assert_eq!(aspect_from_gradient(0.0, -1.0), Aspect::S);
        assert_eq!(aspect_from_gradient(-1.0, -1.0), Aspect::SW);
        assert_eq!(aspect_from_gradient(-1.0, 0.0), Aspect::W);
        assert_eq!(aspect_from_gradient(-1.0, 1.0), Aspect::NW);
        // no gradient at all reads as N
        assert_eq!(aspect_from_gradient(0.0, 0.0), Aspect::N);
    }

    #[test]
    fn test_aspect_from_profile() {
        // ---
        // east side higher
        assert_eq!(aspect(&profile(1000.0, 1100.0, 1100.0, 1000.0)), Aspect::E);
        // north side higher
        assert_eq!(aspect(&profile(1000.0, 1100.0, 1000.0, 1100.0)), Aspect::N);
    }

    #[test]
    fn test_slope_classes() {
        // ---
        assert_eq!(slope_class(4.9), SlopeClass::Flat);
        assert_eq!(slope_class(5.0), SlopeClass::Gentle);
        assert_eq!(slope_class(15.0), SlopeClass::Moderate);
        assert_eq!(slope_class(25.0), SlopeClass::Steep);
        assert_eq!(slope_class(35.0), SlopeClass::VerySteep);
    }

    #[test]
    fn test_suitability() {
        // ---
        let terrain = TerrainProfile {
            slope_degrees: 29.9,
            aspect: Aspect::S,
            elevation_m: 2499.0,
        };
        assert!(terrain.is_arr_suitable());
        assert!(terrain.is_ifm_suitable());

        let steep = TerrainProfile {
            slope_degrees: 30.0,
            ..terrain
        };
        assert!(!steep.is_arr_suitable());
        assert!(steep.is_ifm_suitable());

        let high = TerrainProfile {
            elevation_m: 2500.0,
            ..terrain
        };
        assert!(!high.is_arr_suitable());

        let cliff = TerrainProfile {
            slope_degrees: 35.0,
            ..terrain
        };
        assert!(!cliff.is_ifm_suitable());
    }
}
