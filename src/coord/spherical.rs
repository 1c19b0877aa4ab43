//! Great-circle math
//!
//! Distance, initial bearing and forward destination on a sphere of mean Earth
//! radius. Distances are in kilometers, angles in degrees.

use crate::constants::geo::EARTH_RADIUS_KM;
use crate::coord::Coordinates;
use rand::Rng;

/// Great-circle distance between two points in km (haversine formula)
pub fn distance(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lat = (to.lat - from.lat).to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1.cos() * lat2.cos() * (delta_lng / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Initial bearing from `from` to `to` in degrees, in (-180, 180]
///
/// 0 is due north, 90 due east.
pub fn bearing(from: Coordinates, to: Coordinates) -> f64 {
    let lat1 = from.lat.to_radians();
    let lat2 = to.lat.to_radians();
    let delta_lng = (to.lng - from.lng).to_radians();

    let y = delta_lng.sin() * lat2.cos();
    let x = lat1.cos() * lat2.sin() - lat1.sin() * lat2.cos() * delta_lng.cos();

    let degrees = y.atan2(x).to_degrees();
    if degrees <= -180.0 {
        degrees + 360.0
    } else {
        degrees
    }
}

/// Point reached by travelling `distance_km` from `origin` on initial `bearing_deg`
pub fn destination(origin: Coordinates, distance_km: f64, bearing_deg: f64) -> Coordinates {
    let lat1 = origin.lat.to_radians();
    let lng1 = origin.lng.to_radians();
    let theta = bearing_deg.to_radians();
    let delta = distance_km / EARTH_RADIUS_KM;

    let lat2 = (lat1.sin() * delta.cos() + lat1.cos() * delta.sin() * theta.cos()).asin();
    let lng2 = lng1
        + (theta.sin() * delta.sin() * lat1.cos()).atan2(delta.cos() - lat1.sin() * lat2.sin());

    Coordinates::new(lat2.to_degrees(), lng2.to_degrees())
}

/// Check if a point is within `radius_km` of `center`
pub fn is_in_circle(point: Coordinates, center: Coordinates, radius_km: f64) -> bool {
    distance(center, point) <= radius_km
}

/// Random point uniformly distributed within a circle
///
/// r = radius * sqrt(u) corrects for area growing with r^2; without it points
/// cluster toward the center.
pub fn random_point_in_circle<R: Rng + ?Sized>(
    center: Coordinates,
    radius_km: f64,
    rng: &mut R,
) -> Coordinates {
    let r = radius_km * rng.gen::<f64>().sqrt();
    let theta = 360.0 * rng.gen::<f64>();
    destination(center, r, theta)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn center() -> Coordinates {
        Coordinates::new(40.5, -80.0)
    }

    #[test]
    fn test_distance_examples() {
        let d = distance(center(), Coordinates::new(40.49100679636276, -80.0));
        assert_abs_diff_eq!(d, 1.0, epsilon = 0.005);

        let d = distance(center(), Coordinates::new(-20.0, 30.0));
        assert_abs_diff_eq!(d, 13099.698, epsilon = 0.005);
    }

    #[test]
    fn test_distance_zero_and_symmetric() {
        let p = Coordinates::new(-33.8688, 151.2093);
        assert_eq!(distance(p, p), 0.0);
        assert_eq!(distance(center(), p), distance(p, center()));
    }

    #[test]
    fn test_bearing_examples() {
        assert_abs_diff_eq!(bearing(center(), Coordinates::new(42.0, -80.0)), 0.0, epsilon = 0.005);
        assert_abs_diff_eq!(bearing(center(), Coordinates::new(40.0, -80.0)), 180.0, epsilon = 0.005);
        assert_abs_diff_eq!(
            bearing(center(), Coordinates::new(40.5, -80.005)),
            -90.0,
            epsilon = 0.005
        );
    }

    #[test]
    fn test_bearing_range() {
        let due_south = bearing(Coordinates::new(10.0, 5.0), Coordinates::new(-10.0, 5.0));
        assert_eq!(due_south, 180.0);
        assert!(due_south > -180.0 && due_south <= 180.0);
    }

    #[test]
    fn test_destination_round_trip() {
        for (km, deg) in [(0.2, 0.0), (1.0, 90.0), (5.0, 180.0), (10.0, 270.0), (1000.0, 45.0)] {
            let p = destination(center(), km, deg);
            assert_abs_diff_eq!(distance(center(), p), km, epsilon = 1e-6 * km.max(1.0));
        }

        let north = destination(center(), 1.0, 0.0);
        assert_abs_diff_eq!(north.lat, 40.508993203637246, epsilon = 1e-9);
        assert_abs_diff_eq!(north.lng, -80.0, epsilon = 1e-9);
    }

    #[test]
    fn test_is_in_circle() {
        assert!(is_in_circle(center(), center(), 1.0));
        assert!(is_in_circle(destination(center(), 0.5, 30.0), center(), 1.0));
        assert!(!is_in_circle(destination(center(), 2.0, 30.0), center(), 1.0));
    }

    #[test]
    fn test_random_points_stay_in_circle() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..1000 {
            let p = random_point_in_circle(center(), 3.0, &mut rng);
            assert!(distance(center(), p) <= 3.0 * 1.0001);
        }
    }
}
