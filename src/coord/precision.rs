//! Search radius to geohash length
//!
//! Picks the longest hash whose cell is still at least as large as the radius,
//! so the center cell plus its neighbor ring covers the search circle.
//!
//! | length | cell (approx.)      |
//! |--------|---------------------|
//! | 1      | 5,000km × 5,000km   |
//! | 2      | 1,250km × 625km     |
//! | 3      | 156km × 156km       |
//! | 4      | 39.1km × 19.5km     |
//! | 5      | 4.89km × 4.89km     |
//! | 6      | 1.22km × 0.61km     |
//! | 7      | 153m × 153m         |
//! | 8      | 38.2m × 19.1m       |
//! | 9      | 4.77m × 4.77m       |

/// Upper radius bound in km (inclusive) for each hash length, finest first
const PRECISION_TABLE: [(f64, usize); 8] = [
    (0.00477, 9),
    (0.0382, 8),
    (0.153, 7),
    (1.22, 6),
    (4.89, 5),
    (39.1, 4),
    (156.0, 3),
    (1250.0, 2),
];

/// Geohash length to use for a radius query of `radius_km`
pub fn select_precision(radius_km: f64) -> usize {
    PRECISION_TABLE
        .iter()
        .find(|(max_km, _)| radius_km <= *max_km)
        .map(|(_, precision)| *precision)
        .unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boundaries_inclusive() {
        assert_eq!(select_precision(0.00477), 9);
        assert_eq!(select_precision(0.0382), 8);
        assert_eq!(select_precision(0.153), 7);
        assert_eq!(select_precision(1.22), 6);
        assert_eq!(select_precision(4.89), 5);
        assert_eq!(select_precision(39.1), 4);
        assert_eq!(select_precision(156.0), 3);
        assert_eq!(select_precision(1250.0), 2);
    }

    #[test]
    fn test_just_above_boundaries() {
        assert_eq!(select_precision(0.0048), 8);
        assert_eq!(select_precision(0.04), 7);
        assert_eq!(select_precision(0.2), 6);
        assert_eq!(select_precision(1.3), 5);
        assert_eq!(select_precision(5.0), 4);
        assert_eq!(select_precision(40.0), 3);
        assert_eq!(select_precision(157.0), 2);
        assert_eq!(select_precision(1250.1), 1);
        assert_eq!(select_precision(20_000.0), 1);
    }

    #[test]
    fn test_tiny_radius() {
        assert_eq!(select_precision(0.0), 9);
        assert_eq!(select_precision(-1.0), 9);
    }

    #[test]
    fn test_monotone_non_increasing() {
        let mut last = select_precision(0.0);
        let mut km = 0.001;
        while km < 5000.0 {
            let p = select_precision(km);
            assert!(p <= last, "precision rose from {} to {} at {} km", last, p, km);
            assert!((1..=9).contains(&p));
            last = p;
            km *= 1.1;
        }
    }
}
