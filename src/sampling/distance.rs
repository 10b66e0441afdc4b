use super::point::Point;

/// Great-circle distance between two unit vectors, in radians (`[0, π]`).
pub fn angular_distance(a: &Point, b: &Point) -> f64 {
    angular_distance_slices(a.coords(), b.coords())
}

/// Same as [`angular_distance`] for raw coordinate slices.
///
/// Both slices must be unit length. The dot product is clamped to `[-1, 1]`
/// first, since rounding can push it just past the domain of `acos`.
pub fn angular_distance_slices(a: &[f64], b: &[f64]) -> f64 {
    debug_assert_eq!(a.len(), b.len(), "dimension mismatch");
    dot(a, b).clamp(-1.0, 1.0).acos()
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampling::generate_point;
    use rand::rngs::StdRng;
    use rand::SeedableRng;
    use std::f64::consts::{FRAC_PI_2, PI};

    fn point(coords: &[f64]) -> Point {
        Point::normalized(coords.to_vec()).unwrap()
    }

    #[test]
    fn distance_to_self_is_zero() {
        let mut rng = StdRng::seed_from_u64(1);
        for _ in 0..100 {
            let p = generate_point(6, &mut rng).unwrap();
            assert!(angular_distance(&p, &p).abs() < 1e-6);
        }
    }

    #[test]
    fn distance_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(2);
        for _ in 0..100 {
            let a = generate_point(3, &mut rng).unwrap();
            let b = generate_point(3, &mut rng).unwrap();
            assert_eq!(angular_distance(&a, &b), angular_distance(&b, &a));
        }
    }

    #[test]
    fn known_angles() {
        let x = point(&[1.0, 0.0, 0.0]);
        let y = point(&[0.0, 1.0, 0.0]);
        let neg_x = point(&[-1.0, 0.0, 0.0]);
        assert!((angular_distance(&x, &y) - FRAC_PI_2).abs() < 1e-12);
        assert!((angular_distance(&x, &neg_x) - PI).abs() < 1e-12);
    }

    #[test]
    fn overshooting_dot_product_is_clamped() {
        let a = [1.0 + 1e-12, 0.0];
        let b = [1.0, 0.0];
        assert_eq!(angular_distance_slices(&a, &b), 0.0);

        let c = [-1.0 - 1e-12, 0.0];
        assert_eq!(angular_distance_slices(&c, &b), PI);
    }
}
