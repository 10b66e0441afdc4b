use std::ops::Index;

/// A unit vector on the (N-1)-sphere embedded in N-dimensional space.
///
/// Coordinates are only reachable through read-only accessors, so a point
/// stays normalized for its whole lifetime.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    coords: Vec<f64>,
}

impl Point {
    /// Normalizes `coords` into a point. Returns `None` for zero or non-finite vectors.
    pub fn normalized(mut coords: Vec<f64>) -> Option<Self> {
        let norm = l2_norm(&coords);
        if !norm.is_finite() || norm <= f64::EPSILON {
            return None;
        }
        for x in coords.iter_mut() {
            *x /= norm;
        }
        Some(Point { coords })
    }

    pub fn dim(&self) -> usize {
        self.coords.len()
    }

    pub fn coords(&self) -> &[f64] {
        &self.coords
    }

    pub fn norm(&self) -> f64 {
        l2_norm(&self.coords)
    }

    /// Single-precision copy for GPU upload. `None` unless the point is 3-D.
    pub fn to_array3(&self) -> Option<[f32; 3]> {
        match self.coords.as_slice() {
            [x, y, z] => Some([*x as f32, *y as f32, *z as f32]),
            _ => None,
        }
    }
}

impl Index<usize> for Point {
    type Output = f64;

    fn index(&self, index: usize) -> &f64 {
        &self.coords[index]
    }
}

fn l2_norm(v: &[f64]) -> f64 {
    v.iter().map(|x| x * x).sum::<f64>().sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalized_scales_to_unit_length() {
        let p = Point::normalized(vec![3.0, 4.0]).unwrap();
        assert!((p.norm() - 1.0).abs() < 1e-12);
        assert!((p[0] - 0.6).abs() < 1e-12);
        assert!((p[1] - 0.8).abs() < 1e-12);
    }

    #[test]
    fn normalized_rejects_zero_and_nan() {
        assert!(Point::normalized(vec![0.0, 0.0, 0.0]).is_none());
        assert!(Point::normalized(vec![f64::NAN, 1.0]).is_none());
        assert!(Point::normalized(vec![f64::INFINITY, 1.0]).is_none());
    }

    #[test]
    fn to_array3_only_for_three_dimensions() {
        let p3 = Point::normalized(vec![0.0, 0.0, 2.0]).unwrap();
        assert_eq!(p3.to_array3(), Some([0.0, 0.0, 1.0]));

        let p4 = Point::normalized(vec![1.0, 1.0, 1.0, 1.0]).unwrap();
        assert_eq!(p4.to_array3(), None);
    }
}
