//! Quadrature rules for 1D domains.
use crate::quadrature::{QuadratureError, QuadraturePair1d};
use nalgebra::Point1;

/// Gauss-Legendre quadrature on [-1, 1] with the given number of points (1 to 4).
///
/// A rule with `n` points integrates polynomials of degree `2n - 1` exactly.
pub fn gauss(num_points: usize) -> Result<QuadraturePair1d, QuadratureError> {
    let (weights, points): (Vec<f64>, Vec<f64>) = match num_points {
        1 => (vec![2.0], vec![0.0]),
        2 => {
            let x = 1.0 / 3.0f64.sqrt();
            (vec![1.0, 1.0], vec![-x, x])
        }
        3 => {
            let x = (3.0f64 / 5.0).sqrt();
            (vec![5.0 / 9.0, 8.0 / 9.0, 5.0 / 9.0], vec![-x, 0.0, x])
        }
        4 => {
            let (x1, w1) = (0.3399810435848563, 0.6521451548625461);
            let (x2, w2) = (0.8611363115940526, 0.3478548451374538);
            (vec![w2, w1, w1, w2], vec![-x2, -x1, x1, x2])
        }
        _ => return Err(QuadratureError::PointCountNotAvailable { num_points }),
    };
    Ok((weights, points.into_iter().map(|x| Point1::new(x)).collect()))
}
