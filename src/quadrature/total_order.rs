//! Quadrature rules parametrized by polynomial total-order accuracy.
use crate::element::reference_coords_from_barycentric;
use crate::quadrature::{QuadratureError, QuadraturePair2d};

pub const MAX_TRIANGLE_STRENGTH: usize = 5;

/// Symmetric quadrature on the reference triangle which integrates polynomials of total degree
/// at most `strength` exactly.
///
/// The weights sum to the area of the reference triangle, which is 2.
pub fn triangle(strength: usize) -> Result<QuadraturePair2d, QuadratureError> {
    // Barycentric points with weights normalized to unit total weight
    let rule: Vec<([f64; 3], f64)> = match strength {
        0 | 1 => vec![([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], 1.0)],
        2 => orbit_3(2.0 / 3.0, 1.0 / 6.0, 1.0 / 3.0),
        3 | 4 => {
            let mut rule = orbit_3(0.108103018168070, 0.445948490915965, 0.223381589678011);
            rule.extend(orbit_3(0.816847572980459, 0.091576213509771, 0.109951743655322));
            rule
        }
        5 => {
            let mut rule = vec![([1.0 / 3.0, 1.0 / 3.0, 1.0 / 3.0], 0.225)];
            rule.extend(orbit_3(0.059715871789770, 0.470142064105115, 0.132394152788506));
            rule.extend(orbit_3(0.797426985353087, 0.101286507323456, 0.125939180544827));
            rule
        }
        _ => {
            return Err(QuadratureError::StrengthNotAvailable {
                strength,
                max_strength: MAX_TRIANGLE_STRENGTH,
            })
        }
    };

    Ok(rule
        .into_iter()
        .map(|(lambda, w)| (2.0 * w, reference_coords_from_barycentric(&lambda)))
        .unzip())
}

/// The three barycentric permutations of `(a, b, b)`, all with weight `w`.
fn orbit_3(a: f64, b: f64, w: f64) -> Vec<([f64; 3], f64)> {
    vec![([a, b, b], w), ([b, a, b], w), ([b, b, a], w)]
}
