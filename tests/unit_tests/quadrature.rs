use sparse_heat::quadrature::total_order::{triangle, MAX_TRIANGLE_STRENGTH};
use sparse_heat::quadrature::univariate::gauss;
use sparse_heat::quadrature::{Quadrature, QuadratureError};

fn factorial(n: u32) -> f64 {
    (1..=n).map(f64::from).product()
}

/// Exact integral of `(x + 1)^a (y + 1)^b` over the reference triangle.
fn reference_triangle_integral(a: u32, b: u32) -> f64 {
    4.0 * 2f64.powi((a + b) as i32) * factorial(a) * factorial(b) / factorial(a + b + 2)
}

#[test]
fn gauss_rules_are_exact_up_to_degree_2n_minus_1() {
    for n in 1..=4 {
        let rule = gauss(n).unwrap();
        assert_eq!(rule.weights().len(), n);
        assert!((rule.weights().iter().sum::<f64>() - 2.0).abs() < 1e-14);
        for degree in 0..2 * n as i32 {
            let integral = rule.integrate(|x| (x.x + 1.0).powi(degree));
            let exact = 2f64.powi(degree + 1) / f64::from(degree + 1);
            assert!(
                (integral - exact).abs() < 1e-12 * exact,
                "{} point rule, degree {}: {} vs {}",
                n,
                degree,
                integral,
                exact
            );
        }
    }
}

#[test]
fn gauss_rule_is_not_exact_beyond_its_degree() {
    let rule = gauss(2).unwrap();
    let integral = rule.integrate(|x| x.x.powi(4));
    assert!((integral - 0.4).abs() > 1e-3);
}

#[test]
fn unavailable_gauss_rules() {
    assert_eq!(gauss(0), Err(QuadratureError::PointCountNotAvailable { num_points: 0 }));
    assert_eq!(gauss(5), Err(QuadratureError::PointCountNotAvailable { num_points: 5 }));
}

#[test]
fn triangle_rules_are_exact_for_their_strength() {
    for strength in 0..=MAX_TRIANGLE_STRENGTH {
        let rule = triangle(strength).unwrap();
        assert!((rule.weights().iter().sum::<f64>() - 2.0).abs() < 1e-12);
        for total_degree in 0..=strength as u32 {
            for a in 0..=total_degree {
                let b = total_degree - a;
                let integral = rule.integrate(|p| (p.x + 1.0).powi(a as i32) * (p.y + 1.0).powi(b as i32));
                let exact = reference_triangle_integral(a, b);
                assert!(
                    (integral - exact).abs() < 1e-10 * exact,
                    "strength {}, monomial ({}, {}): {} vs {}",
                    strength,
                    a,
                    b,
                    integral,
                    exact
                );
            }
        }
    }
}

#[test]
fn triangle_points_lie_inside_reference_triangle() {
    for strength in 0..=MAX_TRIANGLE_STRENGTH {
        let rule = triangle(strength).unwrap();
        for p in rule.points() {
            assert!(p.x > -1.0 && p.y > -1.0 && p.x + p.y < 0.0);
        }
        assert!(rule.weights().iter().all(|&w| w > 0.0));
    }
}

#[test]
fn unavailable_triangle_strength() {
    let err = triangle(MAX_TRIANGLE_STRENGTH + 1).unwrap_err();
    assert_eq!(
        err,
        QuadratureError::StrengthNotAvailable {
            strength: 6,
            max_strength: 5
        }
    );
    assert_eq!(
        err.to_string(),
        "no quadrature of strength 6 available (maximum strength is 5)"
    );
}
