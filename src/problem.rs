//! Heat problems on the unit square with known exact solutions.
//!
//! All problems solve `∂u/∂t - div q = f` with heat flux `q = Q ∇u` on `(0, 1)^2 × (0, T)`,
//! with homogeneous Dirichlet conditions on the whole boundary. Coefficients are pure functions
//! of position and time.
use crate::config::ConfigError;
use crate::mesh::procedural::create_unit_square_uniform_tri_mesh_2d;
use crate::mesh::TriangleMesh2d;
use nalgebra::{Matrix2, Point2, Vector2};
use std::f64::consts::PI;
use std::fmt::Debug;

pub trait HeatProblem: Debug {
    fn name(&self) -> &'static str;

    /// The medium tensor `Q(x)`.
    fn medium(&self, x: &Point2<f64>) -> Matrix2<f64>;

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64;

    fn temperature_gradient(&self, x: &Point2<f64>, t: f64) -> Vector2<f64>;

    /// The exact heat flux `Q ∇u`.
    fn heat_flux(&self, x: &Point2<f64>, t: f64) -> Vector2<f64> {
        self.medium(x) * self.temperature_gradient(x, t)
    }

    fn initial_temperature(&self, x: &Point2<f64>) -> f64 {
        self.temperature(x, 0.0)
    }

    fn source(&self, x: &Point2<f64>, t: f64) -> f64;

    /// The coarsest spatial mesh of the domain.
    fn coarse_mesh(&self) -> TriangleMesh2d {
        create_unit_square_uniform_tri_mesh_2d(1)
    }
}

fn sin_sin(x: &Point2<f64>) -> f64 {
    (PI * x.x).sin() * (PI * x.y).sin()
}

fn grad_sin_sin(x: &Point2<f64>) -> Vector2<f64> {
    Vector2::new(
        PI * (PI * x.x).cos() * (PI * x.y).sin(),
        PI * (PI * x.x).sin() * (PI * x.y).cos(),
    )
}

/// Exponentially decaying solution with a constant isotropic medium `exp(r) I` and zero source.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UnitSquareTest1 {
    pub random_variable: f64,
}

impl UnitSquareTest1 {
    fn coefficient(&self) -> f64 {
        self.random_variable.exp()
    }

    fn decay(&self, t: f64) -> f64 {
        (-2.0 * PI * PI * self.coefficient() * t).exp()
    }
}

impl Default for UnitSquareTest1 {
    fn default() -> Self {
        Self { random_variable: 0.0 }
    }
}

impl HeatProblem for UnitSquareTest1 {
    fn name(&self) -> &'static str {
        "unitSquare_test1"
    }

    fn medium(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity() * self.coefficient()
    }

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64 {
        sin_sin(x) * self.decay(t)
    }

    fn temperature_gradient(&self, x: &Point2<f64>, t: f64) -> Vector2<f64> {
        grad_sin_sin(x) * self.decay(t)
    }

    fn source(&self, _x: &Point2<f64>, _t: f64) -> f64 {
        0.0
    }
}

/// Oscillating solution `sin(πx) sin(πy) cos(πt)` with unit medium and non-zero source.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct UnitSquareTest2;

impl HeatProblem for UnitSquareTest2 {
    fn name(&self) -> &'static str {
        "unitSquare_test2"
    }

    fn medium(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::identity()
    }

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64 {
        sin_sin(x) * (PI * t).cos()
    }

    fn temperature_gradient(&self, x: &Point2<f64>, t: f64) -> Vector2<f64> {
        grad_sin_sin(x) * (PI * t).cos()
    }

    fn source(&self, x: &Point2<f64>, t: f64) -> f64 {
        PI * sin_sin(x) * (2.0 * PI * (PI * t).cos() - (PI * t).sin())
    }
}

/// Solution `sin(πx) sin(πy) sin(πt)` with zero initial data and non-zero source.
///
/// The medium is `exp(r (sin(πx) + sin(πy))) I`, and the exact solution only holds for `r = 0`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct UnitSquareTest3 {
    pub random_variable: f64,
}

impl Default for UnitSquareTest3 {
    fn default() -> Self {
        Self { random_variable: 0.0 }
    }
}

impl HeatProblem for UnitSquareTest3 {
    fn name(&self) -> &'static str {
        "unitSquare_test3"
    }

    fn medium(&self, x: &Point2<f64>) -> Matrix2<f64> {
        let perturbation = (self.random_variable * ((PI * x.x).sin() + (PI * x.y).sin())).exp();
        Matrix2::identity() * perturbation
    }

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64 {
        sin_sin(x) * (PI * t).sin()
    }

    fn temperature_gradient(&self, x: &Point2<f64>, t: f64) -> Vector2<f64> {
        grad_sin_sin(x) * (PI * t).sin()
    }

    fn source(&self, x: &Point2<f64>, t: f64) -> f64 {
        PI * sin_sin(x) * (2.0 * PI * (PI * t).sin() + (PI * t).cos())
    }
}

/// Solution `sin(πx) sin(πy) sin(πt)` with a constant anisotropic medium.
#[derive(Debug, Copy, Clone, PartialEq, Default)]
pub struct UnitSquareTest4;

impl HeatProblem for UnitSquareTest4 {
    fn name(&self) -> &'static str {
        "unitSquare_test4"
    }

    #[rustfmt::skip]
    fn medium(&self, _x: &Point2<f64>) -> Matrix2<f64> {
        Matrix2::new(1.0 / 2.0, 1.0 / 4.0,
                     1.0 / 4.0, 2.0 / 3.0)
    }

    fn temperature(&self, x: &Point2<f64>, t: f64) -> f64 {
        sin_sin(x) * (PI * t).sin()
    }

    fn temperature_gradient(&self, x: &Point2<f64>, t: f64) -> Vector2<f64> {
        grad_sin_sin(x) * (PI * t).sin()
    }

    fn source(&self, x: &Point2<f64>, t: f64) -> f64 {
        let cos_cos = (PI * x.x).cos() * (PI * x.y).cos();
        let du_dt = PI * sin_sin(x) * (PI * t).cos();
        let div_q = -PI * PI * (PI * t).sin() * (7.0 / 6.0 * sin_sin(x) - 0.5 * cos_cos);
        du_dt - div_q
    }
}

/// Creates a problem from its configuration name.
pub fn problem_from_name(name: &str) -> Result<Box<dyn HeatProblem>, ConfigError> {
    match name {
        "unitSquare_test1" => Ok(Box::new(UnitSquareTest1::default())),
        "unitSquare_test2" => Ok(Box::new(UnitSquareTest2)),
        "unitSquare_test3" => Ok(Box::new(UnitSquareTest3::default())),
        "unitSquare_test4" => Ok(Box::new(UnitSquareTest4)),
        _ => Err(ConfigError::UnknownProblem(name.to_string())),
    }
}
