//! Quadrature rules on the reference segment [-1, 1] and the reference triangle
//! (-1, -1), (1, -1), (-1, 1).
use core::fmt;
use nalgebra::{Point1, Point2};
use std::error::Error;

pub mod total_order;
pub mod univariate;

pub type QuadraturePair<P> = (Vec<f64>, Vec<P>);
pub type QuadraturePair1d = QuadraturePair<Point1<f64>>;
pub type QuadraturePair2d = QuadraturePair<Point2<f64>>;

/// Errors returned by quadrature methods.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuadratureError {
    /// No rule of the requested strength is available.
    StrengthNotAvailable { strength: usize, max_strength: usize },
    /// No rule with the requested number of points is available.
    PointCountNotAvailable { num_points: usize },
}

impl fmt::Display for QuadratureError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StrengthNotAvailable { strength, max_strength } => write!(
                f,
                "no quadrature of strength {} available (maximum strength is {})",
                strength, max_strength
            ),
            Self::PointCountNotAvailable { num_points } => {
                write!(f, "no Gauss rule with {} points available", num_points)
            }
        }
    }
}

impl Error for QuadratureError {}

/// A quadrature rule consisting of weights and points.
pub trait Quadrature<P> {
    fn weights(&self) -> &[f64];
    fn points(&self) -> &[P];

    /// Approximates the integral of the given function using this quadrature rule.
    fn integrate<F>(&self, f: F) -> f64
    where
        F: Fn(&P) -> f64,
    {
        self.weights()
            .iter()
            .zip(self.points())
            .map(|(w, p)| w * f(p))
            .sum()
    }
}

impl<P> Quadrature<P> for QuadraturePair<P> {
    fn weights(&self) -> &[f64] {
        &self.0
    }

    fn points(&self) -> &[P] {
        &self.1
    }
}
