mod galerkin;
mod solver;
