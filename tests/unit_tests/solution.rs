use nalgebra::DVector;
use sparse_heat::solution::SolutionHandler;

// Three time nodes with 4 temperature and 5 heat flux dofs on the finest level, followed by a
// coarser block of 2 temperature and 3 heat flux dofs
fn handler() -> SolutionHandler {
    SolutionHandler::new(3 * 4 + 2, 3 * 5 + 3, 3, 4, 5)
}

fn indexed_solution(len: usize) -> DVector<f64> {
    DVector::from_fn(len, |i, _| i as f64)
}

#[test]
fn slices_at_initial_and_end_time() {
    let handler = handler();
    assert_eq!(handler.num_dofs(), 32);
    let solution = indexed_solution(32);

    assert_eq!(handler.temperature(&solution).len(), 14);
    assert_eq!(handler.heat_flux(&solution)[0], 14.0);
    assert_eq!(handler.heat_flux(&solution).len(), 18);

    assert_eq!(handler.temperature_at_initial_time(&solution).as_slice(), &[0.0, 1.0, 2.0, 3.0]);
    assert_eq!(handler.temperature_at_end_time(&solution).as_slice(), &[8.0, 9.0, 10.0, 11.0]);
    assert_eq!(
        handler.heat_flux_at_initial_time(&solution).as_slice(),
        &[14.0, 15.0, 16.0, 17.0, 18.0]
    );
    assert_eq!(
        handler.heat_flux_at_end_time(&solution).as_slice(),
        &[24.0, 25.0, 26.0, 27.0, 28.0]
    );
}

#[test]
#[should_panic]
fn wrong_solution_length_panics() {
    let _ = handler().temperature_at_end_time(&indexed_solution(31));
}

#[test]
#[should_panic]
fn single_time_node_is_rejected() {
    let _ = SolutionHandler::new(4, 5, 1, 4, 5);
}
