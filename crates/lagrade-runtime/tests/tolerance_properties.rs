//! Property tests for the grading comparator.
//!
//! Reproduce: `PROPTEST_SEED=<seed> cargo test -p lagrade-runtime --test tolerance_properties`

use lagrade_runtime::{Tolerance, allclose_matrix, allclose_scalar, allclose_vec};
use proptest::prelude::*;

fn arb_matrix() -> impl Strategy<Value = Vec<Vec<f64>>> {
    (1usize..5, 1usize..5).prop_flat_map(|(n, m)| {
        prop::collection::vec(prop::collection::vec(-1e3..1e3_f64, m..=m), n..=n)
    })
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(500))]

    #[test]
    fn every_finite_value_is_close_to_itself(x in -1e12..1e12_f64) {
        prop_assert!(allclose_scalar(x, x, 0.0, 0.0));
    }

    #[test]
    fn drift_inside_bound_is_accepted(
        expected in -1e3..1e3_f64,
        frac in -0.99..0.99_f64,
    ) {
        let tol = Tolerance::GRADING;
        let actual = expected + frac * tol.bound(expected);
        prop_assert!(tol.scalar(actual, expected));
    }

    #[test]
    fn drift_outside_bound_is_rejected(
        expected in -1e3..1e3_f64,
        factor in 1.01..10.0_f64,
        negative in any::<bool>(),
    ) {
        let tol = Tolerance::GRADING;
        let step = factor * tol.bound(expected);
        let actual = if negative { expected - step } else { expected + step };
        prop_assert!(!tol.scalar(actual, expected));
    }

    #[test]
    fn matrix_closeness_is_elementwise(a in arb_matrix()) {
        prop_assert!(allclose_matrix(&a, &a, 0.0, 0.0));
        let mut perturbed = a.clone();
        perturbed[0][0] += 1.0 + 0.1 * a[0][0].abs();
        prop_assert!(!allclose_matrix(&perturbed, &a, 0.05, 0.05));
    }

    #[test]
    fn appending_an_element_breaks_closeness(v in prop::collection::vec(-10.0..10.0_f64, 1..6)) {
        let mut longer = v.clone();
        longer.push(0.0);
        prop_assert!(!allclose_vec(&longer, &v, 1.0, 1.0));
        prop_assert!(!allclose_vec(&v, &longer, 1.0, 1.0));
    }
}
