use approx::assert_abs_diff_eq;

use crate::matrix::Matrix;

/// Tolerance for element comparisons. Rotation coefficients come out of f32
/// trig, so exact comparison is too strict there.
pub const ELEM_EPSILON: f32 = 1e-3;

/// Asserts that the matrix's elements match `expected` within
/// [`ELEM_EPSILON`], slot by slot. An expected NaN matches any NaN.
pub fn assert_elems_near(m: &Matrix, expected: [f32; 6]) {
    let got = m.elements();
    for (slot, (&g, &e)) in got.iter().zip(expected.iter()).enumerate() {
        if e.is_nan() {
            assert!(
                g.is_nan(),
                "slot {slot}: expected NaN, got {g} (elements {got:?})"
            );
        } else {
            assert_abs_diff_eq!(g, e, epsilon = ELEM_EPSILON);
        }
    }
}
