// Library crate root.
//
// A 2D affine transformation engine: `matrix` holds the six-coefficient
// `Matrix` type and all of its algebra, `geom` the plain point/rectangle
// data it operates on.

pub mod geom;
pub mod matrix;

#[cfg(test)]
pub mod test_helpers;
