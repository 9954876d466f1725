use thiserror::Error;

/// Errors raised while constructing geometry.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Error)]
pub enum Error {
    /// curve or surface built with no control points
    #[error("empty control net")]
    EmptyControlNet,
    /// rows of the control net have different lengths
    #[error("irregular control net")]
    IrregularControlNet,
    /// patch grid rows have different lengths
    #[error("irregular patch grid")]
    IrregularPatchGrid,
    /// interpolation needs at least two points
    #[error("too few points to interpolate: {0}")]
    TooFewPoints(usize),
}

#[test]
fn display() {
    assert_eq!(Error::EmptyControlNet.to_string(), "empty control net");
}
