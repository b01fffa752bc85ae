pub mod affine;
pub mod stats;
