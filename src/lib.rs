pub mod atlas;
pub mod cli;
pub mod config;
pub mod confounds;
pub mod connectivity;
pub mod ctx;
pub mod error;
pub mod input;
pub mod io;
pub mod math;
pub mod pipeline;
pub mod qc;
pub mod signal;
