mod parameters;
mod schemas;
mod types;

pub use parameters::*;
pub use schemas::*;
pub use types::*;
