mod gradient;
mod grid;
mod interp;

pub use gradient::*;
pub use grid::*;
pub use interp::*;
