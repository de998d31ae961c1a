// Domain layer: persona, patient models and ports. No I/O lives here.

pub mod model;
pub mod persona;
pub mod ports;
