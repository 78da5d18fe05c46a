// Domain layer: rate models and ports. No storage or network code lives here.

pub mod model;
pub mod ports;
