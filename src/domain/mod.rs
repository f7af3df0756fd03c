// Domain layer: cart and risk models plus the ports the scoring core reads through.

pub mod model;
pub mod ports;
