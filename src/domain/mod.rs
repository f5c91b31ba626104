// Domain layer: plain launch models and the ports (interfaces) the launcher depends on.

pub mod model;
pub mod ports;
