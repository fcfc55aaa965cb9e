// Domain layer: workflow models and the ports the workflow drives.

pub mod model;
pub mod ports;
