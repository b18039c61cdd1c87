// Domain layer: inventory model and the ports external collaborators plug into.

pub mod model;
pub mod ports;
