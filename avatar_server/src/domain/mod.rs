// Domain layer: session entities, errors and the ports adapters implement.

pub mod entities;
pub mod errors;
pub mod ports;
