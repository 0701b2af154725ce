// Domain layer: field catalogue, request/prediction models and ports (interfaces).

pub mod model;
pub mod ports;
