// Domain layer: flight-offer models and ports (interfaces) to the search API and notification channel.

pub mod model;
pub mod ports;
