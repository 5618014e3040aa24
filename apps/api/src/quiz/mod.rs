// Quiz pipeline: request validation, JSON recovery from model output,
// question normalization and the HTTP handlers on top.
// All model calls go through llm_client backends.

pub mod extract;
pub mod generator;
pub mod handlers;
pub mod normalize;
