// Domain layer - Resource kinds, payload shapes, fetch outcomes
pub mod fetch;
pub mod payload;
pub mod resource;
