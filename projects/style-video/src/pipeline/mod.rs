// Frame sampling, style transfer and reassembly stages

pub mod applier;
pub mod cache;
pub mod combiner;
pub mod fetch;
pub mod frames;
pub mod model;
pub mod orchestrator;
pub mod preprocess;
pub mod sampler;
