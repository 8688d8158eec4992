
pub mod logging;
pub mod mrc;
pub mod normalize;
pub mod batch;
pub mod predict_config;
pub mod download;
pub mod predict;
pub mod image;
pub mod pipeline;
