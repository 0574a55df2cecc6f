pub mod logger;
pub mod pipeline;
