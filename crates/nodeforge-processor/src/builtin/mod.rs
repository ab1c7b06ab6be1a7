//! Built-in processors for the six node types the editor ships with.

mod crop;
mod frame;
mod llm;
mod source;

pub use crop::CropImageProcessor;
pub use frame::ExtractFrameProcessor;
pub use llm::LlmProcessor;
pub use source::StaticFieldProcessor;
