//! Nodeforge Processor
//!
//! Node processors are the per-type units of work the engine dispatches to.
//! Each one receives the resolved input mapping of a node and returns an
//! output mapping (always containing `output`) or a descriptive error.
//!
//! # Architecture
//!
//! ```text
//! ProcessorRegistry  (NodeKind -> Arc<dyn Processor>)
//! ├── text / uploadImage / uploadVideo   - echo static configuration
//! ├── llm            -> LlmClient        - GeminiClient over HTTP
//! ├── cropImage      -> MediaService     - HttpMediaService task queue
//! └── extractFrame   -> MediaService
//! ```
//!
//! Custom node types are added with [`ProcessorRegistry::register`] or
//! [`ProcessorRegistry::register_fn`].

mod builtin;
mod error;
mod llm;
mod media;
mod processor;
mod registry;
mod value;

pub use builtin::{CropImageProcessor, ExtractFrameProcessor, LlmProcessor, StaticFieldProcessor};
pub use error::ProcessorError;
pub use llm::{GeminiClient, LlmClient, LlmConfig, LlmError, LlmRequest};
pub use media::{CropRegion, HttpMediaService, MediaConfig, MediaError, MediaService};
pub use processor::{Inputs, Outputs, Processor, ProcessorContext};
pub use registry::ProcessorRegistry;
pub use value::{Timestamp, parse_percent};
