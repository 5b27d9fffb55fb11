pub mod errors;
pub mod metadata;
pub mod models;
pub mod resolver;
pub mod sanitize;
pub mod stream_selector;

pub use errors::ResolveError;
pub use metadata::extract_metadata;
pub use models::{Container, FormatVariant, Quality, SourceDescriptor, TrackMetadata};
pub use resolver::{SourceResolver, YtDlpResolver};
pub use sanitize::{output_file_name, sanitize_file_name};
pub use stream_selector::{StreamCriteria, StreamSelector};
