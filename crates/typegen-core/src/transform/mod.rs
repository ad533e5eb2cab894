pub mod constraints;
pub mod error_path;
pub mod filter;
pub mod merge;
pub mod name_normalizer;
pub mod operations;
pub mod schema_resolver;
pub mod type_tracker;
pub mod union;

pub use constraints::{resolve_constraints, Constraints, ConstraintsContext};
pub use error_path::{compile_error_path, AccessStep, ErrorAccess, UNKNOWN_ERROR};
pub use filter::filter_document;
pub use merge::merge_documents;
pub use name_normalizer::{normalize_name, type_name, NamingMode};
pub use schema_resolver::SchemaResolver;
pub use type_tracker::TypeTracker;
