pub mod either;
pub mod errors;
pub mod json;
pub mod raw_union;

pub use either::Either;
pub use errors::{
    check_enum, check_min_items, check_required, tag_message, ValidationError, ValidationErrors,
};
pub use json::{capture_additional_properties, coalesce_or_merge, json_merge};
pub use raw_union::{RawUnion, UnionDecodeError};
