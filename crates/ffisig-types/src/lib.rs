//! Type descriptor trees for foreign function signatures.
//!
//! A type is either one of a closed set of primitives, each backed by a
//! single shared instance, or an aggregate that owns an ordered list of
//! child types. [`parser`] builds trees from the flat token stream produced
//! by `ffisig-syntax`, and [`release`] tears them down.

pub mod descriptor;
pub mod parser;
pub mod primitive;
pub mod release;

pub use descriptor::{Aggregate, TypeDescriptor};
pub use parser::{parse_type, parse_type_str, skip_value, ParseError, TypeParser, DEFAULT_MAX_DEPTH};
pub use primitive::PrimitiveType;
pub use release::{release_aggregate, release_all, release_type};
