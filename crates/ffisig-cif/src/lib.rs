//! Prepared foreign call descriptors from declarative signatures.
//!
//! A signature is a small JSON object:
//!
//! ```text
//! {"argument types": ["int", ["i32", "i32"]], "return type": "void"}
//! ```
//!
//! [`build`] tokenizes it, parses every type into a descriptor tree, and
//! hands the trees to a [`Backend`] (libffi by default) which prepares a
//! call interface. Any failure along the way releases whatever was built.

pub mod assemble;
pub mod backend;
pub mod config;
pub mod descriptor;
pub mod error;
pub mod native;

pub use assemble::{build, build_with, ARGUMENT_TYPES, RETURN_TYPE};
pub use backend::{Backend, BackendError};
pub use config::{BuildOptions, ConfigError, MissingKeyPolicy, UnknownKeyPolicy};
pub use descriptor::CallDescriptor;
pub use error::{CifError, CifResult};
pub use native::{LibffiBackend, PreparedCif};

pub use ffisig_syntax::TokenizeError;
pub use ffisig_types::{Aggregate, PrimitiveType, TypeDescriptor};
