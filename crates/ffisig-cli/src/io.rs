use std::path::Path;

use crate::error::{convert_cif_error, convert_io_error, CliError, ErrorContext};
use ffisig_cif::{build_with, BuildOptions, CallDescriptor, LibffiBackend};

pub fn read_file(path: &Path) -> Result<String, CliError> {
    let contents =
        std::fs::read_to_string(path).map_err(|e| convert_io_error(e, path.to_path_buf()))?;
    Ok(contents)
}

/// Reads a signature file and builds its call descriptor.
pub fn load_descriptor(path: &Path, options: &BuildOptions) -> Result<CallDescriptor, CliError> {
    let source = read_file(path)?;
    build_with(&source, options, &LibffiBackend).map_err(|error| {
        let ctx = ErrorContext {
            path,
            source: &source,
        };
        convert_cif_error(error, ctx)
    })
}
