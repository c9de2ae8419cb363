use crate::error::CliError;
use crate::io::load_descriptor;
use ffisig_cif::BuildOptions;
use std::path::Path;

#[derive(clap::ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ShowFormat {
    /// One node per line, with struct layouts
    #[default]
    Tree,
    /// A single-line signature
    Signature,
}

pub fn handle_show(
    file: &Path,
    format: ShowFormat,
    options: &BuildOptions,
) -> Result<String, CliError> {
    let descriptor = load_descriptor(file, options)?;
    let output = match format {
        ShowFormat::Tree => descriptor.render_tree(),
        ShowFormat::Signature => format!("{}\n", descriptor),
    };
    descriptor.release();
    Ok(output)
}
