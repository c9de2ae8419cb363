use crate::error::CliError;
use crate::io::load_descriptor;
use ffisig_cif::BuildOptions;
use std::path::Path;

pub fn handle_check(file: &Path, options: &BuildOptions) -> Result<String, CliError> {
    let descriptor = load_descriptor(file, options)?;
    log::info!("{}: {}", file.display(), descriptor);
    let report = format!("ok: {} argument(s)\n", descriptor.argument_count());
    descriptor.release();
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_signature(dir: &TempDir, text: &str) -> std::path::PathBuf {
        let path = dir.path().join("signature.json");
        fs::write(&path, text).expect("Failed to write signature file");
        path
    }

    #[test]
    fn test_check_reports_argument_count() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let path = write_signature(
            &dir,
            r#"{"argument types": ["int", "i32"], "return type": "void"}"#,
        );
        let output = handle_check(&path, &BuildOptions::default()).unwrap();
        assert_eq!(output, "ok: 2 argument(s)\n");
    }

    #[test]
    fn test_check_labels_the_bad_name() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let path = write_signature(
            &dir,
            r#"{"argument types": ["int", "i33"], "return type": "void"}"#,
        );
        match handle_check(&path, &BuildOptions::default()).unwrap_err() {
            CliError::Signature { span, message, .. } => {
                assert_eq!(span.map(|s| s.offset()), Some(28));
                assert_eq!(message, "Unknown type name 'i33'");
            }
            other => panic!("expected Signature, got {:?}", other),
        }
    }

    #[test]
    fn test_check_labels_runaway_nesting() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let text = format!(
            r#"{{"argument types": [], "return type": {}"u8"{}}}"#,
            "[".repeat(2_000),
            "]".repeat(2_000)
        );
        let path = write_signature(&dir, &text);
        match handle_check(&path, &BuildOptions::default()).unwrap_err() {
            CliError::Signature { span, .. } => {
                assert_eq!(span.map(|s| s.offset()), Some(38 + 256))
            }
            other => panic!("expected Signature, got {:?}", other),
        }
    }

    #[test]
    fn test_check_missing_file() {
        let dir = TempDir::new().expect("Failed to create temporary directory");
        let err =
            handle_check(&dir.path().join("absent.json"), &BuildOptions::default()).unwrap_err();
        assert!(matches!(err, CliError::IoError { .. }), "got {:?}", err);
    }
}
