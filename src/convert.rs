//! Conversion of proprietary instrument files to mzML.
//!
//! The pipeline never parses vendor formats itself; it shells out to an
//! external converter (ProteoWizard's `msconvert` by default) through the
//! narrow [`FileConverter`] capability so the core stays decoupled from any
//! particular binary. Conversion of a file completes before its mzML output
//! is opened for reading.

use std::path::{Path, PathBuf};
use std::process::Command;

use log::{debug, info};

/// Errors raised while converting one instrument file.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("instrument file not found: {path}")]
    MissingInput { path: String },

    #[error("companion scan file missing for '{path}'; the instrument writes a '.scan' sidecar that must sit next to the .wiff file")]
    MissingCompanion { path: String },

    #[error("converter '{program}' could not be found; is it installed and on PATH?")]
    ConverterNotFound { program: String },

    #[error("converter exited with {status} while converting '{path}'")]
    Failed { path: String, status: String },

    #[error("conversion of '{path}' reported success but produced no output at '{output}'")]
    MissingOutput { path: String, output: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Capability to convert one instrument file into an mzML file.
pub trait FileConverter {
    /// Convert `input` into `out_dir`, returning the path of the mzML file
    /// produced. The call blocks until conversion has fully completed.
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError>;
}

/// External `msconvert` invocation (ProteoWizard).
#[derive(Debug, Clone)]
pub struct MsConvert {
    program: String,
}

impl Default for MsConvert {
    fn default() -> Self {
        Self {
            program: "msconvert".to_string(),
        }
    }
}

impl MsConvert {
    /// Use a specific converter executable instead of `msconvert` on PATH.
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

impl FileConverter for MsConvert {
    fn convert(&self, input: &Path, out_dir: &Path) -> Result<PathBuf, ConvertError> {
        if !input.exists() {
            return Err(ConvertError::MissingInput {
                path: input.display().to_string(),
            });
        }

        // Sciex .wiff acquisitions come with a .scan sidecar the converter
        // needs; fail up front with a name the user can act on.
        if input.extension().is_some_and(|e| e.eq_ignore_ascii_case("wiff")) {
            let mut scan_file = input.as_os_str().to_owned();
            scan_file.push(".scan");
            if !Path::new(&scan_file).exists() {
                return Err(ConvertError::MissingCompanion {
                    path: input.display().to_string(),
                });
            }
        }

        debug!(
            "running {} {} -o {} --mzML --64",
            self.program,
            input.display(),
            out_dir.display()
        );

        let status = Command::new(&self.program)
            .arg(input)
            .arg("-o")
            .arg(out_dir)
            .args(["--mzML", "--64"])
            .status()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    ConvertError::ConverterNotFound {
                        program: self.program.clone(),
                    }
                } else {
                    ConvertError::Io(e)
                }
            })?;

        if !status.success() {
            return Err(ConvertError::Failed {
                path: input.display().to_string(),
                status: status.to_string(),
            });
        }

        let stem = input
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        let output = out_dir.join(format!("{stem}.mzML"));
        if !output.exists() {
            return Err(ConvertError::MissingOutput {
                path: input.display().to_string(),
                output: output.display().to_string(),
            });
        }

        info!("converted {} -> {}", input.display(), output.display());
        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_input_is_reported_by_path() {
        let converter = MsConvert::default();
        let err = converter
            .convert(Path::new("/nonexistent/run.wiff"), Path::new("/tmp"))
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingInput { .. }));
        assert!(err.to_string().contains("/nonexistent/run.wiff"));
    }

    #[test]
    fn missing_scan_sidecar_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let wiff = dir.path().join("Laser_On_450nm.wiff");
        std::fs::write(&wiff, b"opaque").unwrap();

        let err = MsConvert::default()
            .convert(&wiff, dir.path())
            .unwrap_err();
        assert!(matches!(err, ConvertError::MissingCompanion { .. }));
    }

    #[test]
    fn unknown_program_is_converter_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let wiff = dir.path().join("Laser_On_450nm.wiff");
        std::fs::write(&wiff, b"opaque").unwrap();
        std::fs::write(dir.path().join("Laser_On_450nm.wiff.scan"), b"opaque").unwrap();

        let converter = MsConvert::with_program("definitely-not-a-real-converter");
        let err = converter.convert(&wiff, dir.path()).unwrap_err();
        assert!(matches!(err, ConvertError::ConverterNotFound { .. }));
    }
}
