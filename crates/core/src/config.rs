//! Core runtime configuration.
//!
//! Configuration is resolved once at process startup and then passed into core services as an
//! `Arc<CoreConfig>`. Core code never reads process-wide environment variables itself; binaries
//! read them and hand the raw values to the helpers below.

use crate::constants::{DEFAULT_IO_TIMEOUT, REPORTS_DIR_NAME, REPORT_TEMPLATE_DIR};
use crate::{ReportError, ReportResult};
use report_types::ExamType;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Core configuration resolved at startup.
#[derive(Clone, Debug)]
pub struct CoreConfig {
    report_data_dir: PathBuf,
    template_dir: PathBuf,
    io_timeout: Duration,
}

impl CoreConfig {
    /// Create a new `CoreConfig`.
    ///
    /// # Errors
    ///
    /// Returns [`ReportError::InvalidInput`] if `io_timeout` is zero.
    pub fn new(
        report_data_dir: PathBuf,
        template_dir: PathBuf,
        io_timeout: Duration,
    ) -> ReportResult<Self> {
        if io_timeout.is_zero() {
            return Err(ReportError::InvalidInput(
                "io_timeout must be greater than zero".into(),
            ));
        }

        Ok(Self {
            report_data_dir,
            template_dir,
            io_timeout,
        })
    }

    pub fn report_data_dir(&self) -> &Path {
        &self.report_data_dir
    }

    /// Directory holding one subdirectory of report documents per consultation.
    pub fn reports_dir(&self) -> PathBuf {
        self.report_data_dir.join(REPORTS_DIR_NAME)
    }

    pub fn template_dir(&self) -> &Path {
        &self.template_dir
    }

    pub fn io_timeout(&self) -> Duration {
        self.io_timeout
    }
}

/// Resolve the template catalog directory without reading environment variables.
///
/// If `override_dir` is provided, it must be a directory containing at least one exam type
/// subdirectory (`echography/`, `doppler/`, ...). Otherwise this searches for
/// `crates/core/templates/` relative to the current working directory and then walks up from
/// `CARGO_MANIFEST_DIR`.
pub fn resolve_template_dir(override_dir: Option<PathBuf>) -> ReportResult<PathBuf> {
    fn looks_like_template_dir(path: &Path) -> bool {
        path.is_dir()
            && ExamType::ALL
                .iter()
                .any(|exam_type| path.join(exam_type.as_str()).is_dir())
    }

    if let Some(template_dir) = override_dir {
        if looks_like_template_dir(&template_dir) {
            return Ok(template_dir);
        }
        return Err(ReportError::InvalidInput(
            "REPORT_TEMPLATE_DIR override is not a valid template directory (needs an exam type subfolder)"
                .into(),
        ));
    }

    let cwd_relative = PathBuf::from(REPORT_TEMPLATE_DIR);
    if looks_like_template_dir(&cwd_relative) {
        return Ok(cwd_relative);
    }

    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    for ancestor in manifest_dir.ancestors() {
        let candidate = ancestor.join(REPORT_TEMPLATE_DIR);
        if looks_like_template_dir(&candidate) {
            return Ok(candidate);
        }
    }

    Err(ReportError::InvalidInput(
        "could not locate crates/core/templates/ directory".into(),
    ))
}

/// Parse the I/O timeout from an optional millisecond value.
///
/// If `value` is `None` or empty/whitespace, returns the default of 10 seconds.
pub fn io_timeout_from_env_value(value: Option<String>) -> ReportResult<Duration> {
    let value = value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty());

    let Some(value) = value else {
        return Ok(DEFAULT_IO_TIMEOUT);
    };

    let millis: u64 = value.parse().map_err(|_| {
        ReportError::InvalidInput(format!(
            "REPORT_IO_TIMEOUT_MS must be a whole number of milliseconds, got: '{value}'"
        ))
    })?;
    if millis == 0 {
        return Err(ReportError::InvalidInput(
            "REPORT_IO_TIMEOUT_MS must be greater than zero".into(),
        ));
    }

    Ok(Duration::from_millis(millis))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_core_config_rejects_zero_timeout() {
        let err = CoreConfig::new("data".into(), "templates".into(), Duration::ZERO)
            .expect_err("zero timeout should be rejected");
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[test]
    fn test_reports_dir_is_under_data_dir() {
        let cfg = CoreConfig::new("/srv/data".into(), "templates".into(), DEFAULT_IO_TIMEOUT)
            .expect("valid config");
        assert_eq!(cfg.reports_dir(), PathBuf::from("/srv/data/reports"));
    }

    #[test]
    fn test_resolve_template_dir_accepts_valid_override() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("thyroid")).expect("Failed to create exam dir");

        let resolved =
            resolve_template_dir(Some(temp_dir.path().to_path_buf())).expect("should resolve");
        assert_eq!(resolved, temp_dir.path());
    }

    #[test]
    fn test_resolve_template_dir_rejects_override_without_exam_dirs() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        fs::create_dir(temp_dir.path().join("unrelated")).expect("Failed to create dir");

        let err = resolve_template_dir(Some(temp_dir.path().to_path_buf()))
            .expect_err("should reject");
        assert!(matches!(err, ReportError::InvalidInput(_)));
    }

    #[test]
    fn test_resolve_template_dir_finds_bundled_templates() {
        let resolved = resolve_template_dir(None).expect("bundled templates should be found");
        assert!(resolved.join("thyroid").is_dir());
    }

    #[test]
    fn test_io_timeout_from_env_value() {
        assert_eq!(io_timeout_from_env_value(None).expect("default"), DEFAULT_IO_TIMEOUT);
        assert_eq!(
            io_timeout_from_env_value(Some("  ".into())).expect("default"),
            DEFAULT_IO_TIMEOUT
        );
        assert_eq!(
            io_timeout_from_env_value(Some("2500".into())).expect("parsed"),
            Duration::from_millis(2500)
        );
        assert!(io_timeout_from_env_value(Some("0".into())).is_err());
        assert!(io_timeout_from_env_value(Some("ten".into())).is_err());
    }
}
