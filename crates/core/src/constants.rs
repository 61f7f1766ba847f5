//! Constants used throughout the report core crate.
//!
//! This module contains path, filename and limit constants to ensure consistency across the
//! codebase.

use std::time::Duration;

/// Default directory for report data storage when no explicit directory is configured.
pub const DEFAULT_REPORT_DATA_DIR: &str = "report_data";

/// Directory name for persisted report documents under the data directory.
pub const REPORTS_DIR_NAME: &str = "reports";

/// Template catalog directory, relative to the workspace root.
pub const REPORT_TEMPLATE_DIR: &str = "crates/core/templates";

/// Extension of template catalog files (`<exam>/<subtype>.yaml`).
pub const TEMPLATE_FILE_EXTENSION: &str = "yaml";

/// Extension of persisted report documents (`<consultation>/<exam>.json`).
pub const REPORT_FILE_EXTENSION: &str = "json";

/// Default bound on a single load, save or template fetch.
pub const DEFAULT_IO_TIMEOUT: Duration = Duration::from_secs(10);

/// Number of generated keys tried before giving up on a custom field.
pub const CUSTOM_KEY_ATTEMPTS: usize = 5;

/// Maximum length of a consultation identifier.
pub const MAX_CONSULTATION_ID_LEN: usize = 64;
