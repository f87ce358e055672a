//! # Config Loader
//!
//! Scenario loading and parsing.
//!
//! Responsibilities:
//! - parse TOML/JSON scenario files
//! - validate scenario consistency
//! - produce a `ScenarioBlueprint`
//!
//! # Example
//!
//! ```no_run
//! use config_loader::ScenarioLoader;
//! use std::path::Path;
//!
//! let blueprint = ScenarioLoader::load_from_path(Path::new("scenario.toml")).unwrap();
//! println!("Scenario: {}", blueprint.scenario.name);
//! ```

mod parser;
mod scenario;
mod validator;

pub use parser::ConfigFormat;
pub use scenario::{
    BufferFlavor, BufferSection, ScenarioBlueprint, ScenarioSection, SourceSpec,
};

use contracts::BufferError;
use std::path::Path;

/// Scenario loader
///
/// Static methods for loading scenarios from files or strings.
pub struct ScenarioLoader;

impl ScenarioLoader {
    /// Load a scenario from a file path.
    ///
    /// The format is detected from the file extension (.toml / .json).
    ///
    /// # Errors
    /// - file read failure
    /// - unsupported format
    /// - parse failure
    /// - validation failure
    pub fn load_from_path(path: &Path) -> Result<ScenarioBlueprint, BufferError> {
        let format = Self::detect_format(path)?;
        let content = std::fs::read_to_string(path)?;
        Self::load_from_str(&content, format)
    }

    /// Load a scenario from a string.
    ///
    /// # Errors
    /// - parse failure
    /// - validation failure
    pub fn load_from_str(
        content: &str,
        format: ConfigFormat,
    ) -> Result<ScenarioBlueprint, BufferError> {
        let blueprint = parser::parse(content, format)?;
        validator::validate(&blueprint)?;
        Ok(blueprint)
    }

    /// Serialize a scenario to a TOML string
    pub fn to_toml(blueprint: &ScenarioBlueprint) -> Result<String, BufferError> {
        toml::to_string_pretty(blueprint)
            .map_err(|e| BufferError::config_parse(format!("TOML serialize error: {e}")))
    }

    /// Serialize a scenario to a JSON string
    pub fn to_json(blueprint: &ScenarioBlueprint) -> Result<String, BufferError> {
        serde_json::to_string_pretty(blueprint)
            .map_err(|e| BufferError::config_parse(format!("JSON serialize error: {e}")))
    }

    /// Infer the scenario format from the file extension
    fn detect_format(path: &Path) -> Result<ConfigFormat, BufferError> {
        let ext = path.extension().and_then(|e| e.to_str()).ok_or_else(|| {
            BufferError::config_parse("cannot determine file format from extension")
        })?;

        ConfigFormat::from_extension(ext)
            .ok_or_else(|| BufferError::config_parse(format!("unsupported config format: .{ext}")))
    }
}
