use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

/// Detection thresholds and comparison switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DetectionConfig {
    /// Minimum number of matching fields for a field clump (floor: 2)
    #[serde(default = "default_min_fields_count")]
    pub min_fields_count: usize,

    /// Minimum number of matching parameters for a parameter clump (floor: 2)
    #[serde(default = "default_min_parameters_count")]
    pub min_parameters_count: usize,

    /// Compare methods declared in the same class against each other
    #[serde(default = "default_include_same_class")]
    pub include_methods_in_same_class: bool,

    /// Run the hierarchy check on field clumps: classes sharing a
    /// superclass or interface are not reported against each other
    #[serde(default = "default_check_hierarchy")]
    pub check_fields_hierarchy: bool,

    /// Run the hierarchy check on parameter clumps: overriding methods
    /// become eligible, but pairs of classes sharing a hierarchy are
    /// skipped. When off, any method with a supertype declaration is
    /// excluded instead.
    #[serde(default = "default_check_hierarchy")]
    pub check_parameters_hierarchy: bool,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            min_fields_count: default_min_fields_count(),
            min_parameters_count: default_min_parameters_count(),
            include_methods_in_same_class: default_include_same_class(),
            check_fields_hierarchy: default_check_hierarchy(),
            check_parameters_hierarchy: default_check_hierarchy(),
        }
    }
}

/// Two matching declarations are never a clump, whatever the config says.
pub const THRESHOLD_FLOOR: usize = 2;

impl DetectionConfig {
    /// Raise thresholds below the floor back to it.
    pub fn normalize(&mut self) {
        if self.min_fields_count < THRESHOLD_FLOOR {
            log::warn!(
                "min_fields_count {} is below the floor, using {}",
                self.min_fields_count,
                THRESHOLD_FLOOR
            );
            self.min_fields_count = THRESHOLD_FLOOR;
        }
        if self.min_parameters_count < THRESHOLD_FLOOR {
            log::warn!(
                "min_parameters_count {} is below the floor, using {}",
                self.min_parameters_count,
                THRESHOLD_FLOOR
            );
            self.min_parameters_count = THRESHOLD_FLOOR;
        }
    }
}

fn default_min_fields_count() -> usize {
    3
}
fn default_min_parameters_count() -> usize {
    3
}
fn default_include_same_class() -> bool {
    true
}
fn default_check_hierarchy() -> bool {
    false
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    pub default_format: Option<String>,
}

/// Root configuration, read from `.declump.toml`
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct DeclumpConfig {
    #[serde(default)]
    pub detection: DetectionConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

/// Cache the configuration
static CONFIG: OnceLock<DeclumpConfig> = OnceLock::new();

fn read_config_file(path: &Path) -> Result<String, std::io::Error> {
    let file = fs::File::open(path)?;
    let mut reader = BufReader::new(file);
    let mut contents = String::new();
    reader.read_to_string(&mut contents)?;
    Ok(contents)
}

fn parse_config(contents: &str) -> Result<DeclumpConfig, String> {
    let mut config = toml::from_str::<DeclumpConfig>(contents)
        .map_err(|e| format!("Failed to parse .declump.toml: {e}"))?;
    config.detection.normalize();
    Ok(config)
}

fn try_load_config_from_path(path: &Path) -> Option<DeclumpConfig> {
    if !path.exists() {
        return None;
    }
    match read_config_file(path)
        .map_err(|e| e.to_string())
        .and_then(|c| parse_config(&c))
    {
        Ok(config) => {
            log::debug!("Loaded configuration from {}", path.display());
            Some(config)
        }
        Err(e) => {
            log::warn!("Ignoring {}: {}", path.display(), e);
            None
        }
    }
}

fn directory_ancestors(start: PathBuf, max_depth: usize) -> impl Iterator<Item = PathBuf> {
    std::iter::successors(Some(start), |dir| {
        let mut parent = dir.clone();
        if parent.pop() {
            Some(parent)
        } else {
            None
        }
    })
    .take(max_depth)
}

/// Load configuration from the nearest `.declump.toml`, walking up from the
/// current directory.
pub fn load_config() -> DeclumpConfig {
    const MAX_TRAVERSAL_DEPTH: usize = 10;

    let current = match std::env::current_dir() {
        Ok(dir) => dir,
        Err(e) => {
            log::warn!("Failed to get current directory: {e}. Using default config.");
            return DeclumpConfig::default();
        }
    };

    directory_ancestors(current, MAX_TRAVERSAL_DEPTH)
        .map(|dir| dir.join(".declump.toml"))
        .find_map(|path| try_load_config_from_path(&path))
        .unwrap_or_default()
}

/// Get the cached configuration
pub fn get_config() -> &'static DeclumpConfig {
    CONFIG.get_or_init(load_config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DeclumpConfig::default();
        assert_eq!(config.detection.min_fields_count, 3);
        assert_eq!(config.detection.min_parameters_count, 3);
        assert!(config.detection.include_methods_in_same_class);
        assert!(!config.detection.check_fields_hierarchy);
        assert!(!config.detection.check_parameters_hierarchy);
    }

    #[test]
    fn test_partial_file_fills_in_defaults() {
        let config = parse_config(
            r#"
            [detection]
            min_fields_count = 4
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.min_fields_count, 4);
        assert_eq!(config.detection.min_parameters_count, 3);
    }

    #[test]
    fn test_thresholds_below_floor_are_raised() {
        let config = parse_config(
            r#"
            [detection]
            min_fields_count = 1
            min_parameters_count = 0
            "#,
        )
        .unwrap();
        assert_eq!(config.detection.min_fields_count, THRESHOLD_FLOOR);
        assert_eq!(config.detection.min_parameters_count, THRESHOLD_FLOOR);
    }

    #[test]
    fn test_invalid_toml_is_an_error() {
        assert!(parse_config("[detection\nmin_fields_count = ").is_err());
    }

    #[test]
    fn test_output_format_section() {
        let config = parse_config(
            r#"
            [output]
            default_format = "json"
            "#,
        )
        .unwrap();
        assert_eq!(config.output.default_format.as_deref(), Some("json"));
    }
}
