//! Alias analysis configuration
//!
//! Models for external functions whose bodies are unavailable but whose
//! pointer behaviour matters: heap allocators, thread-spawn entry points and
//! memory copies.

use super::error::{ConfigError, ConfigResult};
use super::validation::Validatable;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration file versions this crate understands
pub const SUPPORTED_VERSIONS: &[u32] = &[1];

/// Largest argument position accepted in a spawn signature
const MAX_ARG_POSITION: usize = 31;

/// A thread-spawn style function: `routine(payload)` runs on another thread
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpawnSignature {
    pub name: String,
    /// Argument position holding the start routine
    pub routine_arg: usize,
    /// Argument position holding the payload passed to the routine
    pub payload_arg: usize,
}

impl SpawnSignature {
    pub fn new(name: impl Into<String>, routine_arg: usize, payload_arg: usize) -> Self {
        Self {
            name: name.into(),
            routine_arg,
            payload_arg,
        }
    }
}

/// Alias analysis configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AliasConfig {
    /// Functions returning a fresh heap object
    pub allocators: Vec<String>,

    /// Functions starting a routine with a payload argument
    pub spawn_functions: Vec<SpawnSignature>,

    /// Functions copying memory from their second to their first argument
    pub copy_functions: Vec<String>,

    /// Keep value names on vertices (diagnostics only)
    pub record_vertex_names: bool,
}

impl Default for AliasConfig {
    fn default() -> Self {
        Self {
            allocators: [
                "malloc",
                "calloc",
                "realloc",
                "aligned_alloc",
                "_Znwm",
                "_Znam",
                "strdup",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            spawn_functions: vec![SpawnSignature::new("pthread_create", 2, 3)],
            copy_functions: [
                "memcpy",
                "memmove",
                "llvm.memcpy.p0.p0.i64",
                "llvm.memmove.p0.p0.i64",
            ]
            .iter()
            .map(|s| s.to_string())
            .collect(),
            record_vertex_names: true,
        }
    }
}

/// YAML schema v1
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFileV1 {
    /// Schema version (always 1 for v1)
    pub version: Option<u32>,

    #[serde(default)]
    pub analysis: AliasConfig,
}

impl AliasConfig {
    /// Configuration with no external function models at all
    pub fn bare() -> Self {
        Self {
            allocators: Vec::new(),
            spawn_functions: Vec::new(),
            copy_functions: Vec::new(),
            record_vertex_names: true,
        }
    }

    /// Builder: Add an allocator
    pub fn allocator(mut self, name: impl Into<String>) -> Self {
        self.allocators.push(name.into());
        self
    }

    /// Builder: Add a spawn function
    pub fn spawn_function(mut self, signature: SpawnSignature) -> Self {
        self.spawn_functions.push(signature);
        self
    }

    /// Builder: Add a copy function
    pub fn copy_function(mut self, name: impl Into<String>) -> Self {
        self.copy_functions.push(name.into());
        self
    }

    /// Builder: Set record_vertex_names
    pub fn record_vertex_names(mut self, v: bool) -> Self {
        self.record_vertex_names = v;
        self
    }

    #[inline]
    pub fn is_allocator(&self, name: &str) -> bool {
        self.allocators.iter().any(|a| a == name)
    }

    #[inline]
    pub fn is_copy_function(&self, name: &str) -> bool {
        self.copy_functions.iter().any(|c| c == name)
    }

    #[inline]
    pub fn spawn_signature(&self, name: &str) -> Option<&SpawnSignature> {
        self.spawn_functions.iter().find(|s| s.name == name)
    }

    // ═══════════════════════════════════════════════════════════════════════
    // YAML I/O
    // ═══════════════════════════════════════════════════════════════════════

    /// Parse and validate a v1 YAML document
    pub fn from_yaml_str(yaml: &str) -> ConfigResult<Self> {
        let file: ConfigFileV1 = serde_yaml::from_str(yaml)?;
        match file.version {
            None => return Err(ConfigError::MissingVersion),
            Some(v) if !SUPPORTED_VERSIONS.contains(&v) => {
                return Err(ConfigError::UnsupportedVersion {
                    found: v,
                    supported: SUPPORTED_VERSIONS.to_vec(),
                })
            }
            Some(_) => {}
        }
        file.analysis.validate()?;
        Ok(file.analysis)
    }

    /// Load and validate a v1 YAML file
    pub fn from_yaml(path: impl AsRef<Path>) -> ConfigResult<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn to_yaml(&self) -> ConfigResult<String> {
        let file = ConfigFileV1 {
            version: Some(SUPPORTED_VERSIONS[0]),
            analysis: self.clone(),
        };
        Ok(serde_yaml::to_string(&file)?)
    }
}

impl Validatable for AliasConfig {
    fn validate(&self) -> ConfigResult<()> {
        let all_names = self
            .allocators
            .iter()
            .chain(self.copy_functions.iter())
            .chain(self.spawn_functions.iter().map(|s| &s.name));
        for name in all_names {
            if name.trim().is_empty() {
                return Err(ConfigError::Validation(
                    "external function names must not be empty".to_string(),
                ));
            }
        }

        for (i, spawn) in self.spawn_functions.iter().enumerate() {
            for (field, value) in [
                ("routine_arg", spawn.routine_arg),
                ("payload_arg", spawn.payload_arg),
            ] {
                if value > MAX_ARG_POSITION {
                    return Err(ConfigError::range_with_hint(
                        format!("spawn_functions[{}].{}", i, field),
                        value,
                        0,
                        MAX_ARG_POSITION,
                        "Argument positions must fit a call's argument list",
                    ));
                }
            }
            if spawn.routine_arg == spawn.payload_arg {
                return Err(ConfigError::Validation(format!(
                    "spawn function '{}' uses argument {} as both routine and payload",
                    spawn.name, spawn.routine_arg
                )));
            }
        }

        for name in &self.allocators {
            if self.is_copy_function(name) {
                return Err(ConfigError::role_conflict(
                    name,
                    "listed as allocator and copy function",
                ));
            }
            if self.spawn_signature(name).is_some() {
                return Err(ConfigError::role_conflict(
                    name,
                    "listed as allocator and spawn function",
                ));
            }
        }
        for name in &self.copy_functions {
            if self.spawn_signature(name).is_some() {
                return Err(ConfigError::role_conflict(
                    name,
                    "listed as copy function and spawn function",
                ));
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_default_is_valid() {
        let config = AliasConfig::default();
        assert!(config.validate().is_ok());
        assert!(config.is_allocator("malloc"));
        assert!(config.is_copy_function("memcpy"));
        assert_eq!(config.spawn_signature("pthread_create").unwrap().payload_arg, 3);
    }

    #[test]
    fn test_role_conflict_rejected() {
        let config = AliasConfig::bare().allocator("f").copy_function("f");
        assert!(matches!(
            config.validate(),
            Err(ConfigError::RoleConflict { .. })
        ));
    }

    #[test]
    fn test_spawn_routine_equals_payload_rejected() {
        let config = AliasConfig::bare().spawn_function(SpawnSignature::new("spawn", 1, 1));
        assert!(matches!(config.validate(), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_spawn_arg_out_of_range_rejected() {
        let config = AliasConfig::bare().spawn_function(SpawnSignature::new("spawn", 0, 99));
        assert!(matches!(config.validate(), Err(ConfigError::Range { .. })));
    }

    #[test]
    fn test_yaml_roundtrip() {
        let config = AliasConfig::default().allocator("xmalloc");
        let yaml = config.to_yaml().unwrap();
        assert!(yaml.contains("version: 1"));
        assert!(yaml.contains("xmalloc"));

        let back = AliasConfig::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, config);
    }

    #[test]
    fn test_yaml_partial_override_keeps_defaults() {
        let yaml = r#"
version: 1
analysis:
  allocators: [pool_alloc]
"#;
        let config = AliasConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.allocators, vec!["pool_alloc".to_string()]);
        assert!(config.spawn_signature("pthread_create").is_some());
    }

    #[test]
    fn test_yaml_missing_version() {
        let err = AliasConfig::from_yaml_str("analysis: {}\n").unwrap_err();
        assert!(matches!(err, ConfigError::MissingVersion));
    }

    #[test]
    fn test_yaml_unsupported_version() {
        let err = AliasConfig::from_yaml_str("version: 7\n").unwrap_err();
        assert!(matches!(err, ConfigError::UnsupportedVersion { found: 7, .. }));
    }

    #[test]
    fn test_yaml_file_loading() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "version: 1").unwrap();
        writeln!(file, "analysis:").unwrap();
        writeln!(file, "  record_vertex_names: false").unwrap();

        let config = AliasConfig::from_yaml(file.path()).unwrap();
        assert!(!config.record_vertex_names);
    }
}
