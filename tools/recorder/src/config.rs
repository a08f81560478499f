use crate::errors::RecorderError;
use crate::logging::{DEFAULT_MAX_PAYLOAD_BYTES, MIN_PAYLOAD_BYTES};
use crate::runtime::FileSystem;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct RecorderConfig {
    pub mock: MockConfig,
    pub journal: JournalConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MockConfig {
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct JournalConfig {
    pub path: Option<PathBuf>,
    pub max_payload_bytes: usize,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            name: "mock".to_string(),
        }
    }
}

impl Default for JournalConfig {
    fn default() -> Self {
        Self {
            path: None,
            max_payload_bytes: DEFAULT_MAX_PAYLOAD_BYTES,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialRecorderConfig {
    mock: Option<PartialMockConfig>,
    journal: Option<PartialJournalConfig>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialMockConfig {
    name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct PartialJournalConfig {
    path: Option<PathBuf>,
    max_payload_bytes: Option<usize>,
}

pub fn load_config(path: &Path, fs: &dyn FileSystem) -> Result<RecorderConfig, RecorderError> {
    let file_contents = fs.read_to_string(path)?;
    parse_config(&file_contents)
}

pub fn parse_config(text: &str) -> Result<RecorderConfig, RecorderError> {
    let partial: PartialRecorderConfig =
        toml::from_str(text).map_err(|e| RecorderError::ConfigParse(e.to_string()))?;
    let mut cfg = RecorderConfig::default();
    merge_partial_config(&mut cfg, partial);
    validate_config(&cfg)?;
    Ok(cfg)
}

fn merge_partial_config(cfg: &mut RecorderConfig, partial: PartialRecorderConfig) {
    if let Some(mock) = partial.mock {
        if let Some(name) = mock.name {
            cfg.mock.name = name;
        }
    }

    if let Some(journal) = partial.journal {
        if let Some(path) = journal.path {
            cfg.journal.path = Some(path);
        }
        if let Some(max_payload_bytes) = journal.max_payload_bytes {
            cfg.journal.max_payload_bytes = max_payload_bytes;
        }
    }
}

fn validate_config(cfg: &RecorderConfig) -> Result<(), RecorderError> {
    let name = cfg.mock.name.trim();
    if name.is_empty() {
        return Err(RecorderError::InvalidConfig(
            "mock.name must not be empty".to_string(),
        ));
    }
    // Rendered paths use '.' and '()' as separators.
    if name.contains(['.', '(', ')']) {
        return Err(RecorderError::InvalidConfig(format!(
            "mock.name `{name}` must not contain '.', '(' or ')'"
        )));
    }

    if cfg.journal.max_payload_bytes < MIN_PAYLOAD_BYTES {
        return Err(RecorderError::InvalidConfig(format!(
            "journal.max_payload_bytes must be at least {MIN_PAYLOAD_BYTES}"
        )));
    }

    Ok(())
}
