use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{MaskgateError, Result};

/// Top-level proxy configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProxyConfig {
    /// Which spans and patterns get masked.
    #[serde(default)]
    pub masking: MaskingConfig,

    /// Entity recognizer setup.
    #[serde(default)]
    pub recognizer: RecognizerConfig,

    /// Language model backend.
    #[serde(default)]
    pub llm: LlmConfig,

    /// Timeout for one language model call in seconds. Default: 60.
    #[serde(default = "default_llm_timeout")]
    pub llm_timeout_secs: u64,

    /// Unix socket for `serve`/`ask`. Default: `$XDG_RUNTIME_DIR/maskgate.sock`.
    #[serde(default)]
    pub socket_path: Option<PathBuf>,
}

fn default_llm_timeout() -> u64 {
    60
}

impl Default for ProxyConfig {
    fn default() -> Self {
        Self {
            masking: MaskingConfig::default(),
            recognizer: RecognizerConfig::default(),
            llm: LlmConfig::default(),
            llm_timeout_secs: 60,
            socket_path: None,
        }
    }
}

impl ProxyConfig {
    /// Load config from a YAML file. Returns default if file doesn't exist.
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path)?;
        serde_yaml::from_str(&contents).map_err(|e| MaskgateError::ConfigParse {
            path: path.to_path_buf(),
            reason: e.to_string(),
        })
    }

    /// Load config from the project root. Checks `.maskgate/config.yml`,
    /// then the global `~/.config/maskgate/config.yml`.
    pub fn load_project(project_root: &Path) -> Result<Self> {
        let path = project_root.join(".maskgate").join("config.yml");
        if path.exists() {
            return Self::load_from(&path);
        }
        Self::load_from(&super::dirs_global().join("config.yml"))
    }

    pub fn socket_path(&self) -> PathBuf {
        self.socket_path
            .clone()
            .unwrap_or_else(|| super::runtime_dir().join("maskgate.sock"))
    }
}

/// Masking configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MaskingConfig {
    /// Recognizer labels whose spans are masked.
    #[serde(default = "default_accepted_labels")]
    pub accepted_labels: Vec<String>,

    /// Enabled pattern detectors. They always run in their fixed order.
    #[serde(default = "default_detectors")]
    pub detectors: Vec<String>,

    /// Refuse input that already contains `#TOKEN_<n>#`. Default: true.
    #[serde(default = "default_true")]
    pub reject_placeholder_input: bool,
}

fn default_accepted_labels() -> Vec<String> {
    vec![
        "PERSON".into(),
        "PER".into(),
        "ORG".into(),
        "LOC".into(),
        "GPE".into(),
    ]
}

fn default_detectors() -> Vec<String> {
    vec![
        "passport".into(),
        "credit_card".into(),
        "iban".into(),
        "amount".into(),
        "tax_id".into(),
    ]
}

fn default_true() -> bool {
    true
}

impl Default for MaskingConfig {
    fn default() -> Self {
        Self {
            accepted_labels: default_accepted_labels(),
            detectors: default_detectors(),
            reject_placeholder_input: true,
        }
    }
}

/// Dictionary recognizer entries, inline and/or from a YAML file of the
/// same `LABEL: [phrase, ...]` shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecognizerConfig {
    #[serde(default)]
    pub gazetteer: BTreeMap<String, Vec<String>>,

    #[serde(default)]
    pub gazetteer_file: Option<PathBuf>,
}

impl RecognizerConfig {
    /// Inline entries merged with the file's. Relative file paths resolve
    /// against `base_dir`.
    pub fn entries(&self, base_dir: &Path) -> Result<BTreeMap<String, Vec<String>>> {
        let mut entries = self.gazetteer.clone();
        if let Some(file) = &self.gazetteer_file {
            let path = if file.is_absolute() {
                file.clone()
            } else {
                base_dir.join(file)
            };
            let contents = std::fs::read_to_string(&path)?;
            let extra: BTreeMap<String, Vec<String>> =
                serde_yaml::from_str(&contents).map_err(|e| MaskgateError::ConfigParse {
                    path: path.clone(),
                    reason: e.to_string(),
                })?;
            for (label, names) in extra {
                entries.entry(label).or_default().extend(names);
            }
        }
        Ok(entries)
    }
}

/// Language model backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "backend")]
pub enum LlmConfig {
    /// Simulated model that echoes the masked text back.
    #[serde(rename = "echo")]
    Echo,
    /// OpenAI-compatible chat completions endpoint.
    #[serde(rename = "api")]
    Api {
        api_base_url: Option<String>,
        model: Option<String>,
        max_tokens: Option<u32>,
        /// Environment variable holding the API key. Default: `OPENAI_API_KEY`.
        api_key_env: Option<String>,
    },
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self::Echo
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_gives_defaults() {
        let tmp = TempDir::new().unwrap();
        let config = ProxyConfig::load_from(&tmp.path().join("nope.yml")).unwrap();
        assert_eq!(config.llm_timeout_secs, 60);
        assert_eq!(config.masking.detectors.len(), 5);
        assert!(config.masking.reject_placeholder_input);
        assert!(matches!(config.llm, LlmConfig::Echo));
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
masking:
  detectors: [credit_card, tax_id]
  reject_placeholder_input: false
recognizer:
  gazetteer:
    PER: ["Алия Нурланова"]
llm:
  backend: api
  model: gpt-4o-mini
  max_tokens: 512
llm_timeout_secs: 15
socket_path: /tmp/custom.sock
"#;
        let config: ProxyConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(config.masking.detectors, vec!["credit_card", "tax_id"]);
        assert!(!config.masking.reject_placeholder_input);
        assert_eq!(config.masking.accepted_labels.len(), 5);
        assert_eq!(config.recognizer.gazetteer["PER"], vec!["Алия Нурланова"]);
        assert_eq!(config.llm_timeout_secs, 15);
        assert_eq!(config.socket_path(), PathBuf::from("/tmp/custom.sock"));
        match config.llm {
            LlmConfig::Api {
                model, max_tokens, ..
            } => {
                assert_eq!(model.as_deref(), Some("gpt-4o-mini"));
                assert_eq!(max_tokens, Some(512));
            }
            other => panic!("expected api backend, got {other:?}"),
        }
    }

    #[test]
    fn test_invalid_yaml_reports_path() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.yml");
        std::fs::write(&path, "masking: [unclosed").unwrap();
        let err = ProxyConfig::load_from(&path).unwrap_err();
        assert!(matches!(err, MaskgateError::ConfigParse { .. }));
    }

    #[test]
    fn test_gazetteer_file_merges_with_inline() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(
            tmp.path().join("names.yml"),
            "PER: [\"Ерлан\"]\nORG: [\"Halyk Bank\"]\n",
        )
        .unwrap();
        let mut config = RecognizerConfig::default();
        config.gazetteer.insert("PER".into(), vec!["Алия".into()]);
        config.gazetteer_file = Some(PathBuf::from("names.yml"));

        let entries = config.entries(tmp.path()).unwrap();
        assert_eq!(entries["PER"], vec!["Алия", "Ерлан"]);
        assert_eq!(entries["ORG"], vec!["Halyk Bank"]);
    }
}
