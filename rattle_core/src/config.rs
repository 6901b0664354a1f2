use serde::Deserialize;
use std::path::PathBuf;

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct FuzzerSettings {
    #[serde(default = "default_iterations")]
    pub max_iterations: u64,
    #[serde(default)]
    pub seed: Option<u64>,
}

pub fn default_iterations() -> u64 {
    1000
}

impl Default for FuzzerSettings {
    fn default() -> Self {
        Self {
            max_iterations: default_iterations(),
            seed: None,
        }
    }
}

#[derive(Deserialize, Debug, Clone, Default)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct ExecutorSettings {
    #[serde(default)]
    pub target: Option<PathBuf>,
    #[serde(default)]
    pub timeout_ms: Option<u64>,
    #[serde(default)]
    pub preserve_failures: bool,
    #[serde(default)]
    pub artifact_dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
pub enum GeneratorSettings {
    UniformRandom {
        #[serde(default = "default_min_length")]
        min: usize,
        #[serde(default = "default_max_length")]
        max: usize,
    },
    FileSample {
        path: PathBuf,
    },
    Mutate {
        base: String,
    },
}

pub fn default_min_length() -> usize {
    1
}
pub fn default_max_length() -> usize {
    128
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self::UniformRandom {
            min: default_min_length(),
            max: default_max_length(),
        }
    }
}

#[derive(Deserialize, Debug, Clone)]
#[serde(rename_all = "kebab-case")]
#[serde(deny_unknown_fields)]
pub struct HarnessConfig {
    #[serde(default)]
    pub fuzzer: Option<FuzzerSettings>,
    #[serde(default)]
    pub executor: ExecutorSettings,
    #[serde(default)]
    pub generator: GeneratorSettings,
}

impl HarnessConfig {
    pub fn load_from_file(path: &PathBuf) -> Result<Self, anyhow::Error> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config file at {:?}: {}", path, e))?;

        let config: HarnessConfig = toml::from_str(&content).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from config file {:?}: {}", path, e)
        })?;

        Ok(config)
    }
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            fuzzer: Some(FuzzerSettings::default()),
            executor: ExecutorSettings::default(),
            generator: GeneratorSettings::default(),
        }
    }
}
