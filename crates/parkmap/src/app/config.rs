use std::time::Duration;

use cap_std::fs_utf8::Dir;
use miette::Diagnostic;
use parkmap_marker_manager::readiness::DEFAULT_POLL_INTERVAL;
use parkmap_nrel::{DEFAULT_NREL_URL, MAX_LIMIT};
use parkmap_overpass::{CitySpec, DEFAULT_OVERPASS_URL};
use parkmap_ownership::DEFAULT_ORIGIN;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const CONFIG_FILE_NAME: &str = "parkmap.toml";
pub const CONFIG_ENV: &str = "PARKMAP_CONFIG";

#[derive(Error, Debug, Diagnostic)]
pub enum ConfigError {
    #[error("failed to read {file}")]
    Io {
        file: String,
        #[source]
        source: std::io::Error,
    },
    #[error("toml parsing failed")]
    #[diagnostic(help("compare with the output of `parkmap config`"))]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OwnershipParameters {
    /// scheme, host, port and optional base path of the ownership service,
    /// `get-ownership` is appended below the base path whether or not it ends with `/`
    pub origin: String,
    pub timeout_ms: u64,
}

impl Default for OwnershipParameters {
    fn default() -> Self {
        Self {
            origin: DEFAULT_ORIGIN.to_string(),
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessParameters {
    pub poll_interval_ms: u64,
    /// 0 means wait forever
    pub max_attempts: u64,
}

impl Default for ReadinessParameters {
    fn default() -> Self {
        Self {
            poll_interval_ms: DEFAULT_POLL_INTERVAL.as_millis() as u64,
            max_attempts: 50,
        }
    }
}

impl ReadinessParameters {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms.max(1))
    }
    pub fn max_attempts(&self) -> Option<u64> {
        (self.max_attempts > 0).then_some(self.max_attempts)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OverpassParameters {
    pub url: String,
    pub timeout_ms: u64,
    /// pause between two cities, the public instance rate limits
    pub pause_ms: u64,
}

impl Default for OverpassParameters {
    fn default() -> Self {
        Self {
            url: DEFAULT_OVERPASS_URL.to_string(),
            timeout_ms: 180_000,
            pause_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NrelParameters {
    pub url: String,
    /// `NREL_API_KEY` wins over this one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    pub limit: u32,
    pub timeout_ms: u64,
}

impl Default for NrelParameters {
    fn default() -> Self {
        Self {
            url: DEFAULT_NREL_URL.to_string(),
            api_key: None,
            limit: MAX_LIMIT,
            timeout_ms: 30_000,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParkmapConfiguration {
    pub ownership: OwnershipParameters,
    pub readiness: ReadinessParameters,
    pub overpass: OverpassParameters,
    pub nrel: NrelParameters,
    pub cities: Vec<CitySpec>,
}

impl Default for ParkmapConfiguration {
    fn default() -> Self {
        Self {
            ownership: Default::default(),
            readiness: Default::default(),
            overpass: Default::default(),
            nrel: Default::default(),
            cities: CitySpec::defaults(),
        }
    }
}

impl ParkmapConfiguration {
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads `file_name` inside `dir`, a missing file is not an error and gives the defaults.
    pub fn load(dir: &Dir, file_name: &str) -> Result<Self, ConfigError> {
        match dir.read_to_string(file_name) {
            Ok(content) => Self::parse(&content),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(file_name, "no configuration file, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Io {
                file: file_name.to_string(),
                source,
            }),
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use cap_std::ambient_authority;

    #[test]
    fn test_empty_file_gives_defaults() {
        let config = ParkmapConfiguration::parse("").unwrap();
        assert_eq!(config, ParkmapConfiguration::default());
        assert_eq!(config.cities.len(), 3);
        assert_eq!(config.readiness.poll_interval(), Duration::from_millis(100));
    }

    #[test]
    fn test_partial_sections() {
        let config = ParkmapConfiguration::parse(
            r#"
            [ownership]
            origin = "http://10.0.0.2:8080"

            [readiness]
            max_attempts = 0

            [[cities]]
            name = "Tucson"
            state = "Arizona"
            bbox = [32.1, -111.1, 32.3, -110.8]
            "#,
        )
        .unwrap();
        assert_eq!(config.ownership.origin, "http://10.0.0.2:8080");
        assert_eq!(config.ownership.timeout_ms, 10_000);
        assert_eq!(config.readiness.max_attempts(), None);
        assert_eq!(config.cities.len(), 1);
        assert_eq!(config.cities[0].bbox.north, 32.3);
        assert_eq!(config.cities[0].division_factor(), 80);
    }

    #[test]
    fn test_round_trip_of_defaults() {
        let serialized = toml::to_string(&ParkmapConfiguration::default()).unwrap();
        assert_eq!(
            ParkmapConfiguration::parse(&serialized).unwrap(),
            ParkmapConfiguration::default()
        );
    }

    fn scratch_dir(name: &str) -> Dir {
        let path = std::env::temp_dir().join(format!("parkmap-config-{name}-{}", std::process::id()));
        let path = cap_std::fs_utf8::camino::Utf8PathBuf::from_path_buf(path).unwrap();
        Dir::create_ambient_dir_all(&path, ambient_authority()).unwrap();
        Dir::open_ambient_dir(&path, ambient_authority()).unwrap()
    }

    #[test]
    fn test_missing_file_is_default() {
        let dir = scratch_dir("missing");
        let config = ParkmapConfiguration::load(&dir, "absent.toml").unwrap();
        assert_eq!(config, ParkmapConfiguration::default());
    }

    #[test]
    fn test_load_reads_inside_the_dir() {
        let dir = scratch_dir("present");
        dir.write(
            CONFIG_FILE_NAME,
            "[nrel]\napi_key = \"abc\"\nlimit = 50\n\n[overpass]\npause_ms = 0\n",
        )
        .unwrap();
        let config = ParkmapConfiguration::load(&dir, CONFIG_FILE_NAME).unwrap();
        assert_eq!(config.nrel.api_key.as_deref(), Some("abc"));
        assert_eq!(config.nrel.limit, 50);
        assert_eq!(config.nrel.url, DEFAULT_NREL_URL);
        assert_eq!(config.overpass.pause_ms, 0);
        dir.remove_file(CONFIG_FILE_NAME).unwrap();
    }

    #[test]
    fn test_a_directory_is_not_a_config_file() {
        let dir = scratch_dir("is-a-dir");
        dir.create_dir_all("nested.toml").unwrap();
        assert!(matches!(
            ParkmapConfiguration::load(&dir, "nested.toml"),
            Err(ConfigError::Io { .. })
        ));
    }

    #[test]
    fn test_bad_toml() {
        assert!(matches!(
            ParkmapConfiguration::parse("readiness = 3"),
            Err(ConfigError::Toml(_))
        ));
    }
}
