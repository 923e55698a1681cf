use std::path::{Path, PathBuf};

use serde::Deserialize;
use ttmatrix_core::MatrixConfig;
use ttmatrix_core::model::Crs;

/// Contents of the TOML run file
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunConfig {
    pub input: InputConfig,
    pub output: OutputConfig,
    #[serde(default)]
    pub model: MatrixConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct InputConfig {
    pub points: PathBuf,
    pub network: PathBuf,
    /// Leave unset, or point at a missing file, to generate stations
    pub stations: Option<PathBuf>,
    #[serde(default = "default_id_field")]
    pub id_field: String,
    pub points_crs: Option<String>,
    pub network_crs: Option<String>,
    pub stations_crs: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputConfig {
    pub matrix: PathBuf,
    pub points: Option<PathBuf>,
    pub edges: Option<PathBuf>,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl RunConfig {
    pub fn load(path: &Path) -> Result<Self, String> {
        let text = std::fs::read_to_string(path)
            .map_err(|e| format!("failure reading {}: {e}", path.display()))?;
        Self::parse(&text).map_err(|e| format!("failure decoding {}: {e}", path.display()))
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }
}

impl InputConfig {
    pub fn crs_overrides(&self) -> Result<[Option<Crs>; 3], ttmatrix_core::Error> {
        let parse = |name: &Option<String>| -> Result<Option<Crs>, ttmatrix_core::Error> {
            name.as_deref().map(str::parse).transpose()
        };
        Ok([
            parse(&self.points_crs)?,
            parse(&self.network_crs)?,
            parse(&self.stations_crs)?,
        ])
    }
}
