//! Loading the local content bank (courses + face modules) from TOML.
//!
//! See `BankConfig` for the expected schema. The bank plays the same role as
//! a hosted content store for self-contained deployments: anything defined
//! here is served before the built-in seeds.

use serde::Deserialize;
use tracing::{error, info};

use crate::domain::AccessLevel;

#[derive(Clone, Debug, Deserialize, Default)]
pub struct BankConfig {
  #[serde(default)]
  pub courses: Vec<CourseCfg>,
  #[serde(default)]
  pub modules: Vec<ModuleCfg>,
}

/// Course entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct CourseCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub description: String,
  pub access_level: AccessLevel,
  #[serde(default)] pub duration: String,
  #[serde(default)] pub rating: f32,
  #[serde(default)] pub preview_image_url: String,
  pub slug: String,
  /// RFC 3339; defaults to load time when absent.
  #[serde(default)] pub created_at: Option<String>,
  #[serde(default)] pub face_module: Option<String>,
}

/// Face-module entry accepted in TOML configuration.
#[derive(Clone, Debug, Deserialize)]
pub struct ModuleCfg {
  #[serde(default)] pub id: Option<String>,
  pub title: String,
  #[serde(default)] pub instruction: String,
  #[serde(default)] pub video_url: Option<String>,
  #[serde(default)] pub eyes: Vec<AssetCfg>,
  #[serde(default)] pub noses: Vec<AssetCfg>,
  #[serde(default)] pub mouths: Vec<AssetCfg>,
  #[serde(default)] pub targets: Vec<TargetCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AssetCfg {
  #[serde(default)] pub id: Option<String>,
  pub url: String,
  #[serde(default)] pub label: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct TargetCfg {
  pub face_url: String,
  #[serde(default)] pub lineup: Vec<LineupCfg>,
}

#[derive(Clone, Debug, Deserialize)]
pub struct LineupCfg {
  #[serde(default)] pub id: Option<String>,
  pub url: String,
  #[serde(default)] pub correct: bool,
}

/// Attempt to load `BankConfig` from CONTENT_CONFIG_PATH. On any parsing/IO
/// error, returns None; startup then continues on seeds alone.
pub fn load_bank_config_from_env() -> Option<BankConfig> {
  let path = std::env::var("CONTENT_CONFIG_PATH").ok()?;
  match std::fs::read_to_string(&path) {
    Ok(s) => match toml::from_str::<BankConfig>(&s) {
      Ok(cfg) => {
        info!(target: "gezicht_backend", %path, "Loaded content bank (TOML)");
        Some(cfg)
      }
      Err(e) => {
        error!(target: "gezicht_backend", %path, error = %e, "Failed to parse TOML content bank");
        None
      }
    },
    Err(e) => {
      error!(target: "gezicht_backend", %path, error = %e, "Failed to read TOML content bank file");
      None
    }
  }
}
