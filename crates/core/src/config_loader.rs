use anyhow::Result;
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};

use crate::config::EngineConfig;

/// Layered configuration loading: compiled-in defaults, then
/// `config/Config.toml`, then `SEVENDTE_`-prefixed environment variables,
/// with `config/Config.json` filling any remaining gaps. Missing files are
/// not an error.
pub struct ConfigLoader;

impl ConfigLoader {
    /// # Errors
    /// Returns an error when a source fails to parse or a value cannot be
    /// deserialized into [`EngineConfig`].
    pub fn load() -> Result<EngineConfig> {
        let config = Figment::from(Serialized::defaults(EngineConfig::default()))
            .merge(Toml::file("config/Config.toml"))
            .merge(Env::prefixed("SEVENDTE_"))
            .join(Json::file("config/Config.json"))
            .extract()?;
        Ok(config)
    }
}
