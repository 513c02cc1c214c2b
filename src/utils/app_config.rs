use std::collections::HashMap;
use std::path::Path;
use std::sync::RwLock;
use std::sync::{RwLockReadGuard, RwLockWriteGuard};

use config::Environment;
use lazy_static::lazy_static;

use super::error::Result;

static DEFAULT_CONFIG: &str = include_str!(concat!(env!("CARGO_MANIFEST_DIR"), "/resources/default_config.toml"));

/// The main structure holding application config
pub struct AppConfig(config::Config);

impl AppConfig {
    fn new() -> Self {
        // Start with empty
        Self(config::Config::new())
    }

    pub fn setup(&mut self) -> Result<&mut Self> {
        // Merge with default config
        self.0
            .merge(config::File::from_str(DEFAULT_CONFIG, config::FileFormat::Toml))?;

        // Merge settings with env variables
        self.0.merge(Environment::with_prefix("ABRSIM"))?;

        Ok(self)
    }

    /// Load config from a file
    pub fn use_file(&mut self, path: &Path) -> Result<&mut Self> {
        self.0.merge(config::File::from(path))?;
        Ok(self)
    }

    /// Apply a preset section on top of the current values.
    /// Preset keys are dotted paths, e.g. `"video.total_segments" = 8`.
    pub fn use_preset(&mut self, name: &str) -> Result<&mut Self> {
        let preset: HashMap<String, config::Value> = self.get(format!("presets.{}", name))?;
        for (key, value) in preset {
            // a preset overriding `presets` would recurse endlessly
            if key != "presets" {
                self.0.set(&key, value)?;
            }
        }
        Ok(self)
    }

    /// Get a single value and deserialize to the given type
    pub fn get<T, K>(&self, key: K) -> Result<T>
    where
        // use DeserializeOwned, because we are reading CONFIG using RWLock
        // and the lock is released before returning. So T should not borrow
        // anything from CONFIG.
        T: serde::de::DeserializeOwned,
        K: AsRef<str>,
    {
        Ok(self.0.get(key.as_ref())?)
    }

    /// Deserialize the whole config to the given type
    pub fn fetch<T>(&self) -> Result<T>
    where
        T: serde::de::DeserializeOwned,
    {
        let t = self.0.clone().try_into()?;
        Ok(t)
    }
}

lazy_static! {
    /// global AppConfig instance
    static ref CONFIG: RwLock<AppConfig> = RwLock::new(AppConfig::new());
}

pub fn setup() -> Result<()> {
    config_mut().setup()?;
    Ok(())
}

/// global AppConfig instance
pub fn config() -> RwLockReadGuard<'static, AppConfig> {
    CONFIG.read().unwrap()
}

/// mutable global AppConfig instance
pub fn config_mut() -> RwLockWriteGuard<'static, AppConfig> {
    CONFIG.write().unwrap()
}

pub mod prelude {
    pub use super::{config, config_mut};
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    fn test_config() -> AppConfig {
        let mut config = AppConfig::new();
        config.setup().unwrap();
        config
            .use_file(Path::new(concat!(
                env!("CARGO_MANIFEST_DIR"),
                "/resources/test_config.toml"
            )))
            .unwrap();

        config
    }

    #[test]
    fn fetch_config() {
        let config = test_config();

        #[derive(Deserialize)]
        struct Traces {
            dir: String,
        }
        #[derive(Deserialize)]
        struct Fragment {
            traces: Traces,
        }

        let frag: Fragment = config.fetch().unwrap();
        assert_eq!(frag.traces.dir, "custom traces dir");
    }

    #[test]
    fn verify_get() {
        let config = test_config();

        let dir: String = config.get("traces.dir").unwrap();
        let segments: usize = config.get("video.total_segments").unwrap();

        assert_eq!(dir, "custom traces dir");
        // from the built-in defaults
        assert_eq!(segments, 48);
    }

    #[test]
    fn preset() {
        let mut config = test_config();

        let segments: usize = config.get("video.total_segments").unwrap();
        assert_eq!(segments, 48);

        config.use_preset("fastrun").unwrap();
        // value from preset
        let segments: usize = config.get("video.total_segments").unwrap();
        assert_eq!(segments, 8);

        let noise_low: f64 = config.get("player.noise_low").unwrap();
        assert!((noise_low - 1.0).abs() < f64::EPSILON);
    }
}
