use crate::config::Settings;
use crate::universe::Universe;
use anyhow::{Context, Result};
use figment::{
    providers::{Env, Format, Json, Serialized, Toml},
    Figment,
};
use std::path::Path;

/// Environment prefix for settings overrides, e.g. `STAT_ARB_Z_WINDOW=60`.
pub const ENV_PREFIX: &str = "STAT_ARB_";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Loads settings by merging defaults, `config/Config.toml`, environment
    /// variables, and `config/Config.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or the
    /// resulting settings fail validation.
    pub fn load() -> Result<Settings> {
        Self::load_from("config/Config.toml")
    }

    /// Loads settings from a specific TOML file, layered over defaults and
    /// under environment overrides.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or validation fails.
    pub fn load_from(path: impl AsRef<Path>) -> Result<Settings> {
        let path = path.as_ref();
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX))
            .join(Json::file("config/Config.json"))
            .extract()
            .with_context(|| format!("Failed to load settings from {}", path.display()))?;

        settings.validate()?;
        tracing::debug!(?settings, "Loaded settings");
        Ok(settings)
    }

    /// Loads settings with a profile overlay (`config/Config.<profile>.toml`).
    ///
    /// # Errors
    ///
    /// Returns an error if configuration files cannot be parsed or validation fails.
    pub fn load_with_profile(profile: &str) -> Result<Settings> {
        let settings: Settings = Figment::from(Serialized::defaults(Settings::default()))
            .merge(Toml::file("config/Config.toml"))
            .merge(Toml::file(format!("config/Config.{profile}.toml")))
            .merge(Env::prefixed(ENV_PREFIX))
            .join(Json::file("config/Config.json"))
            .extract()
            .with_context(|| format!("Failed to load settings for profile '{profile}'"))?;

        settings.validate()?;
        Ok(settings)
    }

    /// Loads the basket universe from a TOML file of `[[baskets]]` tables.
    ///
    /// Falls back to the built-in universe when the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be parsed.
    pub fn load_universe(path: impl AsRef<Path>) -> Result<Universe> {
        let path = path.as_ref();
        if !path.exists() {
            tracing::info!(
                path = %path.display(),
                "Universe file not found, using built-in baskets"
            );
            return Ok(Universe::default());
        }

        let universe: Universe = Figment::new()
            .merge(Toml::file(path))
            .extract()
            .with_context(|| format!("Failed to load universe from {}", path.display()))?;

        tracing::debug!(baskets = universe.len(), "Loaded universe");
        Ok(universe)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn load_from_missing_file_uses_defaults() {
        Jail::expect_with(|_jail| {
            let settings = ConfigLoader::load_from("Config.toml").expect("defaults");
            assert_eq!(settings, Settings::default());
            Ok(())
        });
    }

    #[test]
    fn load_from_merges_toml_and_env() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Config.toml",
                r#"
                z_window = 60
                boll_k = 2.5
                "#,
            )?;
            jail.set_env("STAT_ARB_ANALYTICS_WINDOW", "120");

            let settings = ConfigLoader::load_from("Config.toml").expect("load");
            assert_eq!(settings.z_window, 60);
            assert!((settings.boll_k - 2.5).abs() < 1e-12);
            assert_eq!(settings.analytics_window, 120);
            assert_eq!(settings.timeframe, "1h");
            Ok(())
        });
    }

    #[test]
    fn load_from_rejects_invalid_settings() {
        Jail::expect_with(|jail| {
            jail.create_file("bad.toml", "z_window = 1")?;
            assert!(ConfigLoader::load_from("bad.toml").is_err());
            Ok(())
        });
    }

    #[test]
    fn load_universe_reads_baskets() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Universe.toml",
                r#"
                [[baskets]]
                name = "fan_tokens"
                members = ["CHZUSD", "ASRUSD", "BTCUSD"]

                [[baskets]]
                name = "payments"
                members = ["XRPUSD", "XLMUSD"]
                "#,
            )?;

            let universe = ConfigLoader::load_universe("Universe.toml").expect("universe");
            assert_eq!(universe.names(), vec!["fan_tokens", "payments"]);
            assert_eq!(universe.get("payments").unwrap().members.len(), 2);
            Ok(())
        });
    }

    #[test]
    fn load_universe_missing_file_falls_back() {
        Jail::expect_with(|_jail| {
            let universe = ConfigLoader::load_universe("nope.toml").expect("fallback");
            assert_eq!(universe, Universe::default());
            Ok(())
        });
    }

    #[test]
    fn shipped_config_files_match_defaults() {
        let root = concat!(env!("CARGO_MANIFEST_DIR"), "/../../config");
        Jail::expect_with(|_jail| {
            let settings = ConfigLoader::load_from(format!("{root}/Config.toml")).expect("settings");
            assert_eq!(settings, Settings::default());

            let universe = ConfigLoader::load_universe(format!("{root}/Universe.toml")).expect("universe");
            assert_eq!(universe, Universe::default());
            Ok(())
        });
    }
}
