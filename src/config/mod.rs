use lazy_static::lazy_static;
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_yml;
use chrono_tz::Tz;
use std::error::Error;
use std::fs;
use std::sync::RwLock;

fn timezone_default() -> String { return "Europe/Amsterdam".to_string() }

#[derive(Deserialize, Serialize, Clone)]
pub struct DsmrConfig {
    /// IANA identifier of the zone the meter renders its civil timestamps
    /// in. Static deployment parameter, never a runtime input.
    #[serde(default="timezone_default")]
    pub timezone: String,
}

impl Default for DsmrConfig {
    fn default() -> Self {
        DsmrConfig { timezone: timezone_default() }
    }
}

impl DsmrConfig {
    pub fn home_timezone(&self) -> Result<Tz, String> {
        self.timezone.parse::<Tz>()
            .map_err(|_| format!("unknown timezone identifier '{}'", self.timezone))
    }
}

#[derive(Deserialize, Serialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub dsmr: DsmrConfig,
}

pub struct ConfigHolder {
    pub config: Config,
}

impl ConfigHolder {
    pub fn load() -> Self {
        /* Check for the two paths of the config file */
        for path in ["config/p1telegram.yaml", "p1telegram.yaml"] {
            match Self::from_file(path) {
                Ok(config) => {
                    info!("Loaded configuration from {}", path);
                    return ConfigHolder { config };
                }
                Err(_) => continue,
            }
        }

        warn!("No config file found, using built-in defaults");
        ConfigHolder { config: Config::default() }
    }

    pub fn from_file(path: &str) -> Result<Config, Box<dyn Error>> {
        let contents = fs::read_to_string(path)?;
        let config: Config = serde_yml::from_str(&contents)?;
        Ok(config)
    }
}

lazy_static! {
    pub static ref CONFIG: RwLock<ConfigHolder> = RwLock::new(ConfigHolder::load());
}
