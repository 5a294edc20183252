use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::{fs::File, io::Write, num::NonZeroU64};

use crate::Error;

/// Global config object
pub static CONFIG: Lazy<Config> = Lazy::new(|| Config::load().expect("Failed to load config"));

#[derive(Default, Serialize, Deserialize)]
pub struct Channels {
    /// Where case embeds are mirrored for the moderation team, if set
    pub mod_logs: Option<NonZeroU64>,
}

#[derive(Default, Serialize, Deserialize)]
pub struct Roles {
    /// Roles allowed to manage cases regardless of their member permissions
    pub moderator: Vec<NonZeroU64>,
}

/// Indicator glyphs prepended to user-facing replies
#[derive(Serialize, Deserialize)]
pub struct Glyphs {
    pub success: String,
    pub error: String,
}

impl Default for Glyphs {
    fn default() -> Self {
        Self {
            success: String::from("✅"),
            error: String::from("❌"),
        }
    }
}

#[derive(Serialize, Deserialize)]
pub struct Config {
    pub database_url: String,
    pub token: String,
    pub prefix: String,
    pub channels: Channels,
    pub roles: Roles,
    pub glyphs: Glyphs,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_url: String::from("sqlite://warden.db?mode=rwc"),
            token: String::from(""),
            prefix: String::from("w!"),
            channels: Channels::default(),
            roles: Roles::default(),
            glyphs: Glyphs::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, Error> {
        // Delete config.yaml.sample if it exists
        if std::path::Path::new("config.yaml.sample").exists() {
            std::fs::remove_file("config.yaml.sample")?;
        }

        // Create config.yaml.sample
        let mut sample = File::create("config.yaml.sample")?;

        // Write default config to config.yaml.sample
        sample.write_all(serde_yaml::to_string(&Config::default())?.as_bytes())?;

        // Open config.yaml
        let file = File::open("config.yaml");

        match file {
            Ok(file) => {
                // Parse config.yaml
                let cfg: Config = serde_yaml::from_reader(file)?;

                // Return config
                Ok(cfg)
            }
            Err(e) => {
                // Print error
                println!("config.yaml could not be loaded: {}", e);

                // Exit
                std::process::exit(1);
            }
        }
    }
}
