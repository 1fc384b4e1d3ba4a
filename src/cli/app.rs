use std::path::PathBuf;

use clap::Parser;

use crate::config::AppConfig;

pub const DEFAULT_LOG_FILE: &str = "ingresso-finder.log";

#[derive(Parser, Debug)]
#[command(name = "ingresso-finder")]
#[command(about = "Browse Ingresso movie sessions, theaters and seat maps from the terminal")]
#[command(version)]
pub struct Cli {
    /// Open this city directly instead of the most recent one
    #[arg(long, value_name = "NAME")]
    pub city: Option<String>,

    /// Log why each location lookup failed
    #[arg(long)]
    pub location_debug: bool,

    /// Log file, truncated on every run
    #[arg(long, value_name = "PATH", default_value = DEFAULT_LOG_FILE)]
    pub log_file: PathBuf,
}

impl Cli {
    /// Flags win over the config file and the environment
    pub fn apply(&self, config: &mut AppConfig) {
        if let Some(city) = self.city.as_deref().map(str::trim).filter(|city| !city.is_empty()) {
            config.initial_city = Some(city.to_string());
        }
        if self.location_debug {
            config.location_debug = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["ingresso-finder"]).unwrap();
        assert_eq!(cli.city, None);
        assert!(!cli.location_debug);
        assert_eq!(cli.log_file, PathBuf::from(DEFAULT_LOG_FILE));
    }

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::try_parse_from(["ingresso-finder", "--city", " Recife ", "--location-debug"]).unwrap();
        let mut config = AppConfig {
            initial_city: Some("Natal".into()),
            ..AppConfig::default()
        };
        cli.apply(&mut config);

        assert_eq!(config.initial_city.as_deref(), Some("Recife"));
        assert!(config.location_debug);
    }

    #[test]
    fn test_blank_city_flag_keeps_config() {
        let cli = Cli::try_parse_from(["ingresso-finder", "--city", "  "]).unwrap();
        let mut config = AppConfig {
            initial_city: Some("Natal".into()),
            ..AppConfig::default()
        };
        cli.apply(&mut config);
        assert_eq!(config.initial_city.as_deref(), Some("Natal"));
    }
}
