use std::env;
use std::path::PathBuf;

use once_cell::sync::OnceCell;

use crate::standings::StandingsOptions;
use crate::store;

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: Option<PathBuf>,
    pub include_in_progress: bool,
    pub standings: StandingsOptions,
    pub parallelism: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: store::default_db_path(),
            include_in_progress: false,
            standings: StandingsOptions::default(),
            parallelism: 4,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        let defaults = AppConfig::default();
        let db_path = env::var("LEAGUE_DB")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .or(defaults.db_path);
        let standings = StandingsOptions {
            points_for_win: env_parse("STANDINGS_POINTS_WIN")
                .unwrap_or(defaults.standings.points_for_win)
                .clamp(0, 10),
            points_for_draw: env_parse("STANDINGS_POINTS_DRAW")
                .unwrap_or(defaults.standings.points_for_draw)
                .clamp(0, 10),
            form_len: env_parse("STANDINGS_FORM_LEN")
                .unwrap_or(defaults.standings.form_len)
                .clamp(1, 20),
            suspended_counts_as_live: env_flag("STANDINGS_SUSPENDED_AS_LIVE")
                .unwrap_or(defaults.standings.suspended_counts_as_live),
            widen_when_no_finished: env_flag("STANDINGS_WIDEN_EMPTY")
                .unwrap_or(defaults.standings.widen_when_no_finished),
        };
        Self {
            db_path,
            include_in_progress: env_flag("STANDINGS_INCLUDE_LIVE")
                .unwrap_or(defaults.include_in_progress),
            standings,
            parallelism: env_parse("STANDINGS_PARALLELISM")
                .unwrap_or(defaults.parallelism)
                .clamp(1, 32),
        }
    }
}

/// Load `.env.local` then `.env`; variables already set win.
pub fn load_dotenv() {
    let _ = dotenvy::from_filename(".env.local");
    let _ = dotenvy::from_filename(".env");
}

/// Process-wide configuration, read from the environment on first use.
pub fn app_config() -> &'static AppConfig {
    CONFIG.get_or_init(AppConfig::from_env)
}

fn env_parse<T: std::str::FromStr>(key: &str) -> Option<T> {
    env::var(key).ok().and_then(|val| val.trim().parse::<T>().ok())
}

fn env_flag(key: &str) -> Option<bool> {
    parse_flag(&env::var(key).ok()?)
}

pub fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "y" | "on" => Some(true),
        "0" | "false" | "no" | "n" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::parse_flag;

    #[test]
    fn flags_parse_common_spellings() {
        assert_eq!(parse_flag("YES"), Some(true));
        assert_eq!(parse_flag(" on "), Some(true));
        assert_eq!(parse_flag("0"), Some(false));
        assert_eq!(parse_flag("maybe"), None);
    }
}
