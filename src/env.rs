use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::models::MatchInfo;

pub const DEFAULT_DATABASE_URL: &str = "sqlite://matchday.db?mode=rwc";
pub const DEFAULT_SESSION_HOURS: i64 = 12;
pub const MAX_SESSION_HOURS: i64 = 24 * 365;

pub fn load_environment() -> Result<()> {
    let is_production =
        dotenvy::var("ROCKET_PROFILE").unwrap_or("development".to_string()) == "production";

    let env_files = if is_production {
        vec!["config/common.env", "config/prod.env", ".secrets.env"]
    } else {
        vec!["config/common.env", "config/dev.env", ".secrets.env"]
    };

    for env_file in env_files {
        load_env_file(env_file)?;
    }

    Ok(())
}

fn load_env_file(path: &str) -> Result<()> {
    if !Path::new(path).exists() {
        warn!("Warning: Environment file {} not found, skipping", path);
        return Ok(());
    }

    dotenvy::from_filename_override(path)
        .with_context(|| format!("Failed to load environment file {}", path))?;
    info!("Loaded environment from: {}", path);
    Ok(())
}

#[derive(Debug, Clone, PartialEq)]
pub struct AdminCredentials {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    pub database_url: String,
    pub admin: Option<AdminCredentials>,
    pub session_hours: i64,
    pub default_match: MatchInfo,
}

fn non_empty(name: &str) -> Option<String> {
    dotenvy::var(name).ok().filter(|value| !value.trim().is_empty())
}

impl Settings {
    pub fn from_env() -> Result<Self> {
        let session_hours = match non_empty("MATCHDAY_SESSION_HOURS") {
            Some(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .filter(|hours| (1..=MAX_SESSION_HOURS).contains(hours))
                .with_context(|| {
                    format!(
                        "MATCHDAY_SESSION_HOURS must be between 1 and {}, got {:?}",
                        MAX_SESSION_HOURS, raw
                    )
                })?,
            None => DEFAULT_SESSION_HOURS,
        };

        let admin = match (
            non_empty("MATCHDAY_ADMIN_EMAIL"),
            non_empty("MATCHDAY_ADMIN_PASSWORD"),
        ) {
            (Some(email), Some(password)) => Some(AdminCredentials { email, password }),
            (Some(_), None) | (None, Some(_)) => {
                warn!("Only one of MATCHDAY_ADMIN_EMAIL / MATCHDAY_ADMIN_PASSWORD is set, no admin will be seeded");
                None
            }
            (None, None) => None,
        };

        let fallback = MatchInfo::default();
        let default_match = MatchInfo {
            name: non_empty("MATCHDAY_MATCH_NAME").unwrap_or(fallback.name),
            venue: non_empty("MATCHDAY_MATCH_VENUE").unwrap_or(fallback.venue),
            kickoff: non_empty("MATCHDAY_MATCH_KICKOFF").unwrap_or(fallback.kickoff),
        };

        Ok(Self {
            database_url: non_empty("DATABASE_URL")
                .unwrap_or_else(|| DEFAULT_DATABASE_URL.to_string()),
            admin,
            session_hours,
            default_match,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const VARS: [&str; 7] = [
        "DATABASE_URL",
        "MATCHDAY_ADMIN_EMAIL",
        "MATCHDAY_ADMIN_PASSWORD",
        "MATCHDAY_SESSION_HOURS",
        "MATCHDAY_MATCH_NAME",
        "MATCHDAY_MATCH_VENUE",
        "MATCHDAY_MATCH_KICKOFF",
    ];

    fn cleared() -> Vec<(&'static str, Option<&'static str>)> {
        VARS.iter().map(|name| (*name, None)).collect()
    }

    #[test]
    #[serial]
    fn defaults_apply_when_unset() {
        temp_env::with_vars(cleared(), || {
            let settings = Settings::from_env().unwrap();

            assert_eq!(settings.database_url, DEFAULT_DATABASE_URL);
            assert_eq!(settings.session_hours, DEFAULT_SESSION_HOURS);
            assert_eq!(settings.admin, None);
            assert_eq!(settings.default_match, MatchInfo::default());
        });
    }

    #[test]
    #[serial]
    fn reads_admin_and_match_overrides() {
        let mut vars = cleared();
        vars.extend([
            ("MATCHDAY_ADMIN_EMAIL", Some("boss@example.com")),
            ("MATCHDAY_ADMIN_PASSWORD", Some("hunter2")),
            ("MATCHDAY_SESSION_HOURS", Some("3")),
            ("MATCHDAY_MATCH_VENUE", Some("Riverside Park")),
        ]);

        temp_env::with_vars(vars, || {
            let settings = Settings::from_env().unwrap();

            assert_eq!(
                settings.admin,
                Some(AdminCredentials {
                    email: "boss@example.com".into(),
                    password: "hunter2".into(),
                })
            );
            assert_eq!(settings.session_hours, 3);
            assert_eq!(settings.default_match.venue, "Riverside Park");
            assert_eq!(settings.default_match.name, MatchInfo::default().name);
        });
    }

    #[test]
    #[serial]
    fn rejects_bad_session_hours() {
        let mut vars = cleared();
        vars.push(("MATCHDAY_SESSION_HOURS", Some("soon")));

        temp_env::with_vars(vars, || {
            let err = Settings::from_env().unwrap_err();
            assert!(err.to_string().contains("MATCHDAY_SESSION_HOURS"));
        });
    }

    #[test]
    #[serial]
    fn rejects_out_of_range_session_hours() {
        for raw in ["0", "-4", "10000000000000", "9223372036854775807"] {
            let mut vars = cleared();
            vars.push(("MATCHDAY_SESSION_HOURS", Some(raw)));

            temp_env::with_vars(vars, || {
                assert!(Settings::from_env().is_err(), "accepted {}", raw);
            });
        }

        let mut vars = cleared();
        vars.push(("MATCHDAY_SESSION_HOURS", Some("8760")));
        temp_env::with_vars(vars, || {
            assert_eq!(Settings::from_env().unwrap().session_hours, MAX_SESSION_HOURS);
        });
    }

    #[test]
    #[serial]
    fn half_configured_admin_is_ignored() {
        let mut vars = cleared();
        vars.push(("MATCHDAY_ADMIN_EMAIL", Some("boss@example.com")));

        temp_env::with_vars(vars, || {
            assert_eq!(Settings::from_env().unwrap().admin, None);
        });
    }
}
