//! Configuration loaded from environment variables.
//!
//! | 変数                   | 既定値  |
//! |------------------------|---------|
//! | `AHEM_SCHEDULER`       | `queue` |
//! | `AHEM_WORKERS`         | `2`     |
//! | `AHEM_POLL_TIMEOUT_MS` | `500`   |
//! | `AHEM_LOG`             | `info`  |

use std::time::Duration;

use thiserror::Error;

use crate::ports::SchedulerMode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("{var} is invalid: {reason}")]
    Invalid { var: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AhemConfig {
    /// inline: dispatch 中に送信 / queue: worker が送信
    pub scheduler: SchedulerMode,

    /// queue モードの worker 数（1 以上）
    pub workers: usize,

    /// worker が 1 回の pop で待つ時間（0 は不可）
    pub poll_timeout: Duration,

    /// tracing の EnvFilter 文字列
    pub log_filter: String,
}

impl Default for AhemConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerMode::Queue,
            workers: 2,
            poll_timeout: Duration::from_millis(500),
            log_filter: "info".to_string(),
        }
    }
}

impl AhemConfig {
    /// `.env` を読んだうえで環境変数から構築
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// 任意の lookup 関数から構築（テスト用に環境変数を介さない）
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let scheduler = match lookup("AHEM_SCHEDULER") {
            Some(raw) => raw.parse::<SchedulerMode>().map_err(|reason| ConfigError::Invalid {
                var: "AHEM_SCHEDULER",
                reason,
            })?,
            None => defaults.scheduler,
        };

        let workers = match lookup("AHEM_WORKERS") {
            Some(raw) => {
                let workers: usize = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "AHEM_WORKERS",
                    reason: format!("'{raw}' is not a valid usize"),
                })?;
                if workers == 0 {
                    return Err(ConfigError::Invalid {
                        var: "AHEM_WORKERS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                workers
            }
            None => defaults.workers,
        };

        let poll_timeout = match lookup("AHEM_POLL_TIMEOUT_MS") {
            Some(raw) => {
                let ms: u64 = raw.trim().parse().map_err(|_| ConfigError::Invalid {
                    var: "AHEM_POLL_TIMEOUT_MS",
                    reason: format!("'{raw}' is not a valid u64"),
                })?;
                if ms == 0 {
                    return Err(ConfigError::Invalid {
                        var: "AHEM_POLL_TIMEOUT_MS",
                        reason: "must be at least 1".to_string(),
                    });
                }
                Duration::from_millis(ms)
            }
            None => defaults.poll_timeout,
        };

        let log_filter = lookup("AHEM_LOG").unwrap_or(defaults.log_filter);

        Ok(Self {
            scheduler,
            workers,
            poll_timeout,
            log_filter,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    #[test]
    fn defaults_when_nothing_is_set() {
        let config = AhemConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, AhemConfig::default());
    }

    #[test]
    fn reads_all_variables() {
        let config = AhemConfig::from_lookup(lookup(&[
            ("AHEM_SCHEDULER", "inline"),
            ("AHEM_WORKERS", "4"),
            ("AHEM_POLL_TIMEOUT_MS", "50"),
            ("AHEM_LOG", "ahem_core=debug"),
        ]))
        .unwrap();

        assert_eq!(config.scheduler, SchedulerMode::Inline);
        assert_eq!(config.workers, 4);
        assert_eq!(config.poll_timeout, Duration::from_millis(50));
        assert_eq!(config.log_filter, "ahem_core=debug");
    }

    #[rstest]
    #[case("AHEM_SCHEDULER", "celery")]
    #[case("AHEM_WORKERS", "0")]
    #[case("AHEM_WORKERS", "many")]
    #[case("AHEM_POLL_TIMEOUT_MS", "-1")]
    #[case("AHEM_POLL_TIMEOUT_MS", "0")]
    fn rejects_invalid_values(#[case] var: &str, #[case] value: &str) {
        let err = AhemConfig::from_lookup(lookup(&[(var, value)])).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { var: v, .. } if v == var));
    }
}
