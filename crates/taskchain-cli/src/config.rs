//! Host configuration.

use std::time::Duration;

use taskchain_http::{DemoUrls, HttpConfig};
use taskchain_runner::{FailurePolicy, RunnerConfig};

use crate::Cli;

/// Host configuration.
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// HTTP transport settings.
    pub http: HttpConfig,

    /// Pipeline settings.
    pub runner: RunnerConfig,

    /// Endpoints used by the demo tasks.
    pub urls: DemoUrls,
}

impl Config {
    /// Build the configuration from command line arguments.
    pub fn from_cli(cli: &Cli) -> Self {
        let mut config = Self::default();

        if let Some(secs) = cli.timeout_secs {
            config.http.request_timeout = Duration::from_secs(secs);
        }
        if let Some(secs) = cli.task_timeout_secs {
            config.runner.task_timeout = Some(Duration::from_secs(secs));
        }
        if cli.stop_on_failure {
            config.runner.failure_policy = FailurePolicy::StopOnFailure;
        }
        if let Some(url) = &cli.download_url {
            config.urls.download_url = url.clone();
        }
        if let Some(url) = &cli.redirect_url {
            config.urls.redirect_url = url.clone();
        }
        if let Some(location) = &cli.expected_location {
            config.urls.expected_location = location.clone();
        }
        if let Some(url) = &cli.post_url {
            config.urls.post_url = url.clone();
        }

        config
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_defaults() {
        let cli = Cli::try_parse_from(["taskchain", "list"]).unwrap();
        let config = Config::from_cli(&cli);

        assert_eq!(config.runner.failure_policy, FailurePolicy::Continue);
        assert!(config.runner.task_timeout.is_none());
        assert_eq!(config.urls, DemoUrls::default());
    }

    #[test]
    fn test_overrides() {
        let cli = Cli::try_parse_from([
            "taskchain",
            "--stop-on-failure",
            "--task-timeout-secs",
            "5",
            "--redirect-url",
            "http://localhost:8080/old",
            "run",
        ])
        .unwrap();
        let config = Config::from_cli(&cli);

        assert_eq!(config.runner.failure_policy, FailurePolicy::StopOnFailure);
        assert_eq!(config.runner.task_timeout, Some(Duration::from_secs(5)));
        assert_eq!(config.urls.redirect_url, "http://localhost:8080/old");
        assert_eq!(config.urls.post_url, DemoUrls::default().post_url);
    }
}
