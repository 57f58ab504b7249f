use clap::ValueEnum;
use serde::{Deserialize, Serialize};

use crate::output::ThemeChoice;

/// Environment variables used to determine which CI environment (if any) we run in.
///
/// <https://docs.github.com/en/actions/reference/workflows-and-actions/variables>
/// <https://docs.gitlab.com/ci/variables/predefined_variables/>
pub const GITHUB_ACTIONS_ENV_VAR: &str = "GITHUB_ACTIONS";
pub const GITLAB_CI_ENV_VAR: &str = "GITLAB_CI";
pub const NO_COLOR_ENV_VAR: &str = "NO_COLOR";
/// `fg;bg` (or `fg;default;bg`) terminal color indices, set by rxvt, Konsole and friends.
pub const COLORFGBG_ENV_VAR: &str = "COLORFGBG";

/// The CI log renderer that group markup is emitted for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CiEnvironment {
    None,
    GitHubActions,
    GitLabCi,
}

/// Replaceable environment probes.
///
/// Every probe is a plain function pointer so tests can swap in
/// `|| true` / `|| false` without touching process state.
#[derive(Debug, Clone, Copy)]
pub struct Detectors {
    pub github_actions: fn() -> bool,
    pub gitlab_ci: fn() -> bool,
    pub no_color: fn() -> bool,
    pub dark_background: fn() -> bool,
}

impl Default for Detectors {
    fn default() -> Self {
        Self {
            github_actions: is_github_actions,
            gitlab_ci: is_gitlab_ci,
            no_color: env_no_color,
            dark_background: env_dark_background,
        }
    }
}

impl Detectors {
    /// Detectors that report a plain dark terminal with color allowed.
    pub fn plain() -> Self {
        Self {
            github_actions: never,
            gitlab_ci: never,
            no_color: never,
            dark_background: always,
        }
    }

    /// Resolves the CI environment.
    ///
    /// Both CI probes are always evaluated; GitHub Actions wins when both report true.
    pub fn ci_environment(&self) -> CiEnvironment {
        let github = (self.github_actions)();
        let gitlab = (self.gitlab_ci)();

        match (github, gitlab) {
            (true, _) => CiEnvironment::GitHubActions,
            (false, true) => CiEnvironment::GitLabCi,
            (false, false) => CiEnvironment::None,
        }
    }

    /// Replaces the CI probes according to a configured provider.
    #[must_use]
    pub fn with_provider(mut self, provider: CiProvider) -> Self {
        match provider {
            CiProvider::Auto => {}
            CiProvider::None => {
                self.github_actions = never;
                self.gitlab_ci = never;
            }
            CiProvider::Github => {
                self.github_actions = always;
                self.gitlab_ci = never;
            }
            CiProvider::Gitlab => {
                self.github_actions = never;
                self.gitlab_ci = always;
            }
        }
        self
    }

    /// Replaces the background probe according to a configured theme.
    #[must_use]
    pub fn with_theme(mut self, theme: ThemeChoice) -> Self {
        match theme {
            ThemeChoice::Auto => {}
            ThemeChoice::Light => self.dark_background = never,
            ThemeChoice::Dark => self.dark_background = always,
        }
        self
    }
}

/// CI provider selection from configuration or the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum CiProvider {
    #[default]
    Auto,
    None,
    Github,
    Gitlab,
}

fn is_github_actions() -> bool {
    std::env::var(GITHUB_ACTIONS_ENV_VAR).is_ok_and(|v| v == "true")
}

fn is_gitlab_ci() -> bool {
    std::env::var(GITLAB_CI_ENV_VAR).is_ok_and(|v| v == "true")
}

// https://no-color.org/
fn env_no_color() -> bool {
    std::env::var_os(NO_COLOR_ENV_VAR).is_some_and(|v| !v.is_empty())
}

fn env_dark_background() -> bool {
    background_is_dark(std::env::var(COLORFGBG_ENV_VAR).ok().as_deref())
}

/// Reads the background index from a `COLORFGBG` value.
///
/// Indices 0-6 and 8 are dark ANSI colors. Anything unreadable counts as
/// dark, the common case for terminals that do not set the variable.
fn background_is_dark(colorfgbg: Option<&str>) -> bool {
    let background = colorfgbg
        .and_then(|value| value.rsplit(';').next())
        .and_then(|bg| bg.trim().parse::<u8>().ok());
    match background {
        Some(bg) => matches!(bg, 0..=6 | 8),
        None => true,
    }
}

fn always() -> bool {
    true
}

fn never() -> bool {
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn detectors(github_actions: fn() -> bool, gitlab_ci: fn() -> bool) -> Detectors {
        Detectors {
            github_actions,
            gitlab_ci,
            no_color: never,
            dark_background: always,
        }
    }

    #[test]
    fn test_ci_environment_none() {
        assert_eq!(detectors(never, never).ci_environment(), CiEnvironment::None);
    }

    #[test]
    fn test_ci_environment_github() {
        assert_eq!(
            detectors(always, never).ci_environment(),
            CiEnvironment::GitHubActions
        );
    }

    #[test]
    fn test_ci_environment_gitlab() {
        assert_eq!(
            detectors(never, always).ci_environment(),
            CiEnvironment::GitLabCi
        );
    }

    #[test]
    fn test_github_takes_precedence() {
        assert_eq!(
            detectors(always, always).ci_environment(),
            CiEnvironment::GitHubActions
        );
    }

    #[test]
    fn test_both_probes_always_run() {
        static GITHUB_CALLS: AtomicUsize = AtomicUsize::new(0);
        static GITLAB_CALLS: AtomicUsize = AtomicUsize::new(0);

        fn github() -> bool {
            GITHUB_CALLS.fetch_add(1, Ordering::SeqCst);
            true
        }
        fn gitlab() -> bool {
            GITLAB_CALLS.fetch_add(1, Ordering::SeqCst);
            false
        }

        detectors(github, gitlab).ci_environment();

        assert_eq!(GITHUB_CALLS.load(Ordering::SeqCst), 1);
        assert_eq!(GITLAB_CALLS.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_with_provider_overrides_probes() {
        let base = detectors(always, always);

        assert_eq!(
            base.with_provider(CiProvider::Auto).ci_environment(),
            CiEnvironment::GitHubActions
        );
        assert_eq!(
            base.with_provider(CiProvider::None).ci_environment(),
            CiEnvironment::None
        );
        assert_eq!(
            base.with_provider(CiProvider::Gitlab).ci_environment(),
            CiEnvironment::GitLabCi
        );
        assert_eq!(
            Detectors::plain()
                .with_provider(CiProvider::Github)
                .ci_environment(),
            CiEnvironment::GitHubActions
        );
    }

    #[test]
    fn test_background_is_dark() {
        assert!(background_is_dark(None));
        assert!(background_is_dark(Some("15;0")));
        assert!(background_is_dark(Some("7;default;8")));
        assert!(!background_is_dark(Some("0;15")));
        assert!(!background_is_dark(Some("0;7")));
        assert!(background_is_dark(Some("garbage")));
    }

    #[test]
    fn test_with_theme_overrides_background_probe() {
        let base = Detectors::plain();
        assert!((base.with_theme(ThemeChoice::Auto).dark_background)());
        assert!(!(base.with_theme(ThemeChoice::Light).dark_background)());
        assert!((base
            .with_theme(ThemeChoice::Light)
            .with_theme(ThemeChoice::Dark)
            .dark_background)());
    }

    #[test]
    fn test_plain_detectors() {
        let plain = Detectors::plain();
        assert_eq!(plain.ci_environment(), CiEnvironment::None);
        assert!(!(plain.no_color)());
        assert!((plain.dark_background)());
    }
}
