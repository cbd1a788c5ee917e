//! Navigation targets and the host seam that performs them.

use authgate_core::NavigationConfig;

/// Where a finished callback sends the user.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NavigationTarget {
    /// The default landing location.
    Landing,
    /// The login entry point.
    Login {
        /// Annotate the URL so the login page can explain the restart.
        expired_code: bool,
    },
    /// The profile completion page.
    ProfileCompletion,
}

impl NavigationTarget {
    /// Resolve to a concrete location.
    ///
    /// Automatic redirects replace the callback entry in history; the manual
    /// return to login pushes. Without a configured completion page,
    /// [`ProfileCompletion`](Self::ProfileCompletion) resolves to the landing
    /// location.
    pub fn resolve(&self, config: &NavigationConfig) -> Location {
        match self {
            Self::Landing => Location::replace(&config.landing_path),
            Self::Login { expired_code: true } => Location::replace(format!(
                "{}?{}={}",
                config.login_path, config.expired_param, config.expired_value
            )),
            Self::Login {
                expired_code: false,
            } => Location::push(&config.login_path),
            Self::ProfileCompletion => Location::replace(
                config
                    .profile_completion_path
                    .as_deref()
                    .unwrap_or(&config.landing_path),
            ),
        }
    }
}

/// A resolved navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Location {
    /// Path plus optional query.
    pub path: String,
    /// Replace the current history entry instead of pushing.
    pub replace: bool,
}

impl Location {
    /// A replace-style navigation.
    pub fn replace(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: true,
        }
    }

    /// A push-style navigation.
    pub fn push(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            replace: false,
        }
    }
}

/// Performs navigation on behalf of the coordinator.
#[cfg_attr(test, mockall::automock)]
pub trait Navigator: Send + Sync {
    /// Go to `location`.
    fn navigate(&self, location: &Location);
}
