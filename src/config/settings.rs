//! Typed settings resolution for one test run.
//!
//! Settings are resolved once, up front, from three layers with increasing
//! precedence:
//! 1. Built-in defaults
//! 2. The environment file for the active context (`config.<context>.env`)
//! 3. Process environment variables
//!
//! The resolved record is immutable for the remainder of the run and is the
//! single input to capability derivation and session bootstrap.

use std::env;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

use crate::config::context::ExecutionContext;
use crate::paths;

/// BrowserStack remote hub hostname. Capability derivation merges the
/// `bstack:options` block only when `remote_url` points here.
pub const BROWSERSTACK_HOST: &str = "hub.browserstack.com";

/// Default Appium server URL.
pub const DEFAULT_REMOTE_URL: &str = "http://127.0.0.1:4723/wd/hub";

/// Errors that can occur during settings resolution.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read or parse an environment file.
    #[error("Failed to load environment file: {0}")]
    EnvFileError(#[from] dotenvy::Error),

    /// A recognized key holds a value that cannot be coerced to its
    /// declared type, or a resolved field violates an invariant.
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

/// Resolved configuration for one test run.
///
/// Field names mirror the keys recognized in environment files (the keys
/// keep their Appium camelCase spelling there, e.g. `platformName`).
/// Unset optional fields stay absent; they are never coerced to empty
/// strings and never emitted as capabilities.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Settings {
    /// Active execution context.
    pub context: ExecutionContext,

    // Device targeting
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub platform_version: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub device_name: Option<String>,
    /// Serial of an attached physical device. Setting this also relaxes the
    /// hidden-API policy check at capability-derivation time.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub udid: Option<String>,

    // Application targeting
    /// Local path (absolute, `./` or `../` relative to the project root) or
    /// remote reference (`https://...`, `bs://...`) to the app under test.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub app_wait_activity: Option<String>,

    // Timing
    /// Seconds the driver keeps an idle session alive.
    pub new_command_timeout: u32,
    /// Default element-wait timeout in seconds, consumed by the test layer.
    pub timeout: f64,

    // BrowserStack run identity
    #[serde(skip_serializing_if = "Option::is_none")]
    pub project_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub build_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_name: Option<String>,

    // BrowserStack credentials
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_login: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub access_key: Option<String>,

    /// Remote driver server URL.
    pub remote_url: String,

    /// Project root the settings were resolved against. Used to locate
    /// environment files and to absolutize relative app references.
    #[serde(skip)]
    pub root: PathBuf,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            context: ExecutionContext::default(),
            platform_name: None,
            platform_version: None,
            device_name: None,
            udid: None,
            app: None,
            app_name: None,
            app_wait_activity: None,
            new_command_timeout: 60,
            timeout: 6.0,
            project_name: None,
            build_name: None,
            session_name: None,
            user_login: None,
            access_key: None,
            remote_url: DEFAULT_REMOTE_URL.to_string(),
            root: paths::project_root(),
        }
    }
}

/// Environment keys recognized by the loader, in declaration order.
/// Unrecognized keys in an environment file are ignored.
const ENV_KEYS: &[&str] = &[
    "context",
    "platformName",
    "platformVersion",
    "deviceName",
    "udid",
    "app",
    "appName",
    "appWaitActivity",
    "newCommandTimeout",
    "timeout",
    "projectName",
    "buildName",
    "sessionName",
    "userLogin",
    "accessKey",
    "remote_url",
];

impl Settings {
    /// Resolves settings for the given context, or for the process-default
    /// context when none is asked for.
    ///
    /// Environment files are looked up in the project root. See
    /// [`Settings::resolve_from`] for the layering rules.
    pub fn resolve(context: Option<ExecutionContext>) -> Result<Self, ConfigError> {
        let root = paths::project_root();
        Self::resolve_from(&root, context)
    }

    /// Resolves settings against an explicit project root.
    ///
    /// When no context is asked for, a defaults-plus-process-env pass runs
    /// first to discover the configured context; the matching environment
    /// file is then loaded, and process environment variables are applied
    /// on top. The returned record always carries the asked (or
    /// discovered) context and a well-formed `remote_url`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::ValidationError`] when a recognized key
    /// cannot be coerced to its declared type, or when the resolved
    /// `remote_url` is not a valid URL.
    pub fn resolve_from(
        root: &Path,
        context: Option<ExecutionContext>,
    ) -> Result<Self, ConfigError> {
        let asked = match context {
            Some(ctx) => ctx,
            None => Self::default().merge_with_env()?.context,
        };

        let env_file = root.join(asked.env_file_name());
        let mut settings = Self::from_env_file(&env_file)?;
        settings = settings.merge_with_env()?;

        // The asked context wins even if the file names a different one;
        // it decided which file was loaded in the first place.
        settings.context = asked;
        settings.root = root.to_path_buf();
        settings.validate()?;

        debug!(context = %settings.context, remote_url = %settings.remote_url, "settings resolved");
        Ok(settings)
    }

    /// Loads settings from a single `KEY=value` environment file, layered
    /// over defaults.
    ///
    /// A missing file degrades to defaults with a warning; a present but
    /// malformed file is an error.
    pub fn from_env_file(path: &Path) -> Result<Self, ConfigError> {
        let mut settings = Self::default();

        if !path.is_file() {
            warn!(path = %path.display(), "environment file not found, using defaults");
            return Ok(settings);
        }

        for item in dotenvy::from_path_iter(path)? {
            let (key, value) = item?;
            settings.apply_pair(&key, &value)?;
        }

        Ok(settings)
    }

    /// Applies process environment overrides to current settings.
    ///
    /// Each recognized key is looked up by its exact name, then by its
    /// uppercase form. Coercion failures are surfaced, not defaulted.
    pub fn merge_with_env(mut self) -> Result<Self, ConfigError> {
        for key in ENV_KEYS {
            if let Some(value) = env_lookup(key) {
                self.apply_pair(key, &value)?;
            }
        }
        Ok(self)
    }

    /// True when this run targets the BrowserStack device farm: browser
    /// context with `remote_url` pointing at the BrowserStack hub.
    pub fn run_on_browserstack(&self) -> bool {
        if self.context != ExecutionContext::Browser {
            return false;
        }
        Url::parse(&self.remote_url)
            .ok()
            .and_then(|url| url.host_str().map(|host| host == BROWSERSTACK_HOST))
            .unwrap_or(false)
    }

    /// Applies one recognized `key=value` pair. Unrecognized keys are
    /// ignored so environment files can carry settings for other tools.
    fn apply_pair(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        match key {
            "context" => self.context = value.parse()?,
            "platformName" => self.platform_name = Some(value.to_string()),
            "platformVersion" => self.platform_version = Some(value.to_string()),
            "deviceName" => self.device_name = Some(value.to_string()),
            "udid" => self.udid = Some(value.to_string()),
            "app" => self.app = Some(value.to_string()),
            "appName" => self.app_name = Some(value.to_string()),
            "appWaitActivity" => self.app_wait_activity = Some(value.to_string()),
            "newCommandTimeout" => self.new_command_timeout = coerce("newCommandTimeout", value)?,
            "timeout" => self.timeout = coerce("timeout", value)?,
            "projectName" => self.project_name = Some(value.to_string()),
            "buildName" => self.build_name = Some(value.to_string()),
            "sessionName" => self.session_name = Some(value.to_string()),
            "userLogin" => self.user_login = Some(value.to_string()),
            "accessKey" => self.access_key = Some(value.to_string()),
            "remote_url" => self.remote_url = value.to_string(),
            _ => {}
        }
        Ok(())
    }

    /// Validates resolved settings.
    fn validate(&self) -> Result<(), ConfigError> {
        Url::parse(&self.remote_url).map_err(|e| {
            ConfigError::ValidationError(format!(
                "remote_url is not a well-formed URL ({}): {}",
                self.remote_url, e
            ))
        })?;
        Ok(())
    }

    // Builder-style methods, mainly useful for constructing fixtures.

    /// Sets the execution context.
    pub fn with_context(mut self, context: ExecutionContext) -> Self {
        self.context = context;
        self
    }

    /// Sets the app reference.
    pub fn with_app(mut self, app: impl Into<String>) -> Self {
        self.app = Some(app.into());
        self
    }

    /// Sets the remote driver URL.
    pub fn with_remote_url(mut self, url: impl Into<String>) -> Self {
        self.remote_url = url.into();
        self
    }

    /// Sets the device serial.
    pub fn with_udid(mut self, udid: impl Into<String>) -> Self {
        self.udid = Some(udid.into());
        self
    }
}

fn env_lookup(key: &str) -> Option<String> {
    env::var(key)
        .ok()
        .or_else(|| env::var(key.to_ascii_uppercase()).ok())
}

fn coerce<T: FromStr>(field: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| {
        ConfigError::ValidationError(format!(
            "Cannot coerce value {:?} for field {} to {}",
            value,
            field,
            std::any::type_name::<T>()
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_settings() {
        let settings = Settings::default();
        assert_eq!(settings.context, ExecutionContext::Browser);
        assert_eq!(settings.new_command_timeout, 60);
        assert_eq!(settings.timeout, 6.0);
        assert_eq!(settings.remote_url, DEFAULT_REMOTE_URL);
        assert!(settings.platform_name.is_none());
        assert!(settings.udid.is_none());
        assert!(settings.app.is_none());
    }

    #[test]
    fn test_apply_pair_recognized_keys() {
        let mut settings = Settings::default();
        settings.apply_pair("deviceName", "emulator-5554").unwrap();
        settings.apply_pair("newCommandTimeout", "120").unwrap();
        settings.apply_pair("timeout", "12.5").unwrap();
        settings.apply_pair("context", "real").unwrap();

        assert_eq!(settings.device_name.as_deref(), Some("emulator-5554"));
        assert_eq!(settings.new_command_timeout, 120);
        assert_eq!(settings.timeout, 12.5);
        assert_eq!(settings.context, ExecutionContext::Real);
    }

    #[test]
    fn test_apply_pair_ignores_unrecognized_keys() {
        let mut settings = Settings::default();
        settings.apply_pair("SOME_OTHER_TOOL_FLAG", "1").unwrap();
        assert_eq!(settings, Settings::default());
    }

    #[test]
    fn test_apply_pair_rejects_malformed_integer() {
        let mut settings = Settings::default();
        let err = settings
            .apply_pair("newCommandTimeout", "notanumber")
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_apply_pair_rejects_malformed_context() {
        let mut settings = Settings::default();
        assert!(settings.apply_pair("context", "simulator").is_err());
    }

    #[test]
    fn test_run_on_browserstack_requires_browser_context() {
        let settings = Settings::default()
            .with_context(ExecutionContext::Real)
            .with_remote_url("http://hub.browserstack.com/wd/hub");
        assert!(!settings.run_on_browserstack());
    }

    #[test]
    fn test_run_on_browserstack_requires_hub_host() {
        let local = Settings::default().with_context(ExecutionContext::Browser);
        assert!(!local.run_on_browserstack());

        let hub = local.with_remote_url("https://hub.browserstack.com/wd/hub");
        assert!(hub.run_on_browserstack());
    }

    #[test]
    fn test_validate_rejects_malformed_remote_url() {
        let settings = Settings::default().with_remote_url("not a url");
        assert!(matches!(
            settings.validate(),
            Err(ConfigError::ValidationError(_))
        ));
    }
}
