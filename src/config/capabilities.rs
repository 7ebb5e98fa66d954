//! Driver capability derivation.
//!
//! [`DriverCapabilities`] is the structured startup object handed to the
//! session bootstrap. It is derived fresh from a [`Settings`] record each
//! time it is requested; derivation is a pure function with no caching and
//! no internal state, so equal settings always yield equal capabilities.
//!
//! The merge precedence is fixed:
//! 1. UiAutomator2 engine seed
//! 2. `deviceName` / `platformName`
//! 3. `app` (relative references absolutized against the project root)
//! 4. `newCommandTimeout`
//! 5. `udid` plus the hidden-API policy relaxation (real-device only)
//! 6. `appWaitActivity`
//! 7. BrowserStack layer (`platformVersion` + `bstack:options`), additive

use serde::Serialize;
use serde_json::{Map, Value};

use crate::config::settings::Settings;
use crate::paths;

/// Accumulates capabilities into a key-ordered mapping.
///
/// The builder knows nothing about any driver library; it exists so the
/// conditional-merge rules above stay unit-testable in isolation.
#[derive(Debug, Clone, Default)]
pub struct CapabilityBuilder {
    caps: Map<String, Value>,
}

impl CapabilityBuilder {
    /// Creates an empty builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a builder seeded for the UiAutomator2 automation engine.
    pub fn uiautomator2() -> Self {
        Self::new()
            .set("automationName", "UiAutomator2")
            .set("platformName", "Android")
    }

    /// Sets a capability.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.caps.insert(key.into(), value.into());
        self
    }

    /// Sets a capability only when a value is present. Absent values leave
    /// the capability out entirely rather than writing null.
    pub fn set_opt(self, key: impl Into<String>, value: Option<impl Into<Value>>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    /// Merges another capability layer in, key by key. Keys not named by
    /// the layer keep their current values.
    pub fn merge(mut self, layer: Map<String, Value>) -> Self {
        for (key, value) in layer {
            self.caps.insert(key, value);
        }
        self
    }

    /// Finalizes the builder.
    pub fn build(self) -> DriverCapabilities {
        DriverCapabilities { caps: self.caps }
    }
}

/// Derived driver-startup capabilities, ready for the session bootstrap.
///
/// Never constructed directly; always derived from [`Settings`] via
/// [`DriverCapabilities::derive`] (or assembled through
/// [`CapabilityBuilder`] in tests).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct DriverCapabilities {
    caps: Map<String, Value>,
}

impl DriverCapabilities {
    /// Derives the capability object for a resolved settings record.
    pub fn derive(settings: &Settings) -> Self {
        let mut builder = CapabilityBuilder::uiautomator2()
            .set_opt("deviceName", settings.device_name.clone())
            .set_opt("platformName", settings.platform_name.clone())
            .set_opt("app", settings.app.as_deref().map(|app| resolve_app(settings, app)))
            .set("newCommandTimeout", settings.new_command_timeout);

        if let Some(udid) = &settings.udid {
            // Real-device attachment; hidden-API policy errors abort the
            // session on physical hardware, so relax the check here only.
            builder = builder
                .set("udid", udid.clone())
                .set("ignoreHiddenApiPolicyError", true);
        }

        builder = builder.set_opt("appWaitActivity", settings.app_wait_activity.clone());

        if settings.run_on_browserstack() {
            builder = builder
                .set_opt("platformVersion", settings.platform_version.clone())
                .merge(browserstack_layer(settings));
        }

        builder.build()
    }

    /// Looks up a capability by key.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.caps.get(key)
    }

    /// True when the capability is present.
    pub fn contains(&self, key: &str) -> bool {
        self.caps.contains_key(key)
    }

    /// Borrows the underlying mapping.
    pub fn as_map(&self) -> &Map<String, Value> {
        &self.caps
    }

    /// Consumes the object, yielding the mapping the WebDriver client
    /// expects for session negotiation.
    pub fn into_map(self) -> Map<String, Value> {
        self.caps
    }
}

/// The BrowserStack capability layer: vendor-specific fields nested under
/// `bstack:options`, with credentials renamed to the vendor's key names.
fn browserstack_layer(settings: &Settings) -> Map<String, Value> {
    let mut options = Map::new();
    insert_opt(&mut options, "projectName", &settings.project_name);
    insert_opt(&mut options, "buildName", &settings.build_name);
    insert_opt(&mut options, "sessionName", &settings.session_name);
    insert_opt(&mut options, "userName", &settings.user_login);
    insert_opt(&mut options, "accessKey", &settings.access_key);

    let mut layer = Map::new();
    layer.insert("bstack:options".to_string(), Value::Object(options));
    layer
}

fn insert_opt(map: &mut Map<String, Value>, key: &str, value: &Option<String>) {
    if let Some(value) = value {
        map.insert(key.to_string(), Value::String(value.clone()));
    }
}

/// Resolves the app reference: relative filesystem references become
/// absolute paths under the project root, everything else passes through
/// unchanged (remote URLs, `bs://` uploads, absolute paths).
fn resolve_app(settings: &Settings, app: &str) -> String {
    if paths::is_relative_reference(app) {
        paths::resolve_relative(&settings.root, app)
            .to_string_lossy()
            .into_owned()
    } else {
        app.to_string()
    }
}
