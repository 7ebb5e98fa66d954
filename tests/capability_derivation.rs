//! Integration tests for capability derivation
//!
//! Runs the full chain (environment file -> resolved settings -> derived
//! capabilities) and checks the merge rules the driver bootstrap relies on.

use std::fs;
use std::path::Path;

use appdriver::config::{DriverCapabilities, ExecutionContext, Settings};
use serde_json::Value;
use tempfile::TempDir;

fn write_env_file(root: &Path, context: ExecutionContext, body: &str) {
    fs::write(root.join(context.env_file_name()), body).unwrap();
}

#[test]
fn emulator_run_derives_local_capabilities() {
    let root = TempDir::new().unwrap();
    write_env_file(
        root.path(),
        ExecutionContext::Emulation,
        "platformName=Android\n\
         deviceName=emulator-5554\n\
         app=./apps/app-alpha-universal-release.apk\n\
         appWaitActivity=org.wikipedia.*\n",
    );

    let settings =
        Settings::resolve_from(root.path(), Some(ExecutionContext::Emulation)).unwrap();
    let caps = DriverCapabilities::derive(&settings);

    assert_eq!(
        caps.get("automationName"),
        Some(&Value::String("UiAutomator2".into()))
    );
    assert_eq!(
        caps.get("deviceName"),
        Some(&Value::String("emulator-5554".into()))
    );
    assert_eq!(
        caps.get("appWaitActivity"),
        Some(&Value::String("org.wikipedia.*".into()))
    );
    assert_eq!(caps.get("newCommandTimeout"), Some(&Value::from(60u32)));

    // Relative app reference resolved against the project root.
    let app = caps.get("app").and_then(Value::as_str).unwrap();
    assert!(Path::new(app).is_absolute());
    assert!(app.ends_with("app-alpha-universal-release.apk"));
    assert!(app.starts_with(root.path().to_str().unwrap()));

    // No real-device affordances, no cloud options.
    assert!(!caps.contains("udid"));
    assert!(!caps.contains("ignoreHiddenApiPolicyError"));
    assert!(!caps.contains("bstack:options"));
}

#[test]
fn real_device_run_relaxes_hidden_api_policy() {
    let root = TempDir::new().unwrap();
    write_env_file(
        root.path(),
        ExecutionContext::Real,
        "deviceName=Galaxy S21\nudid=R58M42ABCDE\n",
    );

    let settings = Settings::resolve_from(root.path(), Some(ExecutionContext::Real)).unwrap();
    let caps = DriverCapabilities::derive(&settings);

    assert_eq!(caps.get("udid"), Some(&Value::String("R58M42ABCDE".into())));
    assert_eq!(
        caps.get("ignoreHiddenApiPolicyError"),
        Some(&Value::Bool(true))
    );
}

#[test]
fn browserstack_run_merges_cloud_options() {
    let root = TempDir::new().unwrap();
    write_env_file(
        root.path(),
        ExecutionContext::Browser,
        "remote_url=http://hub.browserstack.com/wd/hub\n\
         platformVersion=12.0\n\
         deviceName=Google Pixel 6\n\
         app=bs://f7c874f21852ba57957a3fdc33f47514\n\
         projectName=Wikipedia tests\n\
         buildName=alpha-1\n\
         sessionName=search\n\
         userLogin=qa_user\n\
         accessKey=secret-key\n",
    );

    let settings =
        Settings::resolve_from(root.path(), Some(ExecutionContext::Browser)).unwrap();
    let caps = DriverCapabilities::derive(&settings);

    // bs:// references pass through untouched.
    assert_eq!(
        caps.get("app"),
        Some(&Value::String("bs://f7c874f21852ba57957a3fdc33f47514".into()))
    );
    assert_eq!(
        caps.get("platformVersion"),
        Some(&Value::String("12.0".into()))
    );

    let options = caps
        .get("bstack:options")
        .and_then(Value::as_object)
        .expect("bstack:options block");
    assert_eq!(
        options.get("projectName"),
        Some(&Value::String("Wikipedia tests".into()))
    );
    assert_eq!(options.get("buildName"), Some(&Value::String("alpha-1".into())));
    assert_eq!(options.get("sessionName"), Some(&Value::String("search".into())));
    assert_eq!(options.get("userName"), Some(&Value::String("qa_user".into())));
    assert_eq!(
        options.get("accessKey"),
        Some(&Value::String("secret-key".into()))
    );

    // The cloud merge is additive over earlier steps.
    assert_eq!(
        caps.get("deviceName"),
        Some(&Value::String("Google Pixel 6".into()))
    );
    assert!(caps.contains("newCommandTimeout"));
}

#[test]
fn browser_context_without_hub_url_gets_no_cloud_options() {
    let root = TempDir::new().unwrap();
    write_env_file(
        root.path(),
        ExecutionContext::Browser,
        "userLogin=qa_user\naccessKey=secret-key\n",
    );

    let settings =
        Settings::resolve_from(root.path(), Some(ExecutionContext::Browser)).unwrap();
    let caps = DriverCapabilities::derive(&settings);

    assert!(!caps.contains("bstack:options"));
    assert!(!caps.contains("platformVersion"));
}

#[test]
fn derivation_is_deterministic_end_to_end() {
    let root = TempDir::new().unwrap();
    write_env_file(
        root.path(),
        ExecutionContext::Real,
        "deviceName=Galaxy S21\nudid=R58M42ABCDE\napp=./apps/app.apk\n",
    );

    let settings = Settings::resolve_from(root.path(), Some(ExecutionContext::Real)).unwrap();
    assert_eq!(
        DriverCapabilities::derive(&settings),
        DriverCapabilities::derive(&settings)
    );

    // Re-resolving from the same files yields an equivalent record too.
    let again = Settings::resolve_from(root.path(), Some(ExecutionContext::Real)).unwrap();
    assert_eq!(
        DriverCapabilities::derive(&settings),
        DriverCapabilities::derive(&again)
    );
}
