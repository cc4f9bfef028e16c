//! 远程能力描述符
//!
//! 描述符是 (变体, 配置) 的纯函数：同样的输入总是产出同样的值，
//! 因此可以安全缓存，除显式清空外不需要失效

use serde_json::{json, Map, Value};

use crate::config::Config;
use crate::models::engine::BrowserEngine;
use crate::models::variant::BrowserVariant;

/// 所有本地构建器与远程描述符共用的基线稳定性参数
pub const BASELINE_STABILITY_ARGS: &[&str] = &[
    "--disable-gpu",
    "--no-sandbox",
    "--disable-extensions",
    "--disable-notifications",
    "--ignore-certificate-errors",
    "--disable-dev-shm-usage",
];

/// 云服务商扩展块
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CloudExtension {
    /// 厂商能力键，如 "bstack:options"
    pub key: String,
    /// 厂商选项块
    pub options: Value,
}

/// 远程能力描述符
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
pub struct CapabilitiesDescriptor {
    pub browser_name: String,
    /// 厂商能力键（goog:chromeOptions 等，随引擎确定）
    pub vendor_options_key: String,
    /// 厂商选项块（args / prefs / mobileEmulation 等）
    pub browser_options: Value,
    pub platform_name: String,
    pub browser_version: Option<String>,
    pub cloud_extensions: Option<CloudExtension>,
}

impl CapabilitiesDescriptor {
    /// 从变体和配置构建描述符
    pub fn build(variant: &BrowserVariant, config: &Config) -> Self {
        Self {
            browser_name: variant.engine.wire_name().to_string(),
            vendor_options_key: vendor_options_key(variant.engine).to_string(),
            browser_options: build_browser_options(variant, config),
            platform_name: platform_name_for(variant).to_string(),
            browser_version: config.browser_version.clone(),
            cloud_extensions: build_cloud_extension(config),
        }
    }

    /// 渲染 W3C 新建会话请求中的 alwaysMatch 块
    pub fn to_w3c(&self) -> Value {
        let mut always_match = Map::new();
        always_match.insert("browserName".to_string(), json!(self.browser_name));
        always_match.insert("platformName".to_string(), json!(self.platform_name));
        if let Some(version) = &self.browser_version {
            always_match.insert("browserVersion".to_string(), json!(version));
        }
        always_match.insert(
            self.vendor_options_key.clone(),
            self.browser_options.clone(),
        );
        if let Some(ext) = &self.cloud_extensions {
            always_match.insert(ext.key.clone(), ext.options.clone());
        }
        Value::Object(always_match)
    }
}

/// 该引擎的厂商能力键
pub fn vendor_options_key(engine: BrowserEngine) -> &'static str {
    match engine {
        BrowserEngine::Chrome | BrowserEngine::Opera => "goog:chromeOptions",
        BrowserEngine::Edge => "ms:edgeOptions",
        BrowserEngine::Firefox => "moz:firefoxOptions",
        BrowserEngine::Safari => "safari:options",
        BrowserEngine::LegacyIe => "se:ieOptions",
    }
}

/// 按变体模式推导平台名
fn platform_name_for(variant: &BrowserVariant) -> &'static str {
    if variant.is_docker() {
        return "linux";
    }
    if variant.is_mobile() {
        return match variant.engine {
            BrowserEngine::Safari => "iOS",
            _ => "Android",
        };
    }
    "ANY"
}

fn build_browser_options(variant: &BrowserVariant, config: &Config) -> Value {
    let mut options = Map::new();

    match variant.engine {
        BrowserEngine::Firefox => {
            let mut args: Vec<String> = Vec::new();
            if variant.is_headless() || config.headless {
                args.push("-headless".to_string());
            }
            options.insert("args".to_string(), json!(args));
            let mut prefs = Map::new();
            if variant.supports_downloads {
                if let Some(dir) = &config.download_dir {
                    prefs.insert("browser.download.folderList".to_string(), json!(2));
                    prefs.insert("browser.download.dir".to_string(), json!(dir));
                }
            }
            options.insert("prefs".to_string(), Value::Object(prefs));
        }
        BrowserEngine::Safari | BrowserEngine::LegacyIe => {
            // safaridriver / IEDriverServer 不接受 Chromium 式启动参数
        }
        _ => {
            let mut args: Vec<String> = BASELINE_STABILITY_ARGS
                .iter()
                .map(|s| s.to_string())
                .collect();
            if variant.is_headless() || config.headless {
                args.push("--headless=new".to_string());
            }
            if let Ok((width, height)) = config.parsed_window_size() {
                args.push(format!("--window-size={},{}", width, height));
            }
            options.insert("args".to_string(), json!(args));

            let mut prefs = Map::new();
            if variant.supports_downloads {
                if let Some(dir) = &config.download_dir {
                    prefs.insert("download.default_directory".to_string(), json!(dir));
                    prefs.insert("download.prompt_for_download".to_string(), json!(false));
                }
            }
            if !prefs.is_empty() {
                options.insert("prefs".to_string(), Value::Object(prefs));
            }

            if variant.is_mobile() {
                options.insert(
                    "mobileEmulation".to_string(),
                    json!({ "deviceName": "Pixel 7" }),
                );
            }
        }
    }

    Value::Object(options)
}

fn build_cloud_extension(config: &Config) -> Option<CloudExtension> {
    let provider = config.cloud_provider.as_deref()?;
    let key = match provider {
        "browserstack" => "bstack:options".to_string(),
        "saucelabs" => "sauce:options".to_string(),
        "selenoid" => "selenoid:options".to_string(),
        other => format!("{}:options", other),
    };

    let mut options = Map::new();
    options.insert("environment".to_string(), json!(config.environment));
    for (name, value) in &config.cloud_options {
        options.insert(name.clone(), json!(value));
    }

    Some(CloudExtension {
        key,
        options: Value::Object(options),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::variant::resolve;

    #[test]
    fn test_descriptor_is_pure() {
        let config = Config::default();
        let variant = resolve("chrome-remote");
        let first = CapabilitiesDescriptor::build(variant, &config);
        let second = CapabilitiesDescriptor::build(variant, &config);
        assert_eq!(first, second);
        assert_eq!(first.to_w3c(), second.to_w3c());
    }

    #[test]
    fn test_w3c_rendering_shape() {
        let mut config = Config::default();
        config.cloud_provider = Some("browserstack".to_string());
        config.cloud_options = vec![("project".to_string(), "web".to_string())];

        let variant = resolve("edge-remote");
        let descriptor = CapabilitiesDescriptor::build(variant, &config);
        let w3c = descriptor.to_w3c();

        assert_eq!(w3c["browserName"], "MicrosoftEdge");
        assert!(w3c["ms:edgeOptions"]["args"]
            .as_array()
            .unwrap()
            .iter()
            .any(|a| a == "--no-sandbox"));
        assert_eq!(w3c["bstack:options"]["project"], "web");
        assert_eq!(w3c["bstack:options"]["environment"], "local");
    }

    #[test]
    fn test_docker_platform_is_linux() {
        let config = Config::default();
        let descriptor = CapabilitiesDescriptor::build(resolve("firefox-docker"), &config);
        assert_eq!(descriptor.platform_name, "linux");
    }
}
