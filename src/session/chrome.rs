// src/session/chrome.rs
use anyhow::{Context, Result};
use headless_chrome::{Browser, LaunchOptions, Tab};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::{Session, SessionFactory};
use crate::config::BrowserConfig;

const CHROME_ARGS: [&str; 4] = [
    "--disable-dev-shm-usage",
    "--start-maximized",
    "--disable-extensions",
    "--disable-popup-blocking",
];

/// Launches Chrome with sandbox-free, popup-free flags.
pub struct ChromeLauncher {
    config: BrowserConfig,
}

impl ChromeLauncher {
    pub fn new(config: BrowserConfig) -> Self {
        Self { config }
    }
}

impl SessionFactory for ChromeLauncher {
    fn open(&self) -> Result<Box<dyn Session>> {
        Ok(Box::new(ChromeSession::launch(&self.config)?))
    }
}

/// A running browser and its single tab. The browser process is shut down
/// when this value is dropped.
pub struct ChromeSession {
    tab: Arc<Tab>,
    _browser: Browser,
}

impl ChromeSession {
    pub fn launch(config: &BrowserConfig) -> Result<Self> {
        let options = LaunchOptions {
            headless: config.headless,
            sandbox: false,
            idle_browser_timeout: Duration::from_secs(config.idle_timeout_secs),
            args: CHROME_ARGS.iter().map(|arg| OsStr::new(*arg)).collect(),
            ..Default::default()
        };

        let browser = Browser::new(options).context("Failed to launch Chrome")?;
        let tab = browser.new_tab().context("Failed to open browser tab")?;

        info!("Browser session opened (headless: {})", config.headless);
        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    /// Evaluate a script whose result is a JSON primitive.
    fn eval(&self, script: &str) -> Result<serde_json::Value> {
        let result = self
            .tab
            .evaluate(script, false)
            .context("Script evaluation failed")?;
        Ok(result.value.unwrap_or(serde_json::Value::Null))
    }

    fn exists(&self, selector: &str) -> Result<bool> {
        let script = format!("document.querySelector({}) !== null", js_string(selector)?);
        Ok(self.eval(&script)?.as_bool().unwrap_or(false))
    }
}

impl Session for ChromeSession {
    fn navigate(&self, url: &str) -> Result<()> {
        debug!("Navigating to {}", url);
        self.tab
            .navigate_to(url)
            .with_context(|| format!("Failed to navigate to {}", url))?
            .wait_until_navigated()
            .with_context(|| format!("Navigation to {} did not complete", url))?;
        Ok(())
    }

    fn page_source(&self) -> Result<String> {
        self.tab.get_content().context("Failed to read page content")
    }

    fn fill(&self, selector: &str, text: &str) -> Result<bool> {
        if !self.exists(selector)? {
            return Ok(false);
        }
        let element = self.tab.find_element(selector)?;
        element.click()?;
        element.type_into(text)?;
        Ok(true)
    }

    fn submit(&self, selector: &str) -> Result<bool> {
        if !self.exists(selector)? {
            return Ok(false);
        }
        self.tab.find_element(selector)?.click()?;
        self.tab.press_key("Enter")?;
        Ok(true)
    }

    fn scroll_by(&self, selector: &str, delta_px: i64) -> Result<Option<f64>> {
        let script = format!(
            "(() => {{ const el = document.querySelector({}); if (!el) return null; el.scrollTop += {}; return el.scrollTop; }})()",
            js_string(selector)?,
            delta_px
        );
        Ok(self.eval(&script)?.as_f64())
    }
}

impl Drop for ChromeSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(true) {
            warn!("Failed to close browser tab cleanly: {}", e);
        }
        info!("Browser session closed");
    }
}

fn js_string(value: &str) -> Result<String> {
    serde_json::to_string(value).context("Failed to encode selector")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_js_string_escapes_quotes() {
        assert_eq!(
            js_string(r#"a[href*='/jobs/view/']"#).unwrap(),
            r#""a[href*='/jobs/view/']""#
        );
        assert_eq!(js_string(r#"p[dir="ltr"]"#).unwrap(), r#""p[dir=\"ltr\"]""#);
    }
}
