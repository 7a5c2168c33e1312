//! A [`Page`] backed by a headless Chrome tab.
//!
//! `headless_chrome` is synchronous, so every DevTools call runs on the
//! blocking pool. Scripts return `JSON.stringify`-ed strings because
//! `Runtime.evaluate` only hands back primitives by value.

use std::ffi::OsStr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use headless_chrome::{Browser, LaunchOptionsBuilder, Tab};
use serde_json::Value;

use crate::error::ScraperError;
use crate::page::{CardSnapshot, Page, ScrollStep};

const POLL_INTERVAL: Duration = Duration::from_millis(250);

pub struct ChromePage {
    // Dropping the browser closes the tab.
    _browser: Browser,
    tab: Arc<Tab>,
}

impl ChromePage {
    /// Launches Chrome and opens a blank tab.
    ///
    /// # Errors
    ///
    /// Returns [`ScraperError::Browser`] if Chrome cannot be found or started.
    pub fn launch(user_agent: &str, headless: bool) -> Result<Self, ScraperError> {
        let ua_arg = format!("--user-agent={user_agent}");
        let options = LaunchOptionsBuilder::default()
            .args(vec![
                OsStr::new("--disable-gpu"),
                OsStr::new("--window-size=1366,900"),
                OsStr::new(&ua_arg),
            ])
            .headless(headless)
            .build()
            .map_err(browser_error)?;

        let browser = Browser::new(options).map_err(browser_error)?;
        let tab = browser.new_tab().map_err(browser_error)?;
        tracing::debug!(headless, "chrome launched");
        Ok(Self {
            _browser: browser,
            tab,
        })
    }

    async fn eval(&self, script: String) -> Result<Value, ScraperError> {
        let tab = Arc::clone(&self.tab);
        let remote = tokio::task::spawn_blocking(move || tab.evaluate(&script, false))
            .await
            .map_err(browser_error)?
            .map_err(browser_error)?;
        let raw = remote
            .value
            .as_ref()
            .and_then(Value::as_str)
            .ok_or_else(|| ScraperError::Browser("script returned no value".to_string()))?
            .to_string();
        serde_json::from_str(&raw).map_err(browser_error)
    }
}

impl Page for ChromePage {
    async fn set_location(&mut self, location: &str, inputs: &[String]) -> Result<bool, ScraperError> {
        let script = format!(
            r"JSON.stringify((() => {{
                for (const sel of {inputs}) {{
                    const input = document.querySelector(sel);
                    if (!input) continue;
                    input.focus();
                    input.value = {location};
                    input.dispatchEvent(new Event('input', {{ bubbles: true }}));
                    input.dispatchEvent(new KeyboardEvent('keydown', {{ key: 'Enter', bubbles: true }}));
                    return true;
                }}
                return false;
            }})())",
            inputs = js_literal(inputs),
            location = js_literal(location),
        );
        Ok(self.eval(script).await?.as_bool().unwrap_or(false))
    }

    async fn navigate(&mut self, target: &str) -> Result<(), ScraperError> {
        let tab = Arc::clone(&self.tab);
        let url = target.to_string();
        tokio::task::spawn_blocking(move || {
            tab.navigate_to(&url)
                .and_then(|tab| tab.wait_until_navigated())
                .map(|_| ())
        })
        .await
        .map_err(browser_error)?
        .map_err(|e| ScraperError::Navigation {
            target: target.to_string(),
            reason: e.to_string(),
        })
    }

    async fn wait_for(&mut self, selector: &str, timeout: Duration) -> Result<bool, ScraperError> {
        let script = format!(
            "JSON.stringify(document.querySelector({}) !== null)",
            js_literal(selector)
        );
        let started = Instant::now();
        loop {
            if self.eval(script.clone()).await?.as_bool().unwrap_or(false) {
                return Ok(true);
            }
            if started.elapsed() >= timeout {
                return Ok(false);
            }
            tokio::time::sleep(POLL_INTERVAL).await;
        }
    }

    async fn scroll_height(&mut self, containers: &[String]) -> Result<u64, ScraperError> {
        let script = format!(
            r"JSON.stringify((() => {{
                for (const sel of {}) {{
                    const el = document.querySelector(sel);
                    if (el) return el.scrollHeight;
                }}
                return 0;
            }})())",
            js_literal(containers)
        );
        Ok(self.eval(script).await?.as_u64().unwrap_or(0))
    }

    async fn count(&mut self, selector: &str) -> Result<usize, ScraperError> {
        let script = format!(
            "JSON.stringify(document.querySelectorAll({}).length)",
            js_literal(selector)
        );
        let n = self.eval(script).await?.as_u64().unwrap_or(0);
        Ok(usize::try_from(n).unwrap_or(usize::MAX))
    }

    async fn scroll(&mut self, containers: &[String], step: ScrollStep) -> Result<bool, ScraperError> {
        let movement = match step {
            ScrollStep::By(px) => format!("el.scrollBy(0, {px});"),
            ScrollStep::ToEnd => "el.scrollTo(0, el.scrollHeight);".to_string(),
        };
        let script = format!(
            r"JSON.stringify((() => {{
                for (const sel of {}) {{
                    const el = document.querySelector(sel);
                    if (!el) continue;
                    {movement}
                    return true;
                }}
                return false;
            }})())",
            js_literal(containers)
        );
        Ok(self.eval(script).await?.as_bool().unwrap_or(false))
    }

    async fn snapshot_cards(&mut self, selector: &str) -> Result<Vec<CardSnapshot>, ScraperError> {
        let script = format!(
            "JSON.stringify(Array.from(document.querySelectorAll({})).map(el => [el.id || null, el.outerHTML]))",
            js_literal(selector)
        );
        let value = self.eval(script).await?;
        let cards = value
            .as_array()
            .map(|items| {
                items
                    .iter()
                    .filter_map(|item| {
                        let html = item.get(1)?.as_str()?.to_string();
                        let dom_id = item.get(0).and_then(Value::as_str).map(str::to_string);
                        Some(CardSnapshot { dom_id, html })
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(cards)
    }
}

/// Embeds a Rust value in a script as a JSON literal.
fn js_literal(value: impl Into<Value>) -> String {
    value.into().to_string()
}

fn browser_error(err: impl std::fmt::Display) -> ScraperError {
    ScraperError::Browser(err.to_string())
}
