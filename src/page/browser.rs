// SPDX-License-Identifier: PMPL-1.0-or-later
//! Live Chromium pages driven through the DevTools protocol.
//!
//! One browser process is launched per session; each page gets its own tab.
//! The rule engine (axe-core) is injected from a local script file and run
//! after the page has loaded and settled.

use super::{Doctype, ElementInfo, PageHandle, PageSource};
use crate::config::{BrowserConfig as BrowserSettings, EngineConfig};
use crate::error::{PageError, ProbeError};
use crate::finding::EngineOutput;
use async_trait::async_trait;
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const DOCTYPE_SCRIPT: &str = r#"
(() => {
    const d = document.doctype;
    return { doctype: d ? { name: d.name, publicId: d.publicId, systemId: d.systemId } : null };
})()
"#;

const CLIPPED_TEXT_SCRIPT: &str = r#"
(() => {
    const issues = [];
    for (const el of document.querySelectorAll('*')) {
        const tag = el.tagName.toLowerCase();
        if (tag === 'script' || tag === 'style') continue;
        if (el.textContent.trim().length === 0) continue;
        const style = window.getComputedStyle(el);
        const hidden = style.overflow === 'hidden'
            || style.overflowX === 'hidden'
            || style.overflowY === 'hidden';
        if (!hidden) continue;
        const rect = el.getBoundingClientRect();
        if (rect.width < el.scrollWidth || rect.height < el.scrollHeight) {
            issues.push({
                tag,
                html: el.outerHTML,
                text: el.textContent,
                id: el.id || null,
                href: el.getAttribute('href'),
            });
        }
    }
    return issues;
})()
"#;

#[derive(Deserialize)]
struct DoctypeProbe {
    doctype: Option<Doctype>,
}

/// A running headless browser
pub struct BrowserSession {
    browser: Browser,
    _handler: tokio::task::JoinHandle<()>,
    engine_script: Arc<String>,
    engine_options: serde_json::Value,
    navigation_timeout: Duration,
    settle_delay: Duration,
}

impl BrowserSession {
    /// Launch Chromium and load the engine script.
    ///
    /// A missing engine script is reported here, before any page is opened.
    pub async fn launch(settings: &BrowserSettings, engine: &EngineConfig) -> Result<Self, PageError> {
        let engine_script = std::fs::read_to_string(&settings.axe_script).map_err(|source| {
            PageError::EngineScript {
                path: settings.axe_script.clone(),
                source,
            }
        })?;

        let mut builder = BrowserConfig::builder()
            .request_timeout(Duration::from_secs(settings.navigation_timeout_secs));
        if !settings.headless {
            builder = builder.with_head();
        }
        if let Some(ref executable) = settings.chrome_executable {
            builder = builder.chrome_executable(executable);
        }
        let config = builder.build().map_err(PageError::Browser)?;

        info!("Launching browser");
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;

        let handle = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        Ok(Self {
            browser,
            _handler: handle,
            engine_script: Arc::new(engine_script),
            engine_options: engine.run_options(),
            navigation_timeout: Duration::from_secs(settings.navigation_timeout_secs),
            settle_delay: Duration::from_millis(settings.settle_delay_ms),
        })
    }

    /// Open `url` in a new tab and wait until it has loaded and settled
    pub async fn open_page(&self, url: &str) -> Result<BrowserPage, PageError> {
        let navigation_error = |message: String| PageError::Navigation {
            url: url.to_string(),
            message,
        };

        let timed_out = || navigation_error(format!("timed out after {:?}", self.navigation_timeout));
        let deadline = tokio::time::Instant::now() + self.navigation_timeout;

        let page = tokio::time::timeout_at(deadline, self.browser.new_page("about:blank"))
            .await
            .map_err(|_| timed_out())?
            .map_err(|e| navigation_error(e.to_string()))?;

        let loaded = tokio::time::timeout_at(deadline, async {
            page.goto(url).await?;
            page.wait_for_navigation().await?;
            Ok::<_, chromiumoxide::error::CdpError>(())
        })
        .await;
        let loaded = match loaded {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(navigation_error(e.to_string())),
            Err(_) => Err(timed_out()),
        };
        let tab = page.clone();
        close_on_error(loaded, || async move {
            if let Err(e) = tab.close().await {
                warn!("Failed to close tab for {}: {}", url, e);
            }
        })
        .await?;

        if !self.settle_delay.is_zero() {
            tokio::time::sleep(self.settle_delay).await;
        }
        debug!("Page ready: {}", url);

        Ok(BrowserPage {
            id: url.to_string(),
            page,
            engine_script: Arc::clone(&self.engine_script),
            engine_options: self.engine_options.clone(),
        })
    }

    pub async fn close(mut self) -> Result<(), PageError> {
        info!("Closing browser");
        self.browser
            .close()
            .await
            .map_err(|e| PageError::Browser(e.to_string()))?;
        let _ = self.browser.wait().await;
        Ok(())
    }
}

#[async_trait]
impl PageSource for BrowserSession {
    async fn open(&self, page_id: &str) -> Result<Box<dyn PageHandle>, PageError> {
        Ok(Box::new(self.open_page(page_id).await?))
    }
}

/// One loaded browser tab
pub struct BrowserPage {
    id: String,
    page: Page,
    engine_script: Arc<String>,
    engine_options: serde_json::Value,
}

impl BrowserPage {
    async fn eval<T: DeserializeOwned>(&self, script: String) -> Result<T, ProbeError> {
        let result = self
            .page
            .evaluate(script)
            .await
            .map_err(|e| ProbeError::Script(e.to_string()))?;
        Ok(result.into_value()?)
    }
}

/// Run `close` when `result` is an error, then hand `result` back
async fn close_on_error<T, F, Fut>(result: Result<T, PageError>, close: F) -> Result<T, PageError>
where
    F: FnOnce() -> Fut,
    Fut: Future<Output = ()>,
{
    if result.is_err() {
        close().await;
    }
    result
}

/// Quote a Rust string as a JavaScript string literal
fn js_string(value: &str) -> String {
    serde_json::Value::String(value.to_string()).to_string()
}

#[async_trait]
impl PageHandle for BrowserPage {
    fn id(&self) -> &str {
        &self.id
    }

    async fn evaluate(&self) -> Result<EngineOutput, PageError> {
        self.page
            .evaluate(self.engine_script.as_str())
            .await
            .map_err(|e| PageError::Engine(format!("injecting engine: {}", e)))?;

        let run = EvaluateParams::builder()
            .expression(format!(
                "axe.run(document, {})",
                self.engine_options
            ))
            .await_promise(true)
            .return_by_value(true)
            .build()
            .map_err(PageError::Engine)?;

        let result = self
            .page
            .evaluate_expression(run)
            .await
            .map_err(|e| PageError::Engine(e.to_string()))?;
        Ok(result.into_value()?)
    }

    async fn doctype(&self) -> Result<Option<Doctype>, ProbeError> {
        let probe: DoctypeProbe = self.eval(DOCTYPE_SCRIPT.to_string()).await?;
        Ok(probe.doctype)
    }

    async fn select(&self, selector: &str) -> Result<Vec<ElementInfo>, ProbeError> {
        self.eval(format!(
            "Array.from(document.querySelectorAll({})).map(el => ({{ \
                tag: el.tagName.toLowerCase(), html: el.outerHTML, text: el.textContent, \
                id: el.id || null, href: el.getAttribute('href') }}))",
            js_string(selector)
        ))
        .await
    }

    async fn count(&self, selector: &str) -> Result<usize, ProbeError> {
        self.eval(format!(
            "document.querySelectorAll({}).length",
            js_string(selector)
        ))
        .await
    }

    async fn has_element_id(&self, id: &str) -> Result<bool, ProbeError> {
        self.eval(format!(
            "document.getElementById({}) !== null",
            js_string(id)
        ))
        .await
    }

    async fn zoom(&self) -> Result<String, ProbeError> {
        self.eval("document.body.style.zoom".to_string()).await
    }

    async fn set_zoom(&self, zoom: &str) -> Result<(), ProbeError> {
        let _: String = self
            .eval(format!(
                "document.body.style.zoom = {}",
                js_string(zoom)
            ))
            .await?;
        Ok(())
    }

    async fn clipped_text_elements(&self) -> Result<Vec<ElementInfo>, ProbeError> {
        self.eval(CLIPPED_TEXT_SCRIPT.to_string()).await
    }

    async fn close(&self) -> Result<(), PageError> {
        self.page
            .clone()
            .close()
            .await
            .map_err(|e| PageError::Browser(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_js_string_escapes() {
        assert_eq!(js_string("main"), "\"main\"");
        assert_eq!(js_string("a[href^=\"#\"]"), r##""a[href^=\"#\"]""##);
        assert_eq!(js_string("x'</script>"), "\"x'</script>\"");
    }

    #[tokio::test]
    async fn test_failed_navigation_closes_tab() {
        let closed = AtomicUsize::new(0);
        let close = || async {
            closed.fetch_add(1, Ordering::SeqCst);
        };

        let failed: Result<(), PageError> = Err(PageError::Navigation {
            url: "https://example.org/".to_string(),
            message: "timed out after 60s".to_string(),
        });
        assert!(matches!(
            close_on_error(failed, close).await,
            Err(PageError::Navigation { .. })
        ));
        assert_eq!(closed.load(Ordering::SeqCst), 1);

        assert_eq!(close_on_error(Ok(7), close).await.unwrap(), 7);
        assert_eq!(closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_scripts_return_expressions() {
        assert!(DOCTYPE_SCRIPT.trim().starts_with("(() =>"));
        assert!(CLIPPED_TEXT_SCRIPT.contains("overflowX"));
    }
}
