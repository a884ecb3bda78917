use super::{FetchError, FetchOutcome, Strategy, DESKTOP_CHROME_UA};
use async_trait::async_trait;
use std::sync::Arc;

/// JavaScript-capable headless fetch strategy (spec.md §4.2). Feature-gated
/// behind `headless` (backed by `chromiumoxide`, the teacher's own headless
/// dependency) so `cargo test` never requires a Chromium binary; `auto`
/// strategy selection silently degrades to http-only when the feature is off.
pub struct BrowserStrategy {
    #[cfg(feature = "headless")]
    inner: chromiumoxide::Browser,
}

impl BrowserStrategy {
    /// Returns `Some` only when the `headless` feature is compiled in AND a
    /// Chromium-family binary could be found and launched; otherwise `None`,
    /// in which case `Fetcher::new` leaves the browser strategy absent.
    pub async fn new_if_available() -> Option<Arc<dyn Strategy>> {
        #[cfg(feature = "headless")]
        {
            match Self::launch().await {
                Ok(s) => Some(Arc::new(s) as Arc<dyn Strategy>),
                Err(e) => {
                    tracing::warn!("headless browser unavailable: {e}");
                    None
                }
            }
        }
        #[cfg(not(feature = "headless"))]
        {
            None
        }
    }

    /// Chromium-family executable discovery, grounded in the teacher's
    /// `browser_manager::find_chrome_executable`: `CHROME_EXECUTABLE` env var,
    /// then a PATH scan for the usual package-manager install names.
    #[cfg(feature = "headless")]
    fn find_chrome_executable() -> Option<String> {
        if let Ok(p) = std::env::var("CHROME_EXECUTABLE") {
            if std::path::Path::new(&p).exists() {
                return Some(p);
            }
        }
        if let Ok(path_var) = std::env::var("PATH") {
            let candidates = ["brave-browser", "brave", "google-chrome", "chromium", "chromium-browser", "chrome"];
            for dir in std::env::split_paths(&path_var) {
                for exe in candidates {
                    let full = dir.join(exe);
                    if full.exists() {
                        return Some(full.to_string_lossy().to_string());
                    }
                }
            }
        }
        None
    }

    #[cfg(feature = "headless")]
    async fn launch() -> anyhow::Result<Self> {
        use chromiumoxide::browser::{Browser, BrowserConfig};
        use futures::StreamExt;

        let exe = Self::find_chrome_executable()
            .ok_or_else(|| anyhow::anyhow!("no Chromium-family browser found (set CHROME_EXECUTABLE)"))?;

        let config = BrowserConfig::builder()
            .chrome_executable(&exe)
            .arg("--disable-gpu")
            .arg("--no-sandbox")
            .arg("--disable-setuid-sandbox")
            .arg("--disable-dev-shm-usage")
            .arg("--no-first-run")
            .arg("--mute-audio")
            .build()
            .map_err(|e| anyhow::anyhow!("failed to build browser config: {e}"))?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| anyhow::anyhow!("failed to launch browser ({exe}): {e}"))?;

        tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    tracing::error!("CDP handler error: {e}");
                }
            }
        });

        Ok(Self { inner: browser })
    }
}

#[async_trait]
impl Strategy for BrowserStrategy {
    fn name(&self) -> &'static str {
        "browser"
    }

    #[cfg(feature = "headless")]
    async fn fetch_once(&self, url: &str, timeout_ms: u64) -> Result<FetchOutcome, FetchError> {
        use chromiumoxide::cdp::browser_protocol::page::NavigateParams;
        use std::time::Duration;

        let page = self
            .inner
            .new_page("about:blank")
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        page.set_user_agent(DESKTOP_CHROME_UA)
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let nav = NavigateParams::builder()
            .url(url)
            .build()
            .map_err(FetchError::Request)?;

        let navigation = page.goto(nav);
        let navigation = tokio::time::timeout(Duration::from_millis(timeout_ms), navigation)
            .await
            .map_err(|_| FetchError::Request("navigation timed out".into()))?
            .map_err(|e| FetchError::Request(e.to_string()))?;

        tokio::time::timeout(Duration::from_secs(5), navigation.wait_for_navigation())
            .await
            .ok();

        let final_url = page.url().await.ok().flatten().unwrap_or_else(|| url.to_string());
        let html = page
            .content()
            .await
            .map_err(|e| FetchError::Request(e.to_string()))?;

        let _ = page.close().await;
        Ok(FetchOutcome { html, final_url, status: 200 })
    }

    #[cfg(not(feature = "headless"))]
    async fn fetch_once(&self, _url: &str, _timeout_ms: u64) -> Result<FetchOutcome, FetchError> {
        Err(FetchError::Unavailable("headless feature not compiled in".into()))
    }
}
