/// Synchronous client for fetching statistics tables and GeoJSON layers.
///
/// A source reference is either an `http(s)://` URL, fetched with a plain GET,
/// or a local path (optionally written as `file://...`), read from disk.
///
/// ### Notes
/// - Transient failures (5xx / network errors) are retried a few times with a short backoff.
/// - Network timeouts use a sane default (30s) and can be adjusted by editing the client builder.
///
/// Typical usage:
/// ```no_run
/// # use choropleth_rs::api::{Client, StatSource};
/// let client = Client::new()?;
/// let text = client.fetch("https://example.org/stats/cases.json")?;
/// # Ok::<(), anyhow::Error>(())
/// ```
use anyhow::{Context, Result, anyhow, bail};
use reqwest::blocking::Client as HttpClient;
use reqwest::redirect::Policy;
use serde_json::Value;
use std::path::Path;
use std::time::Duration;

/// Anything that can turn a source reference into the raw payload text.
pub trait StatSource {
    fn fetch(&self, source_ref: &str) -> Result<String>;
}

impl<F> StatSource for F
where
    F: Fn(&str) -> Result<String>,
{
    fn fetch(&self, source_ref: &str) -> Result<String> {
        self(source_ref)
    }
}

#[derive(Debug, Clone)]
pub struct Client {
    http: HttpClient,
}

impl Client {
    pub fn new() -> Result<Self> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(30)) // total request timeout
            .connect_timeout(Duration::from_secs(10)) // connect timeout
            .redirect(Policy::limited(5)) // cap redirects
            .user_agent(concat!("choropleth_rs/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("build http client")?;
        Ok(Self { http })
    }

    /// Fetch and decode a JSON document (statistics table or GeoJSON layer).
    pub fn fetch_json(&self, source_ref: &str) -> Result<Value> {
        let text = self.fetch(source_ref)?;
        serde_json::from_str(&text).with_context(|| format!("decode json from {}", source_ref))
    }

    fn get_text(&self, url: &str) -> Result<String> {
        // Small retry for transient failures (5xx / network errors)
        with_retries(
            |_| match self.http.get(url).send() {
                Ok(r) if r.status().is_success() => {
                    r.text().context("read response body").map_err(Attempt::Fatal)
                }
                Ok(r) if r.status().is_server_error() => {
                    log::debug!("GET {} -> HTTP {}", url, r.status());
                    Err(Attempt::Transient(anyhow!("server error: HTTP {}", r.status())))
                }
                Ok(r) => Err(Attempt::Fatal(anyhow!("request failed with HTTP {}", r.status()))),
                Err(e) => {
                    log::debug!("GET {} failed: {}", url, e);
                    Err(Attempt::Transient(anyhow::Error::new(e).context("network error")))
                }
            },
            std::thread::sleep,
        )
    }
}

/// Pauses between attempts; one attempt more than there are pauses.
const BACKOFF_MS: [u64; 2] = [100, 300];

enum Attempt {
    Transient(anyhow::Error),
    Fatal(anyhow::Error),
}

/// Run `attempt` until it succeeds, fails fatally, or the backoff schedule is
/// used up. No pause follows the final attempt.
fn with_retries<T>(
    mut attempt: impl FnMut(usize) -> std::result::Result<T, Attempt>,
    mut pause: impl FnMut(Duration),
) -> Result<T> {
    let mut n = 0;
    loop {
        match attempt(n) {
            Ok(v) => return Ok(v),
            Err(Attempt::Fatal(e)) => return Err(e),
            Err(Attempt::Transient(e)) => match BACKOFF_MS.get(n) {
                Some(ms) => {
                    log::debug!("attempt {} failed: {:#}, retrying in {} ms", n + 1, e, ms);
                    pause(Duration::from_millis(*ms));
                }
                None => return Err(e.context(format!("gave up after {} attempts", n + 1))),
            },
        }
        n += 1;
    }
}

impl StatSource for Client {
    fn fetch(&self, source_ref: &str) -> Result<String> {
        let source_ref = source_ref.trim();
        if source_ref.is_empty() {
            bail!("empty source reference");
        }
        if is_http(source_ref) {
            return self
                .get_text(source_ref)
                .with_context(|| format!("GET {}", source_ref));
        }
        let path = source_ref.strip_prefix("file://").unwrap_or(source_ref);
        read_local(Path::new(path))
    }
}

fn is_http(source_ref: &str) -> bool {
    let lower = source_ref.to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://")
}

fn read_local(path: &Path) -> Result<String> {
    std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}
