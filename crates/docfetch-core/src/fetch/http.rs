//! Single-stream HTTP GET fetcher backed by libcurl.

use std::io::Write;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use url::Url;

use super::error::FetchError;
use super::Fetch;

/// Transfer limits applied to every request.
#[derive(Debug, Clone)]
pub struct CurlOptions {
    pub connect_timeout: Duration,
    /// Total transfer budget; curl gives up with a timeout error after this.
    pub timeout: Duration,
    /// Abort when slower than `low_speed_limit` bytes/s for `low_speed_time`.
    pub low_speed_limit: u32,
    pub low_speed_time: Duration,
    pub max_redirections: u32,
    pub user_agent: Option<String>,
}

impl Default for CurlOptions {
    fn default() -> Self {
        Self {
            connect_timeout: Duration::from_secs(30),
            timeout: Duration::from_secs(300),
            low_speed_limit: 1024,
            low_speed_time: Duration::from_secs(60),
            max_redirections: 10,
            user_agent: None,
        }
    }
}

/// Production [`Fetch`] implementation: one curl Easy handle per call.
#[derive(Debug, Clone, Default)]
pub struct CurlFetcher {
    opts: CurlOptions,
}

impl CurlFetcher {
    pub fn new(opts: CurlOptions) -> Self {
        Self { opts }
    }

    pub fn options(&self) -> &CurlOptions {
        &self.opts
    }

    fn configure(&self, easy: &mut curl::easy::Easy, url: &Url) -> Result<(), curl::Error> {
        easy.url(url.as_str())?;
        easy.follow_location(true)?;
        easy.max_redirections(self.opts.max_redirections)?;
        easy.connect_timeout(self.opts.connect_timeout)?;
        easy.low_speed_limit(self.opts.low_speed_limit)?;
        easy.low_speed_time(self.opts.low_speed_time)?;
        easy.timeout(self.opts.timeout)?;
        if let Some(ua) = &self.opts.user_agent {
            easy.useragent(ua)?;
        }
        // Progress callback is how the abort token is observed while the transfer stalls.
        easy.progress(true)?;
        Ok(())
    }
}

impl Fetch for CurlFetcher {
    fn fetch(&self, url: &Url, sink: &mut dyn Write, abort: &AtomicBool) -> Result<u64, FetchError> {
        let mut easy = curl::easy::Easy::new();
        self.configure(&mut easy, url).map_err(FetchError::Curl)?;

        let mut written = 0u64;
        let mut write_err: Option<std::io::Error> = None;

        let performed = {
            let mut transfer = easy.transfer();
            transfer
                .write_function(|data| {
                    if abort.load(Ordering::Relaxed) {
                        return Ok(0);
                    }
                    match sink.write_all(data) {
                        Ok(()) => {
                            written += data.len() as u64;
                            Ok(data.len())
                        }
                        Err(e) => {
                            tracing::warn!("document write failed: {}", e);
                            write_err = Some(e);
                            Ok(0) // abort transfer
                        }
                    }
                })
                .map_err(FetchError::Curl)?;
            transfer
                .progress_function(|_, _, _, _| !abort.load(Ordering::Relaxed))
                .map_err(FetchError::Curl)?;
            transfer.perform()
        };

        if let Some(e) = write_err {
            return Err(FetchError::Storage(e));
        }
        if abort.load(Ordering::Relaxed) {
            return Err(FetchError::Aborted);
        }
        performed.map_err(FetchError::Curl)?;

        let code = easy.response_code().map_err(FetchError::Curl)?;
        if !(200..300).contains(&code) {
            return Err(FetchError::Http(code));
        }
        Ok(written)
    }
}
