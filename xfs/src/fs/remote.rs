//! Remote reads over HTTP(S).

use once_cell::sync::{Lazy, OnceCell};
use regex::Regex;
use reqwest::blocking::Client;
use std::time::Duration;
use tracing::debug;

use crate::error::{FsError, FsResult};

static REMOTE_SCHEME: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^https?://").unwrap());

/// Whether `location` is an `http://` or `https://` URL.
pub fn is_remote(location: &str) -> bool {
    REMOTE_SCHEME.is_match(location)
}

/// Blocking HTTP reader; the client is built on first use.
#[derive(Debug)]
pub struct RemoteReader {
    user_agent: String,
    timeout: Duration,
    client: OnceCell<Client>,
}

impl RemoteReader {
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Self {
        Self {
            user_agent: user_agent.into(),
            timeout,
            client: OnceCell::new(),
        }
    }

    /// Fetch the body of `url`. Non-success statuses are errors.
    pub fn fetch(&self, url: &str) -> FsResult<Vec<u8>> {
        let remote_error = |source| FsError::Remote {
            url: url.to_string(),
            source,
        };

        let client = self.client.get_or_try_init(|| {
            Client::builder()
                .user_agent(self.user_agent.clone())
                .timeout(self.timeout)
                .build()
        });
        let client = client.map_err(remote_error)?;

        debug!(url, "fetching remote file");
        let body = client
            .get(url)
            .send()
            .and_then(|response| response.error_for_status())
            .and_then(|response| response.bytes())
            .map_err(remote_error)?;

        Ok(body.to_vec())
    }
}

impl Clone for RemoteReader {
    fn clone(&self) -> Self {
        Self::new(self.user_agent.clone(), self.timeout)
    }
}
