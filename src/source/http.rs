//! reqwest-backed document source.

use std::error::Error as StdError;
use std::io;
use std::time::Duration;

use tracing::debug;

use super::DocumentSource;
use crate::error::FetchError;

pub struct HttpSource {
    client: reqwest::Client,
}

impl HttpSource {
    pub fn new(timeout: Duration, user_agent: &str) -> Result<Self, FetchError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(user_agent)
            .build()
            .map_err(|e| FetchError::Transport {
                address: String::new(),
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait::async_trait]
impl DocumentSource for HttpSource {
    fn name(&self) -> &str {
        "http"
    }

    async fn fetch(&self, address: &str) -> Result<Vec<u8>, FetchError> {
        debug!("HttpSource: GET {}", address);
        let response = self
            .client
            .get(address)
            .send()
            .await
            .map_err(|e| classify(address, &e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                address: address.to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(|e| classify(address, &e))?;
        Ok(body.to_vec())
    }
}

/// Connection-reset-class failures are transient, everything else is not.
fn classify(address: &str, err: &reqwest::Error) -> FetchError {
    if is_connection_reset(err) {
        FetchError::Transient {
            address: address.to_string(),
            message: err.to_string(),
        }
    } else {
        FetchError::Transport {
            address: address.to_string(),
            message: err.to_string(),
        }
    }
}

fn is_connection_reset(err: &(dyn StdError + 'static)) -> bool {
    let mut current: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = current {
        if let Some(io_err) = e.downcast_ref::<io::Error>() {
            if matches!(
                io_err.kind(),
                io::ErrorKind::ConnectionReset
                    | io::ErrorKind::ConnectionAborted
                    | io::ErrorKind::BrokenPipe
            ) {
                return true;
            }
        }
        current = e.source();
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fmt;

    #[derive(Debug)]
    struct Wrapper(io::Error);

    impl fmt::Display for Wrapper {
        fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
            write!(f, "request failed")
        }
    }

    impl StdError for Wrapper {
        fn source(&self) -> Option<&(dyn StdError + 'static)> {
            Some(&self.0)
        }
    }

    #[test]
    fn test_reset_found_in_source_chain() {
        let err = Wrapper(io::Error::new(io::ErrorKind::ConnectionReset, "reset by peer"));
        assert!(is_connection_reset(&err));

        let err = Wrapper(io::Error::new(io::ErrorKind::BrokenPipe, "pipe"));
        assert!(is_connection_reset(&err));
    }

    #[test]
    fn test_other_io_errors_are_not_transient() {
        let err = Wrapper(io::Error::new(io::ErrorKind::NotFound, "dns"));
        assert!(!is_connection_reset(&err));
    }

    #[test]
    fn test_client_builds() {
        assert!(HttpSource::new(Duration::from_secs(5), "mcs-extract/test").is_ok());
    }
}
