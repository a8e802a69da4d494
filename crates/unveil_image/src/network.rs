//! Real fetch backend (requires the "network" feature)
//!
//! Requests are spawned on a small tokio runtime; completions come back over a
//! channel and are drained by [`Stage::pump_backend`](unveil_core::Stage::pump_backend).

use crate::error::Result;
use crate::source::ImageSource;
use std::path::{Path, PathBuf};
use tokio::runtime::Runtime;
use tokio::sync::mpsc::{unbounded_channel, UnboundedReceiver, UnboundedSender};
use unveil_core::{FetchBackend, FetchCompletion, FetchError};

/// Loads URLs with `reqwest` and local paths from disk
pub struct NetworkFetcher {
    runtime: Runtime,
    client: reqwest::Client,
    root: PathBuf,
    tx: UnboundedSender<FetchCompletion>,
    rx: UnboundedReceiver<FetchCompletion>,
}

impl NetworkFetcher {
    /// Create a fetcher that resolves relative paths against `root`
    pub fn new(root: impl Into<PathBuf>) -> Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("unveil-fetch")
            .enable_all()
            .build()?;
        let (tx, rx) = unbounded_channel();

        Ok(Self {
            runtime,
            client: reqwest::Client::new(),
            root: root.into(),
            tx,
            rx,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

async fn fetch_url(client: reqwest::Client, url: String) -> FetchCompletion {
    let response = match client.get(&url).send().await {
        Ok(response) => response,
        Err(e) => {
            let message = e.to_string();
            return FetchCompletion::failure(url.clone(), FetchError::Network { url, message });
        }
    };

    let status = response.status();
    if !status.is_success() {
        return FetchCompletion::failure(
            url.clone(),
            FetchError::Status {
                url,
                status: status.as_u16(),
            },
        );
    }

    match response.bytes().await {
        Ok(_) => FetchCompletion::success(url),
        Err(e) => {
            let message = e.to_string();
            FetchCompletion::failure(url.clone(), FetchError::Network { url, message })
        }
    }
}

async fn fetch_file(url: String, path: PathBuf) -> FetchCompletion {
    match tokio::fs::metadata(&path).await {
        Ok(meta) if meta.is_file() => FetchCompletion::success(url),
        Ok(_) => FetchCompletion::failure(
            url.clone(),
            FetchError::Network {
                url,
                message: format!("{} is not a file", path.display()),
            },
        ),
        Err(e) => {
            let message = format!("{}: {}", path.display(), e);
            FetchCompletion::failure(url.clone(), FetchError::Network { url, message })
        }
    }
}

impl FetchBackend for NetworkFetcher {
    fn request(&mut self, url: &str) {
        let tx = self.tx.clone();
        let url = url.to_string();

        match ImageSource::from_uri(&url) {
            ImageSource::Data(_) => {
                let _ = tx.send(FetchCompletion::success(url));
            }
            ImageSource::Url(_) => {
                let client = self.client.clone();
                self.runtime.spawn(async move {
                    let completion = fetch_url(client, url).await;
                    let _ = tx.send(completion);
                });
            }
            ImageSource::File(path) => {
                let path = if path.is_absolute() {
                    path
                } else {
                    self.root.join(path)
                };
                self.runtime.spawn(async move {
                    let completion = fetch_file(url, path).await;
                    let _ = tx.send(completion);
                });
            }
        }
    }

    fn poll(&mut self) -> Vec<FetchCompletion> {
        let mut arrived = Vec::new();
        while let Ok(completion) = self.rx.try_recv() {
            if let Err(error) = &completion.outcome {
                tracing::debug!(%error, "fetch backend reported failure");
            }
            arrived.push(completion);
        }
        arrived
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn drain(fetcher: &mut NetworkFetcher, expected: usize) -> Vec<FetchCompletion> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut all = Vec::new();
        while all.len() < expected && Instant::now() < deadline {
            all.extend(fetcher.poll());
            std::thread::sleep(Duration::from_millis(5));
        }
        all
    }

    #[test]
    fn test_data_uri_completes_immediately() {
        let mut fetcher = NetworkFetcher::new(".").unwrap();
        fetcher.request(crate::PLACEHOLDER);
        let done = fetcher.poll();
        assert_eq!(done.len(), 1);
        assert!(done[0].outcome.is_ok());
    }

    #[test]
    fn test_local_file_resolution() {
        let root = env!("CARGO_MANIFEST_DIR");
        let mut fetcher = NetworkFetcher::new(root).unwrap();
        fetcher.request("Cargo.toml");
        fetcher.request("missing/nothing.png");

        let done = drain(&mut fetcher, 2);
        assert_eq!(done.len(), 2);
        let ok = done.iter().find(|c| c.url == "Cargo.toml").unwrap();
        assert!(ok.outcome.is_ok());
        let missing = done.iter().find(|c| c.url == "missing/nothing.png").unwrap();
        assert!(missing.outcome.is_err());
    }
}
