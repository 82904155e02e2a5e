use super::{cache::TileKey, source::TileSource};
use crate::{core::config::TileLoadingConfig, Result};
use once_cell::sync::OnceCell;
use reqwest::blocking::Client;
use std::{sync::mpsc::Sender, thread, time::Duration};

/// Blocking HTTP client shared by every download thread.
///
/// Public tile servers reject requests without a User-Agent, so the first
/// download builds the client with the configured one.
static HTTP_CLIENT: OnceCell<Client> = OnceCell::new();

fn http_client(user_agent: &str) -> Result<&'static Client> {
    HTTP_CLIENT.get_or_try_init(|| {
        Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(Into::into)
    })
}

/// Outcome of one tile download; `data` is `None` once every attempt failed
#[derive(Debug, Clone)]
pub struct TilePayload {
    pub key: TileKey,
    pub data: Option<Vec<u8>>,
}

/// Fetches tiles on background threads and reports them over an `mpsc` channel
pub struct TileLoader {
    tx: Sender<TilePayload>,
    config: TileLoadingConfig,
}

impl TileLoader {
    pub fn new(tx: Sender<TilePayload>, config: TileLoadingConfig) -> Self {
        Self { tx, config }
    }

    /// Starts downloading `key` on a detached thread.
    ///
    /// The sender receives exactly one payload per call, with `data: None`
    /// after the last retry fails.
    pub fn start_download(&self, source: &dyn TileSource, key: TileKey) {
        let url = source.url(key.coord);
        let tx = self.tx.clone();
        let attempts = self.config.max_retries + 1;
        let retry_delay = Duration::from_millis(self.config.retry_delay_ms);
        let user_agent = self.config.user_agent.clone();

        thread::spawn(move || {
            for attempt in 1..=attempts {
                log::debug!("fetch tile {:?} attempt {}", key, attempt);
                match fetch(&user_agent, &url) {
                    Ok(data) => {
                        log::debug!("downloaded tile {:?} ({} bytes)", key, data.len());
                        let _ = tx.send(TilePayload {
                            key,
                            data: Some(data),
                        });
                        return;
                    }
                    Err(e) => {
                        log::warn!("tile {:?} download failed on attempt {}: {}", key, attempt, e);
                        if attempt < attempts {
                            thread::sleep(retry_delay);
                        }
                    }
                }
            }

            log::error!("giving up on tile {:?}", key);
            let _ = tx.send(TilePayload { key, data: None });
        });
    }
}

fn fetch(user_agent: &str, url: &str) -> Result<Vec<u8>> {
    let resp = http_client(user_agent)?.get(url).send()?;
    if !resp.status().is_success() {
        return Err(format!("HTTP {}", resp.status()).into());
    }
    Ok(resp.bytes()?.to_vec())
}
