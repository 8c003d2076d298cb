//! Blocking HTTP transport running each request on its own thread.

use super::{PersistenceError, PersistenceOutcome, PersistenceRequest, PersistenceResult, Transport};
use serde_json::Value;
use std::fmt;
use std::sync::mpsc::{Receiver, Sender, channel};
use std::thread;
use std::time::Duration;
use url::Url;

const TIMEOUT: Duration = Duration::from_secs(10);

/// REST transport over `ureq`.
pub struct HttpTransport {
    base: Url,
    agent: ureq::Agent,
    outcome_tx: Sender<PersistenceOutcome>,
    outcome_rx: Receiver<PersistenceOutcome>,
}

impl HttpTransport {
    /// Create a transport for the API rooted at `base`.
    pub fn new(mut base: Url) -> Self {
        if !base.path().ends_with('/') {
            let path = format!("{}/", base.path());
            base.set_path(&path);
        }
        let (outcome_tx, outcome_rx) = channel();
        Self {
            base,
            agent: ureq::AgentBuilder::new().timeout(TIMEOUT).build(),
            outcome_tx,
            outcome_rx,
        }
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL of a request.
    pub fn url_for(&self, request: &PersistenceRequest) -> Result<Url, url::ParseError> {
        self.base.join(request.path().trim_start_matches('/'))
    }
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport").field("base", &self.base.as_str()).finish()
    }
}

impl Transport for HttpTransport {
    fn dispatch(&mut self, request: PersistenceRequest) {
        let url = match self.url_for(&request) {
            Ok(url) => url,
            Err(e) => {
                let error = PersistenceError::Transport(format!("Invalid URL: {}", e));
                let _ = self.outcome_tx.send(PersistenceOutcome { request, result: Err(error) });
                return;
            }
        };
        let agent = self.agent.clone();
        let outcome_tx = self.outcome_tx.clone();
        thread::spawn(move || {
            log::debug!("HTTP {} {}", request.method(), url);
            let result = execute(&agent, &request, &url);
            if let Err(e) = &result {
                log::debug!("HTTP {} {} failed: {}", request.method(), url, e);
            }
            // The receiver is gone only when the host was dropped.
            let _ = outcome_tx.send(PersistenceOutcome { request, result });
        });
    }

    fn poll(&mut self) -> Vec<PersistenceOutcome> {
        self.outcome_rx.try_iter().collect()
    }
}

fn execute(agent: &ureq::Agent, request: &PersistenceRequest, url: &Url) -> PersistenceResult<Value> {
    let call = agent
        .request(request.method(), url.as_str())
        .set("Accept", "application/json");
    let response = match &request.body {
        Some(body) => call.send_json(body),
        None => call.call(),
    };
    match response {
        Ok(response) => {
            let text = response
                .into_string()
                .map_err(|e| PersistenceError::Transport(e.to_string()))?;
            if text.trim().is_empty() {
                return Ok(Value::Null);
            }
            serde_json::from_str(&text).map_err(|e| PersistenceError::Decode(e.to_string()))
        }
        Err(ureq::Error::Status(status, response)) => Err(PersistenceError::Http {
            status,
            message: response.into_string().unwrap_or_default(),
        }),
        Err(e) => Err(PersistenceError::Transport(e.to_string())),
    }
}
