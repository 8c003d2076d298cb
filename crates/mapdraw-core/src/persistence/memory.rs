//! In-memory transport for tests and offline use.

use super::{Operation, PersistenceOutcome, PersistenceRequest, PersistenceResult, Transport};
use serde_json::{Value, json};
use std::fmt;

type Responder = Box<dyn FnMut(&PersistenceRequest) -> PersistenceResult<Value>>;

/// Records every request and answers it synchronously.
///
/// Without a responder every request succeeds with `null`.
#[derive(Default)]
pub struct MemoryTransport {
    sent: Vec<PersistenceRequest>,
    pending: Vec<PersistenceOutcome>,
    responder: Option<Responder>,
}

impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer requests with `responder`.
    pub fn with_responder(
        responder: impl FnMut(&PersistenceRequest) -> PersistenceResult<Value> + 'static,
    ) -> Self {
        Self {
            responder: Some(Box::new(responder)),
            ..Self::default()
        }
    }

    /// Behave like an empty backend: lists are empty and creates return
    /// `{"id": n}` with increasing ids.
    pub fn assigning_ids() -> Self {
        let mut next_id = 0;
        Self::with_responder(move |request| {
            Ok(match request.operation {
                Operation::List => json!([]),
                Operation::Create => {
                    next_id += 1;
                    json!({ "id": next_id })
                }
                Operation::Update | Operation::Delete => Value::Null,
            })
        })
    }

    /// Requests dispatched so far.
    pub fn sent(&self) -> &[PersistenceRequest] {
        &self.sent
    }

    pub fn clear_sent(&mut self) {
        self.sent.clear();
    }
}

impl Transport for MemoryTransport {
    fn dispatch(&mut self, request: PersistenceRequest) {
        let result = match self.responder.as_mut() {
            Some(responder) => responder(&request),
            None => Ok(Value::Null),
        };
        self.sent.push(request.clone());
        self.pending.push(PersistenceOutcome { request, result });
    }

    fn poll(&mut self) -> Vec<PersistenceOutcome> {
        std::mem::take(&mut self.pending)
    }
}

impl fmt::Debug for MemoryTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryTransport")
            .field("sent", &self.sent.len())
            .field("pending", &self.pending.len())
            .finish()
    }
}
