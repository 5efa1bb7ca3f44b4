//! In-process named-data fabric.
//!
//! [`MemoryFabric`] is a hub that any number of [`MemoryTransport`]
//! endpoints attach to. Interests are queued to every endpoint with a
//! matching registered prefix and dispatched when that endpoint polls,
//! so the poll-driven semantics of a real transport are preserved: an
//! endpoint that never polls never answers. Interests expressed before
//! any matching handler exists are parked in the fabric and handed to
//! the first endpoint that registers a covering prefix, so expression
//! order does not race registration order.

use crate::{
    sign_content, InterestHandler, SignedContent, Transport, TransportError, TransportResult,
};
use async_trait::async_trait;
use locator_types::Name;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{oneshot, Notify};

struct EndpointState {
    handlers: Vec<(Name, Arc<dyn InterestHandler>)>,
    queue: VecDeque<(u64, Name)>,
    wakeup: Arc<Notify>,
}

#[derive(Default)]
struct FabricState {
    next_interest_id: u64,
    endpoints: Vec<EndpointState>,
    pending: HashMap<u64, oneshot::Sender<SignedContent>>,
    /// Interests no registered handler matched yet; handed to the first
    /// endpoint that registers a matching prefix.
    unclaimed: Vec<(u64, Name)>,
}

/// An in-process hub connecting [`MemoryTransport`] endpoints.
#[derive(Clone, Default)]
pub struct MemoryFabric {
    state: Arc<Mutex<FabricState>>,
}

impl MemoryFabric {
    /// Create an empty fabric.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach a new endpoint.
    pub fn endpoint(&self) -> MemoryTransport {
        let mut state = self.state.lock().unwrap();
        state.endpoints.push(EndpointState {
            handlers: Vec::new(),
            queue: VecDeque::new(),
            wakeup: Arc::new(Notify::new()),
        });
        MemoryTransport {
            state: Arc::clone(&self.state),
            index: state.endpoints.len() - 1,
        }
    }
}

/// One endpoint attached to a [`MemoryFabric`].
#[derive(Clone)]
pub struct MemoryTransport {
    state: Arc<Mutex<FabricState>>,
    index: usize,
}

impl MemoryTransport {
    fn drain_queue(&self) -> Vec<(u64, Name)> {
        let mut state = self.state.lock().unwrap();
        state.endpoints[self.index].queue.drain(..).collect()
    }

    fn matching_handlers(&self, name: &Name) -> Vec<Arc<dyn InterestHandler>> {
        let state = self.state.lock().unwrap();
        state.endpoints[self.index]
            .handlers
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }
}

#[async_trait]
impl Transport for MemoryTransport {
    async fn register_handler(
        &self,
        prefix: Name,
        handler: Arc<dyn InterestHandler>,
    ) -> TransportResult<()> {
        let mut state = self.state.lock().unwrap();
        state.endpoints[self.index].handlers.push((prefix.clone(), handler));

        // Interests expressed before any matching handler existed are
        // parked; claim the ones this prefix now covers.
        let parked = std::mem::take(&mut state.unclaimed);
        let mut claimed = Vec::new();
        for (id, name) in parked {
            if !state.pending.contains_key(&id) {
                // Requester gave up while the interest was parked.
                continue;
            }
            if name.starts_with(&prefix) {
                claimed.push((id, name));
            } else {
                state.unclaimed.push((id, name));
            }
        }
        if !claimed.is_empty() {
            let endpoint = &mut state.endpoints[self.index];
            endpoint.queue.extend(claimed);
            endpoint.wakeup.notify_one();
        }
        Ok(())
    }

    async fn express_interest(&self, name: &Name) -> TransportResult<SignedContent> {
        let rx = {
            let mut state = self.state.lock().unwrap();
            let id = state.next_interest_id;
            state.next_interest_id += 1;

            let (tx, rx) = oneshot::channel();
            state.pending.insert(id, tx);

            // Deliver to every endpoint serving a matching prefix. An
            // interest nobody serves yet is parked and handed to the
            // first matching handler that registers later.
            let mut delivered = false;
            for endpoint in &mut state.endpoints {
                if endpoint
                    .handlers
                    .iter()
                    .any(|(prefix, _)| name.starts_with(prefix))
                {
                    endpoint.queue.push_back((id, name.clone()));
                    endpoint.wakeup.notify_one();
                    delivered = true;
                }
            }
            if !delivered {
                state.unclaimed.push((id, name.clone()));
            }
            rx
        };

        rx.await.map_err(|_| TransportError::Closed)
    }

    async fn poll(&self, max_wait: Duration) -> TransportResult<()> {
        let wakeup = {
            let state = self.state.lock().unwrap();
            Arc::clone(&state.endpoints[self.index].wakeup)
        };

        let mut batch = self.drain_queue();
        if batch.is_empty() {
            let _ = tokio::time::timeout(max_wait, wakeup.notified()).await;
            batch = self.drain_queue();
        }

        for (id, name) in batch {
            // Handlers run outside the state lock; the first one that
            // answers consumes the interest.
            for handler in self.matching_handlers(&name) {
                if let Some(response) = handler.handle(&name).await {
                    let content = sign_content(&name, response);
                    let sender = {
                        let mut state = self.state.lock().unwrap();
                        state.pending.remove(&id)
                    };
                    if let Some(tx) = sender {
                        let _ = tx.send(content);
                    }
                    break;
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponsePayload;

    struct FixedAnswer(&'static [u8]);

    #[async_trait]
    impl InterestHandler for FixedAnswer {
        async fn handle(&self, _interest: &Name) -> Option<ResponsePayload> {
            Some(ResponsePayload::with_freshness(self.0.to_vec(), 1))
        }
    }

    struct Silent;

    #[async_trait]
    impl InterestHandler for Silent {
        async fn handle(&self, _interest: &Name) -> Option<ResponsePayload> {
            None
        }
    }

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    /// Drive `transport.poll` in the background.
    fn spawn_poller(transport: MemoryTransport) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            loop {
                let _ = transport.poll(Duration::from_millis(10)).await;
            }
        })
    }

    #[tokio::test]
    async fn interest_reaches_registered_handler() {
        let fabric = MemoryFabric::new();
        let responder = fabric.endpoint();
        let consumer = fabric.endpoint();

        responder
            .register_handler(name("/edu/campus/server"), Arc::new(FixedAnswer(b"10.0.0.5:9000")))
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let content = consumer
            .express_interest(&name("/edu/campus/server/nonce1"))
            .await
            .unwrap();
        assert_eq!(content.payload, b"10.0.0.5:9000");
        assert_eq!(content.freshness_secs, Some(1));
        assert_eq!(content.name, name("/edu/campus/server/nonce1"));

        poller.abort();
    }

    #[tokio::test]
    async fn unserved_interest_never_resolves() {
        let fabric = MemoryFabric::new();
        let consumer = fabric.endpoint();

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            consumer.express_interest(&name("/nobody/home/x")),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn silent_handler_sends_no_response() {
        let fabric = MemoryFabric::new();
        let responder = fabric.endpoint();
        let consumer = fabric.endpoint();

        responder
            .register_handler(name("/edu/campus"), Arc::new(Silent))
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            consumer.express_interest(&name("/edu/campus/where/a.txt/n")),
        )
        .await;
        assert!(result.is_err());

        poller.abort();
    }

    #[tokio::test]
    async fn prefix_mismatch_is_not_delivered() {
        let fabric = MemoryFabric::new();
        let responder = fabric.endpoint();
        let consumer = fabric.endpoint();

        responder
            .register_handler(name("/edu/campus/server"), Arc::new(FixedAnswer(b"x")))
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            consumer.express_interest(&name("/edu/other/server/n")),
        )
        .await;
        assert!(result.is_err());

        poller.abort();
    }

    #[tokio::test]
    async fn endpoint_that_does_not_poll_does_not_answer() {
        let fabric = MemoryFabric::new();
        let responder = fabric.endpoint();
        let consumer = fabric.endpoint();

        responder
            .register_handler(name("/edu/campus"), Arc::new(FixedAnswer(b"x")))
            .await
            .unwrap();
        // No poller for the responder.

        let result = tokio::time::timeout(
            Duration::from_millis(50),
            consumer.express_interest(&name("/edu/campus/server/n")),
        )
        .await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn poll_with_nothing_pending_is_bounded() {
        let fabric = MemoryFabric::new();
        let endpoint = fabric.endpoint();

        let started = std::time::Instant::now();
        endpoint.poll(Duration::from_millis(20)).await.unwrap();
        assert!(started.elapsed() < Duration::from_secs(2));
    }

    #[tokio::test]
    async fn concurrent_interests_resolve_independently() {
        let fabric = MemoryFabric::new();
        let responder = fabric.endpoint();
        let consumer = fabric.endpoint();

        responder
            .register_handler(name("/edu/campus"), Arc::new(FixedAnswer(b"answer")))
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let name_a = name("/edu/campus/where/a/n1");
        let name_b = name("/edu/campus/where/b/n2");
        let a = consumer.express_interest(&name_a);
        let b = consumer.express_interest(&name_b);
        let (a, b) = tokio::join!(a, b);

        assert_eq!(a.unwrap().name, name_a);
        assert_eq!(b.unwrap().name, name_b);

        poller.abort();
    }

    #[tokio::test]
    async fn interest_expressed_before_any_handler_still_resolves() {
        let fabric = MemoryFabric::new();
        let consumer = fabric.endpoint();

        // Express into an empty fabric; the interest is parked.
        let in_flight = {
            let consumer = consumer.clone();
            tokio::spawn(async move {
                consumer
                    .express_interest(&name("/edu/campus/server/n1"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // Registration claims the parked interest; polling answers it.
        let responder = fabric.endpoint();
        responder
            .register_handler(
                name("/edu/campus/server"),
                Arc::new(FixedAnswer(b"10.0.0.5:9000")),
            )
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let content = tokio::time::timeout(Duration::from_secs(2), in_flight)
            .await
            .expect("parked interest was never answered")
            .unwrap()
            .unwrap();
        assert_eq!(content.payload, b"10.0.0.5:9000");

        poller.abort();
    }

    #[tokio::test]
    async fn parked_interest_is_not_claimed_by_foreign_prefix() {
        let fabric = MemoryFabric::new();
        let consumer = fabric.endpoint();

        let in_flight = {
            let consumer = consumer.clone();
            tokio::spawn(async move {
                consumer
                    .express_interest(&name("/edu/campus/server/n1"))
                    .await
            })
        };
        tokio::time::sleep(Duration::from_millis(20)).await;

        // A non-matching registration must leave the interest parked.
        let bystander = fabric.endpoint();
        bystander
            .register_handler(name("/com/elsewhere"), Arc::new(FixedAnswer(b"x")))
            .await
            .unwrap();
        let bystander_poller = spawn_poller(bystander);
        tokio::time::sleep(Duration::from_millis(50)).await;
        assert!(!in_flight.is_finished());

        // The matching registration still gets it afterwards.
        let responder = fabric.endpoint();
        responder
            .register_handler(
                name("/edu/campus/server"),
                Arc::new(FixedAnswer(b"10.0.0.5:9000")),
            )
            .await
            .unwrap();
        let poller = spawn_poller(responder);

        let content = tokio::time::timeout(Duration::from_secs(2), in_flight)
            .await
            .expect("parked interest was never answered")
            .unwrap()
            .unwrap();
        assert_eq!(content.payload, b"10.0.0.5:9000");

        bystander_poller.abort();
        poller.abort();
    }
}
