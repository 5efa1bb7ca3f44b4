//! TCP client of an external named-data forwarder daemon.
//!
//! The forwarder owns interest routing and fan-out; this transport only
//! maintains one connection to it: registered prefixes are announced with
//! [`Frame::RegisterPrefix`], outgoing requests are [`Frame::Interest`]s,
//! and [`Frame::Content`] flows both ways. All inbound traffic is read
//! during [`Transport::poll`], one frame per iteration.

use crate::frame::{read_frame, write_frame, Frame};
use crate::{
    sign_content, InterestHandler, SignedContent, Transport, TransportError, TransportResult,
};
use async_trait::async_trait;
use locator_types::Name;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::sync::oneshot;

/// Transport backed by a TCP connection to a forwarder daemon.
pub struct ForwarderTransport {
    reader: tokio::sync::Mutex<OwnedReadHalf>,
    writer: tokio::sync::Mutex<OwnedWriteHalf>,
    handlers: Mutex<Vec<(Name, Arc<dyn InterestHandler>)>>,
    pending: Mutex<Vec<(Name, oneshot::Sender<SignedContent>)>>,
}

impl ForwarderTransport {
    /// Connect to the forwarder at `addr` (e.g. `127.0.0.1:6363`).
    pub async fn connect(addr: &str) -> TransportResult<Self> {
        let stream = TcpStream::connect(addr)
            .await
            .map_err(|e| TransportError::ConnectionFailed(format!("{addr}: {e}")))?;
        let (reader, writer) = stream.into_split();
        Ok(Self {
            reader: tokio::sync::Mutex::new(reader),
            writer: tokio::sync::Mutex::new(writer),
            handlers: Mutex::new(Vec::new()),
            pending: Mutex::new(Vec::new()),
        })
    }

    async fn send_frame(&self, frame: &Frame) -> TransportResult<()> {
        let mut writer = self.writer.lock().await;
        write_frame(&mut *writer, frame).await
    }

    fn matching_handlers(&self, name: &Name) -> Vec<Arc<dyn InterestHandler>> {
        let handlers = self.handlers.lock().unwrap();
        handlers
            .iter()
            .filter(|(prefix, _)| name.starts_with(prefix))
            .map(|(_, handler)| Arc::clone(handler))
            .collect()
    }

    async fn dispatch(&self, frame: Frame) -> TransportResult<()> {
        match frame {
            Frame::Interest { name } => {
                for handler in self.matching_handlers(&name) {
                    if let Some(response) = handler.handle(&name).await {
                        let content = sign_content(&name, response);
                        self.send_frame(&Frame::Content {
                            name: content.name,
                            payload: content.payload,
                            freshness_secs: content.freshness_secs,
                            signature: content.signature,
                        })
                        .await?;
                        break;
                    }
                }
                Ok(())
            }
            Frame::Content {
                name,
                payload,
                freshness_secs,
                signature,
            } => {
                let sender = {
                    let mut pending = self.pending.lock().unwrap();
                    pending
                        .iter()
                        .position(|(interest, _)| *interest == name)
                        .map(|pos| pending.remove(pos).1)
                };
                match sender {
                    Some(tx) => {
                        let _ = tx.send(SignedContent {
                            name,
                            payload,
                            freshness_secs,
                            signature,
                        });
                    }
                    None => {
                        tracing::debug!(name = %name, "unsolicited content, dropping");
                    }
                }
                Ok(())
            }
            Frame::RegisterPrefix { prefix } => {
                tracing::warn!(prefix = %prefix, "unexpected RegisterPrefix from forwarder");
                Ok(())
            }
        }
    }
}

#[async_trait]
impl Transport for ForwarderTransport {
    async fn register_handler(
        &self,
        prefix: Name,
        handler: Arc<dyn InterestHandler>,
    ) -> TransportResult<()> {
        {
            let mut handlers = self.handlers.lock().unwrap();
            handlers.push((prefix.clone(), handler));
        }
        self.send_frame(&Frame::RegisterPrefix { prefix }).await
    }

    async fn express_interest(&self, name: &Name) -> TransportResult<SignedContent> {
        let (tx, rx) = oneshot::channel();
        {
            let mut pending = self.pending.lock().unwrap();
            pending.push((name.clone(), tx));
        }

        if let Err(e) = self.send_frame(&Frame::Interest { name: name.clone() }).await {
            let mut pending = self.pending.lock().unwrap();
            if let Some(pos) = pending.iter().position(|(interest, _)| interest == name) {
                pending.remove(pos);
            }
            return Err(e);
        }

        rx.await.map_err(|_| TransportError::Closed)
    }

    async fn poll(&self, max_wait: Duration) -> TransportResult<()> {
        let frame = {
            let mut reader = self.reader.lock().await;
            match tokio::time::timeout(max_wait, read_frame(&mut *reader)).await {
                Err(_) => return Ok(()),
                Ok(Err(TransportError::Io(e)))
                    if e.kind() == std::io::ErrorKind::UnexpectedEof =>
                {
                    return Err(TransportError::Closed);
                }
                Ok(result) => result?,
            }
        };
        self.dispatch(frame).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ResponsePayload;
    use tokio::net::TcpListener;

    fn name(uri: &str) -> Name {
        Name::from_uri(uri).unwrap()
    }

    struct FixedAnswer(&'static [u8]);

    #[async_trait]
    impl InterestHandler for FixedAnswer {
        async fn handle(&self, _interest: &Name) -> Option<ResponsePayload> {
            Some(ResponsePayload::with_freshness(self.0.to_vec(), 1))
        }
    }

    #[tokio::test]
    async fn express_interest_round_trips_through_forwarder() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        // Stand-in forwarder: answer the first interest it sees.
        let forwarder = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let frame = read_frame(&mut stream).await.unwrap();
            let Frame::Interest { name } = frame else {
                panic!("expected Interest, got {frame:?}");
            };
            write_frame(
                &mut stream,
                &Frame::Content {
                    name,
                    payload: b"10.0.0.5:9000\n".to_vec(),
                    freshness_secs: Some(1),
                    signature: vec![0; 32],
                },
            )
            .await
            .unwrap();
        });

        let transport = Arc::new(ForwarderTransport::connect(&addr.to_string()).await.unwrap());
        let poller = {
            let transport = Arc::clone(&transport);
            tokio::spawn(async move {
                loop {
                    if transport.poll(Duration::from_millis(10)).await.is_err() {
                        break;
                    }
                }
            })
        };

        let content = transport
            .express_interest(&name("/edu/campus/where/a.txt/n1"))
            .await
            .unwrap();
        assert_eq!(content.payload, b"10.0.0.5:9000\n");

        forwarder.await.unwrap();
        poller.abort();
    }

    #[tokio::test]
    async fn registered_handler_answers_forwarded_interest() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();

        let forwarder = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let frame = read_frame(&mut stream).await.unwrap();
            assert!(matches!(frame, Frame::RegisterPrefix { .. }));

            write_frame(
                &mut stream,
                &Frame::Interest {
                    name: Name::from_uri("/edu/campus/server/n9").unwrap(),
                },
            )
            .await
            .unwrap();

            let reply = read_frame(&mut stream).await.unwrap();
            let Frame::Content { name, payload, .. } = reply else {
                panic!("expected Content, got {reply:?}");
            };
            assert_eq!(name, Name::from_uri("/edu/campus/server/n9").unwrap());
            assert_eq!(payload, b"192.168.1.10:7000");
        });

        let transport = ForwarderTransport::connect(&addr.to_string()).await.unwrap();
        transport
            .register_handler(
                name("/edu/campus/server"),
                Arc::new(FixedAnswer(b"192.168.1.10:7000")),
            )
            .await
            .unwrap();

        // Two poll iterations: one for the interest, one spare.
        for _ in 0..10 {
            if forwarder.is_finished() {
                break;
            }
            let _ = transport.poll(Duration::from_millis(20)).await;
        }
        forwarder.await.unwrap();
    }

    #[tokio::test]
    async fn connect_to_unreachable_forwarder_fails() {
        // Port 1 is essentially never listening.
        let result = ForwarderTransport::connect("127.0.0.1:1").await;
        assert!(matches!(result, Err(TransportError::ConnectionFailed(_))));
    }
}
