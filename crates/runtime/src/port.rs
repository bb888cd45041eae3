//! Ordered JSON message ports.
//!
//! A port is the only link between the host and the renderer: messages are
//! serialized to JSON text on `post` and decoded on `recv`, exactly like a
//! WebView `postMessage` bridge. Properties:
//! - Delivery is FIFO per port.
//! - `post` never blocks; the queue is unbounded.
//! - Text that fails to decode is logged and dropped; the receiver keeps going.

use std::marker::PhantomData;

use serde::Serialize;
use serde::de::DeserializeOwned;
use tokio::sync::mpsc;
use tracing::warn;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PortError {
    /// The receiving side has been dropped.
    Closed,
    Encode(String),
}

impl std::fmt::Display for PortError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PortError::Closed => write!(f, "message port closed"),
            PortError::Encode(msg) => write!(f, "failed to encode message: {msg}"),
        }
    }
}

impl std::error::Error for PortError {}

pub struct PortSender<T> {
    name: &'static str,
    tx: mpsc::UnboundedSender<String>,
    _message: PhantomData<fn(T)>,
}

impl<T> Clone for PortSender<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name,
            tx: self.tx.clone(),
            _message: PhantomData,
        }
    }
}

impl<T> std::fmt::Debug for PortSender<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortSender").field("name", &self.name).finish()
    }
}

impl<T: Serialize> PortSender<T> {
    pub fn post(&self, message: &T) -> Result<(), PortError> {
        let text = serde_json::to_string(message).map_err(|e| PortError::Encode(e.to_string()))?;
        self.post_text(text)
    }

    /// Post pre-encoded text; the receiver validates it.
    pub fn post_text(&self, text: impl Into<String>) -> Result<(), PortError> {
        self.tx.send(text.into()).map_err(|_| PortError::Closed)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

pub struct PortReceiver<T> {
    name: &'static str,
    rx: mpsc::UnboundedReceiver<String>,
    dropped: u64,
    _message: PhantomData<fn() -> T>,
}

impl<T> std::fmt::Debug for PortReceiver<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PortReceiver")
            .field("name", &self.name)
            .field("dropped", &self.dropped)
            .finish()
    }
}

impl<T: DeserializeOwned> PortReceiver<T> {
    /// Next decodable message, or `None` once every sender is gone.
    pub async fn recv(&mut self) -> Option<T> {
        loop {
            let text = self.rx.recv().await?;
            if let Some(message) = self.decode(&text) {
                return Some(message);
            }
        }
    }

    /// Non-waiting variant of [`PortReceiver::recv`]; `None` when nothing decodable is queued.
    pub fn try_recv(&mut self) -> Option<T> {
        while let Ok(text) = self.rx.try_recv() {
            if let Some(message) = self.decode(&text) {
                return Some(message);
            }
        }
        None
    }

    /// Count of messages discarded because they did not decode.
    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    fn decode(&mut self, text: &str) -> Option<T> {
        match serde_json::from_str(text) {
            Ok(message) => Some(message),
            Err(e) => {
                self.dropped += 1;
                warn!(port = self.name, "dropping malformed message: {e}");
                None
            }
        }
    }
}

/// Create a named port. The name only appears in logs.
pub fn port<T>(name: &'static str) -> (PortSender<T>, PortReceiver<T>) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        PortSender {
            name,
            tx,
            _message: PhantomData,
        },
        PortReceiver {
            name,
            rx,
            dropped: 0,
            _message: PhantomData,
        },
    )
}

#[cfg(test)]
mod tests {
    use super::{PortError, port};
    use serde::{Deserialize, Serialize};

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(tag = "type", rename_all = "camelCase")]
    enum Msg {
        Show { n: u32 },
        Hide,
    }

    #[tokio::test]
    async fn delivers_in_send_order() {
        let (tx, mut rx) = port::<Msg>("test");
        tx.post(&Msg::Show { n: 1 }).unwrap();
        tx.post(&Msg::Hide).unwrap();
        tx.post(&Msg::Show { n: 2 }).unwrap();
        drop(tx);

        let mut got = Vec::new();
        while let Some(m) = rx.recv().await {
            got.push(m);
        }
        assert_eq!(got, vec![Msg::Show { n: 1 }, Msg::Hide, Msg::Show { n: 2 }]);
    }

    #[tokio::test]
    async fn malformed_text_is_dropped_not_fatal() {
        let (tx, mut rx) = port::<Msg>("test");
        tx.post_text("{not json").unwrap();
        tx.post_text(r#"{"type":"explode"}"#).unwrap();
        tx.post(&Msg::Hide).unwrap();

        assert_eq!(rx.recv().await, Some(Msg::Hide));
        assert_eq!(rx.dropped(), 2);
    }

    #[test]
    fn post_after_receiver_drop_reports_closed() {
        let (tx, rx) = port::<Msg>("test");
        drop(rx);
        assert!(tx.is_closed());
        assert_eq!(tx.post(&Msg::Hide), Err(PortError::Closed));
    }

    #[test]
    fn try_recv_skips_garbage() {
        let (tx, mut rx) = port::<Msg>("test");
        assert_eq!(rx.try_recv(), None);
        tx.post_text("garbage").unwrap();
        tx.post(&Msg::Show { n: 7 }).unwrap();
        assert_eq!(rx.try_recv(), Some(Msg::Show { n: 7 }));
    }
}
