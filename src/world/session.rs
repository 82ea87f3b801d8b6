//! The narrow seam between the world core and the connection layer.
//!
//! The core never parses protocol frames. It only pushes text to a client and asks it to
//! hang up when the client is removed from the store.

use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use uuid::Uuid;

pub type ClientId = Uuid;

pub trait Client: fmt::Debug + Send + Sync {
    fn id(&self) -> ClientId;

    fn send(&self, text: &str);

    fn disconnect(&self);
}

pub type ClientRef = Arc<dyn Client>;

/// Loopback client that keeps everything it is sent. Useful for embedding the world
/// without a network layer, and in tests.
#[derive(Debug)]
pub struct BufferedClient {
    id: ClientId,
    outbox: Mutex<Vec<String>>,
    connected: AtomicBool,
}

impl BufferedClient {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            outbox: Mutex::new(Vec::new()),
            connected: AtomicBool::new(true),
        }
    }

    /// Remove and return everything sent so far.
    pub fn drain(&self) -> Vec<String> {
        let mut guard = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        std::mem::take(&mut *guard)
    }

    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Relaxed)
    }
}

impl Default for BufferedClient {
    fn default() -> Self {
        Self::new()
    }
}

impl Client for BufferedClient {
    fn id(&self) -> ClientId {
        self.id
    }

    fn send(&self, text: &str) {
        if !self.is_connected() {
            return;
        }
        let mut guard = self.outbox.lock().unwrap_or_else(|e| e.into_inner());
        guard.push(text.to_string());
    }

    fn disconnect(&self) {
        self.connected.store(false, Ordering::Relaxed);
    }
}
