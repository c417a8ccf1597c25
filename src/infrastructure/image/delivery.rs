//! Single-consumer delivery of decoded images back to display targets.
//!
//! Workers post results from any thread; the one context that owns the sinks
//! consumes them and applies each result only if its sink still wants it.

use tokio::sync::mpsc;
use tracing::trace;

use crate::domain::entities::{ContentKey, DecodedImage};
use crate::domain::ports::SinkHandle;

/// A finished result on its way to a sink.
#[derive(Debug)]
pub struct Delivery {
    /// Key the image was decoded for.
    pub key: ContentKey,
    /// The decoded image.
    pub image: DecodedImage,
    sink: SinkHandle,
}

/// What happened to a delivery when it was consumed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryOutcome {
    /// The sink still expected this key and received the image.
    Applied,
    /// The sink has been rebound to other content; the image was discarded.
    Stale,
    /// The sink no longer exists.
    SinkDropped,
}

impl Delivery {
    /// Applies the image if the sink is alive and still bound to this key.
    pub fn apply(self) -> DeliveryOutcome {
        let Some(sink) = self.sink.upgrade() else {
            trace!(key = %self.key, "Sink dropped before delivery");
            return DeliveryOutcome::SinkDropped;
        };

        if sink.current_key().as_ref() != Some(&self.key) {
            trace!(key = %self.key, "Discarding stale delivery");
            return DeliveryOutcome::Stale;
        }

        sink.apply(self.image);
        DeliveryOutcome::Applied
    }
}

/// Producer side, cloned into every worker.
#[derive(Debug, Clone)]
pub struct DeliveryChannel {
    tx: mpsc::UnboundedSender<Delivery>,
}

impl DeliveryChannel {
    /// Queues `image` for `sink`. Returns false if the consumer is gone.
    pub fn post(&self, key: ContentKey, image: DecodedImage, sink: SinkHandle) -> bool {
        let delivery = Delivery { key, image, sink };
        match self.tx.send(delivery) {
            Ok(()) => true,
            Err(mpsc::error::SendError(delivery)) => {
                trace!(key = %delivery.key, "Delivery receiver closed");
                false
            }
        }
    }
}

/// Consumer side, owned by the context that owns the sinks.
#[derive(Debug)]
pub struct DeliveryReceiver {
    rx: mpsc::UnboundedReceiver<Delivery>,
    applied: u64,
    discarded: u64,
}

/// Creates a connected delivery channel.
#[must_use]
pub fn delivery_channel() -> (DeliveryChannel, DeliveryReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (
        DeliveryChannel { tx },
        DeliveryReceiver {
            rx,
            applied: 0,
            discarded: 0,
        },
    )
}

impl DeliveryReceiver {
    /// Waits for the next raw delivery without applying it.
    pub async fn recv(&mut self) -> Option<Delivery> {
        self.rx.recv().await
    }

    /// Waits for the next delivery and applies it.
    ///
    /// Returns `None` once every producer has been dropped.
    pub async fn next_outcome(&mut self) -> Option<DeliveryOutcome> {
        let delivery = self.rx.recv().await?;
        Some(self.consume(delivery))
    }

    /// Applies every delivery already queued without waiting.
    ///
    /// Suited to frame loops that poll once per tick. Returns how many
    /// deliveries were consumed.
    pub fn drain(&mut self) -> usize {
        let mut consumed = 0;
        while let Ok(delivery) = self.rx.try_recv() {
            self.consume(delivery);
            consumed += 1;
        }
        consumed
    }

    /// Applies deliveries until every producer is gone.
    pub async fn run(mut self) {
        while self.next_outcome().await.is_some() {}
    }

    /// Deliveries applied so far.
    #[must_use]
    pub const fn applied(&self) -> u64 {
        self.applied
    }

    /// Deliveries discarded as stale or orphaned so far.
    #[must_use]
    pub const fn discarded(&self) -> u64 {
        self.discarded
    }

    fn consume(&mut self, delivery: Delivery) -> DeliveryOutcome {
        let outcome = delivery.apply();
        match outcome {
            DeliveryOutcome::Applied => self.applied += 1,
            DeliveryOutcome::Stale | DeliveryOutcome::SinkDropped => self.discarded += 1,
        }
        outcome
    }
}
