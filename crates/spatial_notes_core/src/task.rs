//! Non-blocking completion slots for asynchronous loads.
//!
//! # Responsibility
//! - Let the frame tick poll physics setup and model loads without blocking.
//!
//! # Invariants
//! - `poll` never blocks and never panics.
//! - A dropped sender moves the slot to `Abandoned`; it never becomes ready.

use futures::channel::oneshot;
use log::warn;

/// Result of a load that may not have finished yet.
#[derive(Debug)]
pub enum Pending<T> {
    Waiting {
        what: &'static str,
        receiver: oneshot::Receiver<T>,
    },
    Ready(T),
    Abandoned,
}

impl<T> Pending<T> {
    /// Creates a slot and the sender that completes it.
    pub fn channel(what: &'static str) -> (oneshot::Sender<T>, Self) {
        let (sender, receiver) = oneshot::channel();
        (sender, Self::Waiting { what, receiver })
    }

    pub fn ready(value: T) -> Self {
        Self::Ready(value)
    }

    /// Moves a completed value in and returns it, if any.
    pub fn poll(&mut self) -> Option<&mut T> {
        if let Self::Waiting { what, receiver } = self {
            match receiver.try_recv() {
                Ok(Some(value)) => *self = Self::Ready(value),
                Ok(None) => return None,
                Err(oneshot::Canceled) => {
                    warn!("event=load_abandoned module=task status=error what={what}");
                    *self = Self::Abandoned;
                }
            }
        }
        match self {
            Self::Ready(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_waiting(&self) -> bool {
        matches!(self, Self::Waiting { .. })
    }

    /// Returns the value if it is ready, leaving nothing behind.
    pub fn take_ready(&mut self) -> Option<T> {
        self.poll()?;
        match std::mem::replace(self, Self::Abandoned) {
            Self::Ready(value) => Some(value),
            other => {
                *self = other;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::Pending;

    #[test]
    fn poll_is_empty_until_sent() {
        let (sender, mut slot) = Pending::<u32>::channel("test");
        assert!(slot.poll().is_none());
        assert!(slot.is_waiting());

        sender.send(7).unwrap();
        assert_eq!(slot.poll().copied(), Some(7));
        assert_eq!(slot.poll().copied(), Some(7));
    }

    #[test]
    fn dropped_sender_abandons_slot() {
        let (sender, mut slot) = Pending::<u32>::channel("test");
        drop(sender);
        assert!(slot.poll().is_none());
        assert!(matches!(slot, Pending::Abandoned));
    }

    #[test]
    fn take_ready_consumes_value() {
        let mut slot = Pending::ready("model");
        assert_eq!(slot.take_ready(), Some("model"));
        assert_eq!(slot.take_ready(), None);
    }
}
