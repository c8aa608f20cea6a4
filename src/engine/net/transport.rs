// Message transport to the authority

use std::collections::VecDeque;

/// Maximum number of messages held by the loopback queue
const MAX_QUEUED_MESSAGES: usize = 256;

/// A message as handed to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: u16,
    pub payload: Vec<u8>,
}

/// Reliable, ordered, fire-and-forget channel from a client to the authority
pub trait Transport {
    fn send_to_authority(&mut self, id: u16, payload: Vec<u8>);
}

/// In-process transport that queues messages until the authority drains them
#[derive(Debug, Default)]
pub struct LoopbackTransport {
    queue: VecDeque<Message>,
}

impl LoopbackTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take every queued message in send order
    pub fn drain(&mut self) -> impl Iterator<Item = Message> + '_ {
        self.queue.drain(..)
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}

impl Transport for LoopbackTransport {
    fn send_to_authority(&mut self, id: u16, payload: Vec<u8>) {
        self.queue.push_back(Message { id, payload });

        // Keep queue size under control
        if self.queue.len() > MAX_QUEUED_MESSAGES {
            self.queue.pop_front();
            log::warn!("Loopback transport full, dropped oldest message");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_drain_in_order() {
        let mut transport = LoopbackTransport::new();
        transport.send_to_authority(1, vec![1]);
        transport.send_to_authority(2, vec![2]);
        assert_eq!(transport.len(), 2);

        let ids: Vec<u16> = transport.drain().map(|m| m.id).collect();
        assert_eq!(ids, vec![1, 2]);
        assert!(transport.is_empty());
    }

    #[test]
    fn test_queue_is_bounded() {
        let mut transport = LoopbackTransport::new();
        for i in 0..MAX_QUEUED_MESSAGES + 10 {
            transport.send_to_authority(0, vec![i as u8]);
        }
        assert_eq!(transport.len(), MAX_QUEUED_MESSAGES);
        assert_eq!(transport.drain().next().map(|m| m.payload), Some(vec![10]));
    }
}
