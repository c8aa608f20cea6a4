// Networking: input snapshot replication from clients to the authority

pub mod transport;
pub mod wire;

pub use transport::{LoopbackTransport, Message, Transport};
pub use wire::{WireError, INPUT_MESSAGE_ID};
