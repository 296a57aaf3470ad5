//! Inter-task communication channels
//!
//! The transport task hands raw payloads to the intake task through a
//! single-slot inbox. While a batch is being rendered the transport waits,
//! so at most one further payload is buffered.

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use heapless::Vec;

/// Largest payload accepted from the broker
pub const MAX_PAYLOAD: usize = 4096;

/// Inbox capacity
const INBOX_SIZE: usize = 1;

/// One raw MQTT message body
pub type Payload = Vec<u8, MAX_PAYLOAD>;

/// Payloads waiting for the intake task (cooperative scheduling)
pub static INBOX: Channel<CriticalSectionRawMutex, Payload, INBOX_SIZE> = Channel::new();
