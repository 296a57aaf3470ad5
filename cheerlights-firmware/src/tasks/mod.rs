//! Embassy async tasks
//!
//! Radio and network stack runners, the MQTT transport, and the two ways
//! of feeding the intake: a cooperative consumer fed by the inbox, or a
//! single polling loop that owns both transport and display.

pub mod intake;
pub mod mqtt;
pub mod net;
pub mod poll;

pub use intake::intake_task;
pub use mqtt::mqtt_task;
pub use net::{cyw43_task, join_wifi, net_task};
pub use poll::poll_task;
