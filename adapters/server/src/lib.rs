#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Room server for the Rampart co-op defense game.
//!
//! The [`RoomRegistry`] owns every live room. Each room runs as a single actor
//! task that owns its [`simulation::RoomSimulation`] and its
//! [`scheduler::RoomScheduler`], so all mutations of one room are serialized
//! while separate rooms advance independently. Outgoing messages leave through
//! a [`broadcast::Broadcaster`] supplied by the transport.

pub mod broadcast;
pub mod config;
pub mod protocol;
mod registry;
mod room;
pub mod scheduler;
pub mod simulation;

pub use broadcast::{Broadcaster, ChannelBroadcaster, Outbound, Recipient};
pub use config::{ServerConfig, TimingConfig};
pub use protocol::{ClientIntent, ServerMessage};
pub use registry::RoomRegistry;
