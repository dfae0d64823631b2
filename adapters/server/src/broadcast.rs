//! Delivery seam between rooms and whatever transport carries messages to clients.

use rampart_core::{PlayerId, RoomCode};
use serde::Serialize;
use tokio::sync::mpsc;

use crate::protocol::ServerMessage;

/// Delivers room-scoped and player-scoped messages.
///
/// Implementations must not block; rooms call these from their actor loop.
pub trait Broadcaster: Send + Sync + 'static {
    /// Sends a message to a single player.
    fn send(&self, to: PlayerId, message: ServerMessage);

    /// Sends a message to every member of a room.
    fn broadcast(&self, room: &RoomCode, message: ServerMessage);

    /// Sends a message to every member of a room except one player.
    fn broadcast_except(&self, room: &RoomCode, except: PlayerId, message: ServerMessage);
}

/// Addressee of an outbound message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum Recipient {
    /// A single player.
    Player(PlayerId),
    /// Every member of a room.
    Room(RoomCode),
    /// Every member of a room but one.
    RoomExcept {
        /// Room addressed.
        room: RoomCode,
        /// Member left out.
        except: PlayerId,
    },
}

/// Message paired with its addressee.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outbound {
    /// Addressee.
    pub to: Recipient,
    /// Payload.
    pub message: ServerMessage,
}

/// Broadcaster that forwards everything into an unbounded channel.
#[derive(Clone, Debug)]
pub struct ChannelBroadcaster {
    tx: mpsc::UnboundedSender<Outbound>,
}

impl ChannelBroadcaster {
    /// Creates a broadcaster together with the receiving end of its channel.
    #[must_use]
    pub fn new() -> (Self, mpsc::UnboundedReceiver<Outbound>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (Self { tx }, rx)
    }

    fn push(&self, to: Recipient, message: ServerMessage) {
        // A closed receiver means the transport is gone; nothing left to notify.
        let _ = self.tx.send(Outbound { to, message });
    }
}

impl Broadcaster for ChannelBroadcaster {
    fn send(&self, to: PlayerId, message: ServerMessage) {
        self.push(Recipient::Player(to), message);
    }

    fn broadcast(&self, room: &RoomCode, message: ServerMessage) {
        self.push(Recipient::Room(room.clone()), message);
    }

    fn broadcast_except(&self, room: &RoomCode, except: PlayerId, message: ServerMessage) {
        self.push(
            Recipient::RoomExcept {
                room: room.clone(),
                except,
            },
            message,
        );
    }
}
