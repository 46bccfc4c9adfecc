//! Collaboration room context.

use crate::cache::ConnectionId;
use scenesync_codec::RoomKey;

/// The room a client is collaborating in.
///
/// Any part may be missing while the client is not (yet) connected; such a
/// room is inactive and saves against it are skipped.
#[derive(Debug, Clone, Default)]
pub struct Room {
    /// Room id, the scene record's key.
    pub room_id: Option<String>,
    /// Symmetric key shared out of band.
    pub room_key: Option<RoomKey>,
    /// Live transport connection.
    pub connection: Option<ConnectionId>,
}

/// Borrowed parts of an active [`Room`].
#[derive(Debug, Clone, Copy)]
pub struct ActiveRoom<'a> {
    /// Room id.
    pub room_id: &'a str,
    /// Room key.
    pub key: &'a RoomKey,
    /// Connection.
    pub connection: ConnectionId,
}

impl Room {
    /// Creates an active room.
    pub fn new(room_id: impl Into<String>, room_key: RoomKey, connection: ConnectionId) -> Self {
        Self {
            room_id: Some(room_id.into()),
            room_key: Some(room_key),
            connection: Some(connection),
        }
    }

    /// A room with nothing set.
    pub fn detached() -> Self {
        Self::default()
    }

    /// Returns the room parts if id, key and connection are all present.
    pub fn active(&self) -> Option<ActiveRoom<'_>> {
        let room_id = self.room_id.as_deref().filter(|id| !id.is_empty())?;
        Some(ActiveRoom {
            room_id,
            key: self.room_key.as_ref()?,
            connection: self.connection?,
        })
    }

    /// Returns true if the room is active.
    pub fn is_active(&self) -> bool {
        self.active().is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn complete_room_is_active() {
        let room = Room::new("r", RoomKey::generate(), ConnectionId::new());
        let active = room.active().unwrap();
        assert_eq!(active.room_id, "r");
    }

    #[test]
    fn missing_parts_make_room_inactive() {
        assert!(!Room::detached().is_active());

        let mut room = Room::new("r", RoomKey::generate(), ConnectionId::new());
        room.connection = None;
        assert!(!room.is_active());

        let mut room = Room::new("", RoomKey::generate(), ConnectionId::new());
        assert!(!room.is_active());
        room.room_id = Some("r".into());
        room.room_key = None;
        assert!(!room.is_active());
    }
}
