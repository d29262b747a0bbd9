//! Message routing over the registries
//!
//! Pure dispatch: given a decoded message and the current registries, decide
//! targeted send versus room fan-out and invoke delivery. The router never
//! reports anything back to the sender; unknown recipients and unknown rooms
//! are silent no-ops (the remote party observes only silence).

use palaver_common::protocol::Message;

use crate::rooms::RoomRegistry;
use crate::sessions::SessionRegistry;

/// Routes relayed messages and room-creation requests
#[derive(Debug, Clone)]
pub struct Router {
    sessions: SessionRegistry,
    rooms: RoomRegistry,
}

impl Router {
    /// Create a router over the given registries
    pub fn new(sessions: SessionRegistry, rooms: RoomRegistry) -> Self {
        Self { sessions, rooms }
    }

    /// Deliver one routed message (`text`, `image`, or a `file_*` kind)
    ///
    /// `private` targets the single session named by `to_id`; otherwise
    /// `to_id` names a room and the message fans out to every member except
    /// the sender. Messages without routing fields are dropped.
    pub async fn deliver(&self, message: Message) {
        let (from_id, to_id, private) = match message.routing() {
            Some(routing) => (
                routing.from_id.to_string(),
                routing.to_id.to_string(),
                routing.private,
            ),
            None => return,
        };

        if private {
            self.sessions.send_to(&to_id, message).await;
        } else if let Some(members) = self.rooms.members_except(&to_id, &from_id).await {
            for member in members {
                self.sessions.send_to(&member, message.clone()).await;
            }
        }
    }

    /// Create a room and notify the invitees
    ///
    /// The creator becomes a member immediately (its own client added the
    /// room when it issued the request, so only invitees get a `join_room`
    /// notification). Invitees are added to the member set whether or not
    /// they are currently online; offline ones just miss the notification.
    pub async fn create_room(&self, name: &str, creator: &str, invitees: &[String]) {
        self.rooms.create(name, creator).await;

        for invitee in invitees {
            self.rooms.add_member(name, invitee).await;
            let notice = Message::JoinRoom {
                from_id: creator.to_string(),
                content: name.to_string(),
            };
            self.sessions.send_to(invitee, notice).await;
        }
    }
}
