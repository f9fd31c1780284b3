use std::io;

use crate::net::{Encoding, LinkStats};
use crate::player::PlayerPosition;
use crate::role::Role;

/// Everything a renderer needs for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RenderFrame {
    pub authority: PlayerPosition,
    pub initiator: PlayerPosition,
    pub role: Role,
    pub encoding: Encoding,
    pub tick: u64,
    pub stats: LinkStats,
}

impl RenderFrame {
    pub fn own(&self) -> PlayerPosition {
        self.position(self.role)
    }

    pub fn peer(&self) -> PlayerPosition {
        self.position(self.role.peer())
    }

    pub fn position(&self, role: Role) -> PlayerPosition {
        match role {
            Role::Authority => self.authority,
            Role::Initiator => self.initiator,
        }
    }
}

/// Consumes the position pair once per tick. Implemented by the frontend.
pub trait Renderer {
    fn publish(&mut self, frame: &RenderFrame) -> io::Result<()>;
}
