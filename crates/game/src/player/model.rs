use bitflags::bitflags;
use glam::Vec2;

use super::position::PlayerPosition;
use crate::input::{KeyId, KeyStateTable};
use crate::role::Role;

/// Distance moved per tick while a direction key is held.
pub const MOVE_DELTA: f32 = 0.005;

pub const AUTHORITY_START: (f32, f32) = (-0.05, 0.0);
pub const INITIATOR_START: (f32, f32) = (0.05, 0.0);

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Directions: u8 {
        const UP = 1 << 0;
        const DOWN = 1 << 1;
        const LEFT = 1 << 2;
        const RIGHT = 1 << 3;
    }
}

impl Directions {
    pub fn from_keys(keys: &KeyStateTable) -> Self {
        let mut directions = Directions::empty();
        directions.set(Directions::UP, keys.is_pressed(KeyId::UP));
        directions.set(Directions::DOWN, keys.is_pressed(KeyId::DOWN));
        directions.set(Directions::LEFT, keys.is_pressed(KeyId::LEFT));
        directions.set(Directions::RIGHT, keys.is_pressed(KeyId::RIGHT));
        directions
    }

    /// Per-direction steps for `role`, in application order.
    fn steps(role: Role) -> [(Directions, Vec2); 4] {
        let up = role.up_sign() * MOVE_DELTA;
        [
            (Directions::UP, Vec2::new(0.0, up)),
            (Directions::DOWN, Vec2::new(0.0, -up)),
            (Directions::LEFT, Vec2::new(-MOVE_DELTA, 0.0)),
            (Directions::RIGHT, Vec2::new(MOVE_DELTA, 0.0)),
        ]
    }
}

/// Both players' positions. Both peers run the same update so they agree
/// given the same key tables.
#[derive(Debug, Clone, PartialEq)]
pub struct PositionModel {
    authority: PlayerPosition,
    initiator: PlayerPosition,
}

impl Default for PositionModel {
    fn default() -> Self {
        Self::new(
            PlayerPosition::new(AUTHORITY_START.0, AUTHORITY_START.1),
            PlayerPosition::new(INITIATOR_START.0, INITIATOR_START.1),
        )
    }
}

impl PositionModel {
    pub fn new(authority: PlayerPosition, initiator: PlayerPosition) -> Self {
        Self {
            authority,
            initiator,
        }
    }

    pub fn authority(&self) -> PlayerPosition {
        self.authority
    }

    pub fn initiator(&self) -> PlayerPosition {
        self.initiator
    }

    pub fn position(&self, role: Role) -> PlayerPosition {
        match role {
            Role::Authority => self.authority,
            Role::Initiator => self.initiator,
        }
    }

    pub fn set_position(&mut self, role: Role, position: PlayerPosition) {
        *self.position_mut(role) = position;
    }

    fn position_mut(&mut self, role: Role) -> &mut PlayerPosition {
        match role {
            Role::Authority => &mut self.authority,
            Role::Initiator => &mut self.initiator,
        }
    }

    /// Advances one tick. `local` drives `role`'s player, `remote` drives the
    /// peer's player; both are clamped after all deltas are applied.
    pub fn tick(&mut self, local: &KeyStateTable, remote: &KeyStateTable, role: Role) {
        self.advance(role, Directions::from_keys(local));
        self.advance(role.peer(), Directions::from_keys(remote));

        self.authority.clamp();
        self.initiator.clamp();
    }

    fn advance(&mut self, role: Role, held: Directions) {
        if held.is_empty() {
            return;
        }

        let position = self.position_mut(role);
        for (direction, step) in Directions::steps(role) {
            if held.contains(direction) {
                position.nudge(step);
            }
        }
    }
}
