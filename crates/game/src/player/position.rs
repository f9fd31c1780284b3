use glam::Vec2;

use crate::net::PositionRecord;

pub const POSITION_MIN: f32 = -1.0;
pub const POSITION_MAX: f32 = 1.0;

/// A player's 2-D coordinate. Every public mutation leaves both axes inside
/// `[POSITION_MIN, POSITION_MAX]`.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PlayerPosition(Vec2);

impl PlayerPosition {
    pub fn new(x: f32, y: f32) -> Self {
        let mut position = Self(Vec2::new(x, y));
        position.clamp();
        position
    }

    #[inline]
    pub fn x(&self) -> f32 {
        self.0.x
    }

    #[inline]
    pub fn y(&self) -> f32 {
        self.0.y
    }

    /// Unclamped nudge. Callers clamp once all deltas of a tick are applied.
    pub(crate) fn nudge(&mut self, delta: Vec2) {
        self.0 += delta;
    }

    pub fn clamp(&mut self) {
        self.0 = self
            .0
            .clamp(Vec2::splat(POSITION_MIN), Vec2::splat(POSITION_MAX));
    }

    pub fn is_in_bounds(&self) -> bool {
        (POSITION_MIN..=POSITION_MAX).contains(&self.0.x)
            && (POSITION_MIN..=POSITION_MAX).contains(&self.0.y)
    }

    pub fn to_record(&self) -> PositionRecord {
        PositionRecord::new(self.0.x, self.0.y)
    }

    pub fn from_record(record: &PositionRecord) -> Self {
        Self::new(record.x, record.y)
    }
}
