use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit displacement in world space (y grows downwards).
    pub fn delta(self) -> (f64, f64) {
        match self {
            Direction::Up => (0.0, -1.0),
            Direction::Down => (0.0, 1.0),
            Direction::Left => (-1.0, 0.0),
            Direction::Right => (1.0, 0.0),
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Direction::Up => "up",
            Direction::Down => "down",
            Direction::Left => "left",
            Direction::Right => "right",
        }
    }
}

/// What the keyboard looks like for one frame.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputSnapshot {
    /// Held directions, oldest press first.
    pub held: Vec<Direction>,
    /// Most recently pressed direction that is still held.
    pub last_pressed: Option<Direction>,
}

impl InputSnapshot {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn holding(direction: Direction) -> Self {
        Self {
            held: vec![direction],
            last_pressed: Some(direction),
        }
    }

    pub fn is_held(&self, direction: Direction) -> bool {
        self.held.contains(&direction)
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    /// Direction to move in this frame, if any.
    pub fn direction(&self) -> Option<Direction> {
        match self.last_pressed {
            Some(last) if self.is_held(last) => Some(last),
            _ => self.held.last().copied(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
struct HeldKey {
    direction: Direction,
    seq: u64,
    last_seen_ms: u64,
}

/// Tracks key-down / key-up transitions and produces snapshots.
///
/// Terminals without release reporting only send repeated presses, so keys
/// expire after `hold_ms` without a fresh press until a release is observed.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct InputTracker {
    held: Vec<HeldKey>,
    next_seq: u64,
    saw_release: bool,
}

impl InputTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true when the key was not already held.
    pub fn press(&mut self, direction: Direction, now_ms: u64) -> bool {
        if let Some(key) = self.held.iter_mut().find(|key| key.direction == direction) {
            key.last_seen_ms = now_ms;
            return false;
        }
        self.next_seq += 1;
        self.held.push(HeldKey {
            direction,
            seq: self.next_seq,
            last_seen_ms: now_ms,
        });
        true
    }

    pub fn release(&mut self, direction: Direction) -> bool {
        self.saw_release = true;
        let before = self.held.len();
        self.held.retain(|key| key.direction != direction);
        before != self.held.len()
    }

    /// Drops keys that have not been refreshed within `hold_ms`.
    pub fn expire(&mut self, now_ms: u64, hold_ms: u64) -> bool {
        if self.saw_release {
            return false;
        }
        let before = self.held.len();
        self.held
            .retain(|key| now_ms.saturating_sub(key.last_seen_ms) <= hold_ms);
        before != self.held.len()
    }

    pub fn clear(&mut self) {
        self.held.clear();
    }

    pub fn any_held(&self) -> bool {
        !self.held.is_empty()
    }

    pub fn snapshot(&self) -> InputSnapshot {
        let mut keys = self.held.clone();
        keys.sort_by_key(|key| key.seq);
        InputSnapshot {
            held: keys.iter().map(|key| key.direction).collect(),
            last_pressed: keys.last().map(|key| key.direction),
        }
    }
}
