use serde::Deserialize;

/// The direction in which an envelope is traversed.
///
/// Envelopes are always stored with increasing positions. Backward traversal only
/// changes which end of a step is its beginning, and how positions compare.
#[derive(Debug, PartialEq, Eq, Clone, Copy, Deserialize)]
pub enum Direction {
    Forward = 1,
    Backward = -1
}

impl Direction {
    pub fn from_delta(delta: f64) -> Direction {
        if delta < 0.0 {
            Direction::Backward
        } else {
            Direction::Forward
        }
    }

    pub fn sign(self) -> f64 {
        match self {
            Direction::Forward => 1.0,
            Direction::Backward => -1.0
        }
    }

    pub fn is_reverse(self) -> bool {
        self == Direction::Backward
    }

    pub fn opposite(self) -> Direction {
        match self {
            Direction::Forward => Direction::Backward,
            Direction::Backward => Direction::Forward
        }
    }

    /// Positive when `a` comes after `b` along the direction.
    pub fn compare_pos(self, a: f64, b: f64) -> f64 {
        (a - b) * self.sign()
    }

    /// The position which comes last along the direction.
    pub fn furthest(self, a: f64, b: f64) -> f64 {
        if self.compare_pos(a, b) >= 0.0 { a } else { b }
    }

    /// The position which comes first along the direction.
    pub fn nearest(self, a: f64, b: f64) -> f64 {
        if self.compare_pos(a, b) <= 0.0 { a } else { b }
    }

    pub fn first_index(self, size: usize) -> usize {
        match self {
            Direction::Forward => 0,
            Direction::Backward => size - 1
        }
    }

    pub fn last_index(self, size: usize) -> usize {
        match self {
            Direction::Forward => size - 1,
            Direction::Backward => 0
        }
    }

    pub fn next_index(self, index: usize, size: usize) -> Option<usize> {
        match self {
            Direction::Forward if index + 1 < size => Some(index + 1),
            Direction::Backward if index > 0 => Some(index - 1),
            _ => None
        }
    }

    /// Picks the value at the beginning of a step stored as `(begin, end)`.
    pub fn step_begin<T>(self, begin: T, end: T) -> T {
        match self {
            Direction::Forward => begin,
            Direction::Backward => end
        }
    }

    pub fn step_end<T>(self, begin: T, end: T) -> T {
        match self {
            Direction::Forward => end,
            Direction::Backward => begin
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_walk_covers_both_ends() {
        assert_eq!(Direction::Forward.first_index(4), 0);
        assert_eq!(Direction::Backward.first_index(4), 3);
        assert_eq!(Direction::Forward.next_index(3, 4), None);
        assert_eq!(Direction::Backward.next_index(0, 4), None);
        assert_eq!(Direction::Backward.next_index(2, 4), Some(1));
    }

    #[test]
    fn comparisons_follow_traversal() {
        assert!(Direction::Forward.compare_pos(2.0, 1.0) > 0.0);
        assert!(Direction::Backward.compare_pos(2.0, 1.0) < 0.0);
        assert_eq!(Direction::Backward.furthest(2.0, 1.0), 1.0);
        assert_eq!(Direction::Backward.step_begin(0.0, 5.0), 5.0);
        assert_eq!(Direction::from_delta(-3.0), Direction::Backward);
    }

    #[test]
    fn deserializes_from_variant_name() {
        let direction: Direction = serde_json::from_str("\"Backward\"").unwrap();
        assert_eq!(direction, Direction::Backward);
    }
}
