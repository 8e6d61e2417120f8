use std::cmp::Ordering;

use crate::envelope::direction::Direction;

/// Binary search over sorted positions, treating `-0.0` and `0.0` as equal.
pub fn binary_search_positions(positions: &[f64], position: f64) -> Result<usize, usize> {
    positions.binary_search_by(|point| {
        if *point < position {
            Ordering::Less
        } else if *point > position {
            Ordering::Greater
        } else {
            Ordering::Equal
        }
    })
}

/// Step lookup over a sorted sequence of positions.
///
/// Implementors expose `n` points, delimiting `n - 1` intervals. Lookups return
/// the interval index containing a position, and `None` when the position lies
/// outside of the first and last points. When a position falls exactly on a
/// point shared by two intervals, `find_left` picks the one before it and
/// `find_right` the one after it.
pub trait SearchableEnvelope {
    fn binary_search_positions(&self, position: f64) -> Result<usize, usize>;

    fn position_points_count(&self) -> usize;

    fn find_left(&self, position: f64) -> Option<usize> {
        let count = self.position_points_count();
        match self.binary_search_positions(position) {
            Ok(0) => Some(0),
            Ok(index) => Some(index - 1),
            Err(insertion) if insertion == 0 || insertion >= count => None,
            Err(insertion) => Some(insertion - 1)
        }
    }

    fn find_right(&self, position: f64) -> Option<usize> {
        let count = self.position_points_count();
        match self.binary_search_positions(position) {
            Ok(index) if index + 1 == count => Some(index - 1),
            Ok(index) => Some(index),
            Err(insertion) if insertion == 0 || insertion >= count => None,
            Err(insertion) => Some(insertion - 1)
        }
    }

    /// Same as `find_left`, with "left" meaning "before along the direction".
    fn find_left_dir(&self, position: f64, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => self.find_left(position),
            Direction::Backward => self.find_right(position)
        }
    }

    fn find_right_dir(&self, position: f64, direction: Direction) -> Option<usize> {
        match direction {
            Direction::Forward => self.find_right(position),
            Direction::Backward => self.find_left(position)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Positions(Vec<f64>);

    impl SearchableEnvelope for Positions {
        fn binary_search_positions(&self, position: f64) -> Result<usize, usize> {
            binary_search_positions(&self.0, position)
        }

        fn position_points_count(&self) -> usize {
            self.0.len()
        }
    }

    #[test]
    fn ties_on_inner_points() {
        let positions = Positions(vec![0.0, 2.0, 5.0]);
        assert_eq!(positions.find_left(2.0), Some(0));
        assert_eq!(positions.find_right(2.0), Some(1));
        assert_eq!(positions.find_left(3.0), Some(1));
        assert_eq!(positions.find_right(3.0), Some(1));
    }

    #[test]
    fn bounds_map_to_the_only_adjacent_interval() {
        let positions = Positions(vec![0.0, 2.0, 5.0]);
        assert_eq!(positions.find_left(0.0), Some(0));
        assert_eq!(positions.find_right(0.0), Some(0));
        assert_eq!(positions.find_left(5.0), Some(1));
        assert_eq!(positions.find_right(5.0), Some(1));
        assert_eq!(positions.find_left(-0.0), Some(0));
    }

    #[test]
    fn outside_positions_are_not_found() {
        let positions = Positions(vec![0.0, 2.0, 5.0]);
        assert_eq!(positions.find_left(-1.0), None);
        assert_eq!(positions.find_right(6.0), None);
    }

    #[test]
    fn backward_lookups_swap_the_tie_break() {
        let positions = Positions(vec![0.0, 2.0, 5.0]);
        assert_eq!(positions.find_left_dir(2.0, Direction::Backward), Some(1));
        assert_eq!(positions.find_right_dir(2.0, Direction::Backward), Some(0));
    }
}
