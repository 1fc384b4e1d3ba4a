//! Seat availability statistics derived from a seat map
//!
//! The rows closest to the screen are the highest line numbers in the
//! Ingresso layout; available seats there count as "non-ideal".

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::ops::AddAssign;

use crate::api::models::{SeatMap, SeatStatus};

/// Number of rows nearest the screen treated as non-ideal
pub const FRONT_ROWS: usize = 3;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeatCount {
    pub available: u32,
    pub occupied: u32,
    pub blocked: u32,
    pub total: u32,
    pub non_ideal_available: u32,
    pub ideal_available: u32,
    pub pair_available: u32,
}

impl AddAssign for SeatCount {
    fn add_assign(&mut self, other: Self) {
        self.available += other.available;
        self.occupied += other.occupied;
        self.blocked += other.blocked;
        self.total += other.total;
        self.non_ideal_available += other.non_ideal_available;
        self.ideal_available += other.ideal_available;
        self.pair_available += other.pair_available;
    }
}

/// The `count` highest distinct positive line numbers
pub fn front_lines(seat_map: &SeatMap, count: usize) -> HashSet<i32> {
    let lines: BTreeSet<i32> = seat_map
        .lines
        .iter()
        .flat_map(|line| line.seats.iter())
        .map(|seat| seat.line)
        .filter(|line| *line > 0)
        .collect();

    lines.into_iter().rev().take(count).collect()
}

pub fn score(seat_map: &SeatMap) -> SeatCount {
    score_with_front_rows(seat_map, FRONT_ROWS)
}

pub fn score_with_front_rows(seat_map: &SeatMap, front_rows: usize) -> SeatCount {
    let front = front_lines(seat_map, front_rows);
    let mut result = SeatCount::default();
    let mut available_columns: BTreeMap<i32, Vec<i32>> = BTreeMap::new();

    for seat in seat_map.lines.iter().flat_map(|line| line.seats.iter()) {
        result.total += 1;
        match seat.status() {
            SeatStatus::Available => {
                result.available += 1;
                if front.contains(&seat.line) {
                    result.non_ideal_available += 1;
                }
                if seat.column > 0 {
                    available_columns.entry(seat.line).or_default().push(seat.column);
                }
            }
            SeatStatus::Occupied => result.occupied += 1,
            SeatStatus::Blocked => result.blocked += 1,
            SeatStatus::Unknown => {}
        }
    }

    result.ideal_available = result.available.saturating_sub(result.non_ideal_available);
    result.pair_available = available_columns
        .into_values()
        .map(count_adjacent_pairs)
        .sum();
    result
}

/// Greedy left-to-right count of disjoint pairs of consecutive columns
pub fn count_adjacent_pairs(mut columns: Vec<i32>) -> u32 {
    columns.sort_unstable();
    let mut pairs = 0;
    let mut i = 0;
    while i + 1 < columns.len() {
        if columns[i + 1] == columns[i] + 1 {
            pairs += 1;
            i += 2;
        } else {
            i += 1;
        }
    }
    pairs
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::models::{Seat, SeatLine};

    fn seat(line: i32, column: i32, status: &str) -> Seat {
        Seat {
            line,
            column,
            status: status.to_string(),
            ..Default::default()
        }
    }

    fn seat_map(seats: Vec<Seat>) -> SeatMap {
        let mut lines: BTreeMap<i32, Vec<Seat>> = BTreeMap::new();
        for seat in seats {
            lines.entry(seat.line).or_default().push(seat);
        }
        SeatMap {
            lines: lines
                .into_iter()
                .map(|(line, seats)| SeatLine { line, seats })
                .collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_pairs_are_greedy() {
        assert_eq!(count_adjacent_pairs(vec![1, 2, 4, 5, 6]), 2);
        assert_eq!(count_adjacent_pairs(vec![6, 5, 4, 2, 1]), 2);
        assert_eq!(count_adjacent_pairs(vec![1, 3, 5]), 0);
        assert_eq!(count_adjacent_pairs(vec![]), 0);
    }

    #[test]
    fn test_front_rows_are_highest_lines() {
        let map = seat_map((1..=5).map(|line| seat(line, 1, "available")).collect());
        let front = front_lines(&map, 3);
        assert_eq!(front, HashSet::from([3, 4, 5]));

        let small = seat_map(vec![seat(1, 1, "available")]);
        assert_eq!(front_lines(&small, 3), HashSet::from([1]));
    }

    #[test]
    fn test_score_counts_statuses() {
        let map = seat_map(vec![
            seat(1, 1, "Available"),
            seat(1, 2, "available"),
            seat(1, 3, "occupied"),
            seat(2, 1, "blocked"),
            seat(2, 2, "Unavailable"),
            seat(2, 3, "mystery"),
            seat(5, 1, "available"),
            seat(5, 2, "available"),
        ]);

        let count = score(&map);
        assert_eq!(count.total, 8);
        assert_eq!(count.available, 4);
        assert_eq!(count.occupied, 1);
        assert_eq!(count.blocked, 2);
        // lines 1, 2 and 5 are the three front lines
        assert_eq!(count.non_ideal_available, 4);
        assert_eq!(count.ideal_available, 0);
        assert_eq!(count.pair_available, 2);
    }

    #[test]
    fn test_ideal_seats_are_outside_front_rows() {
        let mut seats: Vec<Seat> = (1..=6).map(|line| seat(line, 1, "available")).collect();
        seats.push(seat(1, 0, "available"));
        let count = score(&seat_map(seats));

        assert_eq!(count.available, 7);
        assert_eq!(count.non_ideal_available, 3);
        assert_eq!(count.ideal_available, 4);
        assert_eq!(count.pair_available, 0);
    }

    #[test]
    fn test_counts_add_up() {
        let mut total = SeatCount {
            available: 2,
            pair_available: 1,
            ..Default::default()
        };
        total += SeatCount {
            available: 3,
            total: 10,
            ..Default::default()
        };
        assert_eq!(total.available, 5);
        assert_eq!(total.total, 10);
        assert_eq!(total.pair_available, 1);
    }
}
