//! Quantity picker paging.
//!
//! The picker shows six consecutive quantities ending at the cursor:
//! cursor 6 shows 1..=6, cursor 12 shows 7..=12, up to cursor 60.

use std::ops::RangeInclusive;

/// Number of quantities shown on one page.
pub const PAGE_SIZE: u32 = 6;

/// Cursor of the first page; also the cursor a fresh picker opens at.
pub const FIRST_CURSOR: u32 = 6;

/// Cursor of the last page.
pub const LAST_CURSOR: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct QuantityWindow {
    pub lower: u32,
    pub upper: u32,
    pub has_prev: bool,
    pub has_next: bool,
}

impl QuantityWindow {
    pub fn options(&self) -> RangeInclusive<u32> {
        self.lower..=self.upper
    }
}

pub fn clamp(cursor: u32) -> u32 {
    cursor.clamp(FIRST_CURSOR, LAST_CURSOR)
}

pub fn window(cursor: u32) -> QuantityWindow {
    let cursor = clamp(cursor);
    QuantityWindow {
        lower: cursor.saturating_sub(PAGE_SIZE - 1).max(1),
        upper: cursor,
        has_prev: cursor > FIRST_CURSOR,
        has_next: cursor < LAST_CURSOR,
    }
}

pub fn next(cursor: u32) -> u32 {
    clamp(cursor.saturating_add(PAGE_SIZE))
}

pub fn prev(cursor: u32) -> u32 {
    clamp(cursor.saturating_sub(PAGE_SIZE))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_page() {
        let w = window(FIRST_CURSOR);
        assert_eq!(w.options(), 1..=6);
        assert!(!w.has_prev);
        assert!(w.has_next);
    }

    #[test]
    fn last_page() {
        let w = window(LAST_CURSOR);
        assert_eq!(w.options(), 55..=60);
        assert!(w.has_prev);
        assert!(!w.has_next);
    }

    #[test]
    fn out_of_range_cursor_is_clamped() {
        assert_eq!(window(0), window(6));
        assert_eq!(window(500), window(60));
    }

    #[test]
    fn flags_follow_cursor_for_every_page() {
        for cursor in FIRST_CURSOR..=LAST_CURSOR {
            let w = window(cursor);
            assert_eq!(w.has_prev, cursor > FIRST_CURSOR);
            assert_eq!(w.has_next, cursor < LAST_CURSOR);
            assert!(w.lower >= 1);
        }
    }

    #[test]
    fn next_then_prev_returns_to_start() {
        for n in 0..=9 {
            let mut cursor = FIRST_CURSOR;
            for _ in 0..n {
                cursor = next(cursor);
            }
            for _ in 0..n {
                cursor = prev(cursor);
            }
            assert_eq!(cursor, FIRST_CURSOR);
        }
    }

    #[test]
    fn paging_stops_at_bounds() {
        assert_eq!(next(LAST_CURSOR), LAST_CURSOR);
        assert_eq!(prev(FIRST_CURSOR), FIRST_CURSOR);
    }
}
