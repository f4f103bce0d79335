//! Resize handles on the selection border

use crate::geometry::{DisplayRect, Point};

/// One of the eight drag points of a selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handle {
    N,
    S,
    E,
    W,
    NE,
    NW,
    SE,
    SW,
}

impl Handle {
    /// Hit-test order: corners win over edge midpoints
    pub const ALL: [Handle; 8] = [
        Handle::NW,
        Handle::NE,
        Handle::SE,
        Handle::SW,
        Handle::N,
        Handle::E,
        Handle::S,
        Handle::W,
    ];

    pub fn moves_north(self) -> bool {
        matches!(self, Handle::N | Handle::NE | Handle::NW)
    }

    pub fn moves_south(self) -> bool {
        matches!(self, Handle::S | Handle::SE | Handle::SW)
    }

    pub fn moves_east(self) -> bool {
        matches!(self, Handle::E | Handle::NE | Handle::SE)
    }

    pub fn moves_west(self) -> bool {
        matches!(self, Handle::W | Handle::NW | Handle::SW)
    }

    /// Where the handle sits on `rect`
    pub fn position(self, rect: &DisplayRect) -> Point {
        let x = if self.moves_west() {
            rect.x
        } else if self.moves_east() {
            rect.right()
        } else {
            rect.x + rect.w / 2.0
        };
        let y = if self.moves_north() {
            rect.y
        } else if self.moves_south() {
            rect.bottom()
        } else {
            rect.y + rect.h / 2.0
        };
        Point::new(x, y)
    }

    /// Square hit box of edge `size` centered on the handle
    pub fn hit_box(self, rect: &DisplayRect, size: f32) -> DisplayRect {
        let p = self.position(rect);
        DisplayRect::new(p.x - size / 2.0, p.y - size / 2.0, size, size)
    }

    /// First handle of `rect` whose hit box contains `pos`
    pub fn hit(rect: &DisplayRect, pos: Point, size: f32) -> Option<Handle> {
        Self::ALL
            .into_iter()
            .find(|h| h.hit_box(rect, size).contains(pos))
    }

    /// Resize `start` by the pointer delta, never below `min` on a touched axis
    ///
    /// West and north drags keep the opposite edge fixed. Axes are independent.
    pub fn resize(self, start: &DisplayRect, dx: f32, dy: f32, min: f32) -> DisplayRect {
        let mut out = *start;

        if self.moves_east() {
            out.w = (start.w + dx).max(min);
        }
        if self.moves_south() {
            out.h = (start.h + dy).max(min);
        }
        if self.moves_west() {
            let w = (start.w - dx).max(min);
            out.x = start.x + (start.w - w);
            out.w = w;
        }
        if self.moves_north() {
            let h = (start.h - dy).max(min);
            out.y = start.y + (start.h - h);
            out.h = h;
        }

        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MIN: f32 = 10.0;

    #[test]
    fn nw_keeps_opposite_corner() {
        let s = DisplayRect::new(100.0, 80.0, 200.0, 150.0);
        for (dx, dy) in [(-30.0, -20.0), (40.0, 25.0), (0.0, -60.0), (17.5, 0.0)] {
            let r = Handle::NW.resize(&s, dx, dy, MIN);
            assert_eq!(r.right(), s.right());
            assert_eq!(r.bottom(), s.bottom());
            assert_eq!(r.x, s.x + dx);
            assert_eq!(r.y, s.y + dy);
        }
    }

    #[test]
    fn east_and_south_grow_from_origin() {
        let s = DisplayRect::new(10.0, 10.0, 50.0, 50.0);
        let r = Handle::SE.resize(&s, 15.0, -5.0, MIN);
        assert_eq!(r, DisplayRect::new(10.0, 10.0, 65.0, 45.0));
    }

    #[test]
    fn floor_applies_per_axis() {
        let s = DisplayRect::new(10.0, 10.0, 50.0, 50.0);
        let r = Handle::E.resize(&s, -100.0, 0.0, MIN);
        assert_eq!(r.w, MIN);
        assert_eq!(r.h, 50.0);

        let r = Handle::W.resize(&s, 100.0, 0.0, MIN);
        assert_eq!(r.w, MIN);
        assert_eq!(r.right(), s.right());
    }

    #[test]
    fn edge_handles_leave_other_axis_alone() {
        let s = DisplayRect::new(10.0, 10.0, 50.0, 50.0);
        let r = Handle::N.resize(&s, 99.0, -10.0, MIN);
        assert_eq!(r.x, s.x);
        assert_eq!(r.w, s.w);
        assert_eq!(r.y, 0.0);
        assert_eq!(r.h, 60.0);
    }

    #[test]
    fn corners_take_priority_in_hit_test() {
        let rect = DisplayRect::new(0.0, 0.0, 8.0, 8.0);
        assert_eq!(Handle::hit(&rect, Point::new(0.0, 0.0), 12.0), Some(Handle::NW));
        let big = DisplayRect::new(0.0, 0.0, 100.0, 100.0);
        assert_eq!(Handle::hit(&big, Point::new(50.0, 101.0), 12.0), Some(Handle::S));
        assert_eq!(Handle::hit(&big, Point::new(50.0, 50.0), 12.0), None);
    }
}
