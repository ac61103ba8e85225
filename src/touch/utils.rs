use super::swipe::SwipeDirection;
use crate::{
    config::KeyTolerance,
    types::{Point, Rect},
};

/// Eight 45-degree sectors, screen coordinates (y grows downwards).
pub(crate) fn classify_direction(dx: f32, dy: f32) -> SwipeDirection {
    let angle = (-dy).atan2(dx).to_degrees();
    let angle = if angle < 0.0 { angle + 360.0 } else { angle };
    match angle {
        a if !(22.5..337.5).contains(&a) => SwipeDirection::Right,
        a if a < 67.5 => SwipeDirection::UpRight,
        a if a < 112.5 => SwipeDirection::Up,
        a if a < 157.5 => SwipeDirection::UpLeft,
        a if a < 202.5 => SwipeDirection::Left,
        a if a < 247.5 => SwipeDirection::DownLeft,
        a if a < 292.5 => SwipeDirection::Down,
        _ => SwipeDirection::DownRight,
    }
}

pub(crate) fn outside_key_tolerance(bounds: &Rect, point: Point, tolerance: &KeyTolerance) -> bool {
    let grown = bounds.expanded(tolerance.horizontal, tolerance.vertical);
    point.x < grown.left || point.x > grown.right || point.y < grown.top || point.y > grown.bottom
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sectors() {
        assert_eq!(classify_direction(10.0, 0.0), SwipeDirection::Right);
        assert_eq!(classify_direction(-10.0, 1.0), SwipeDirection::Left);
        assert_eq!(classify_direction(0.0, -10.0), SwipeDirection::Up);
        assert_eq!(classify_direction(0.0, 10.0), SwipeDirection::Down);
        assert_eq!(classify_direction(10.0, -10.0), SwipeDirection::UpRight);
        assert_eq!(classify_direction(-10.0, 10.0), SwipeDirection::DownLeft);
        assert_eq!(classify_direction(10.0, 1.0), SwipeDirection::Right);
    }

    #[test]
    fn tolerance_is_wider_vertically() {
        let bounds = Rect::new(100.0, 100.0, 200.0, 200.0);
        let tolerance = KeyTolerance::default();

        // 10% of width horizontally.
        assert!(!outside_key_tolerance(&bounds, Point::new(209.0, 150.0), &tolerance));
        assert!(outside_key_tolerance(&bounds, Point::new(211.0, 150.0), &tolerance));
        // 35% of height vertically.
        assert!(!outside_key_tolerance(&bounds, Point::new(150.0, 234.0), &tolerance));
        assert!(outside_key_tolerance(&bounds, Point::new(150.0, 236.0), &tolerance));
        assert!(outside_key_tolerance(&bounds, Point::new(150.0, 64.0), &tolerance));
    }
}
