//! Multi-pointer touch handling: pointer tracking, long-press timers, swipe
//! classification and the state machine tying them to key events.

mod long_press;
mod machine;
mod registry;
mod semantics;
mod swipe;
mod utils;

pub use long_press::{FiredLongPress, LongPressAction, LongPressHandle, LongPressScheduler};
pub use machine::TouchStateMachine;
pub use registry::{PointerPhase, PointerRegistry, TrackedPointer};
pub use swipe::{
    DistanceSwipeDetector, SwipeDirection, SwipeEvent, SwipeGestureDetector, SwipePhase,
};
