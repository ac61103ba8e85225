use super::*;
use crate::{config::GlideConfig, ports::Selection};

fn arrow_right_count(outputs: &[KeyboardOutput]) -> usize {
    outputs
        .iter()
        .filter(|output| {
            matches!(
                output,
                KeyboardOutput::DownUp {
                    code: KeyCode::ARROW_RIGHT,
                    ..
                }
            )
        })
        .count()
}

fn glide_config() -> KeyboardConfig {
    KeyboardConfig {
        glide: GlideConfig {
            enabled: true,
            ..GlideConfig::default()
        },
        ..KeyboardConfig::default()
    }
}

#[test]
fn precise_delete_moves_selection_start() {
    let mut rig = Rig::new();
    rig.editor = RecordingEditor::new(rig.log.clone()).with_selection(5, 10);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    // Three whole units to the left.
    rig.feed(moved(40, Point::new(delete.x - 40.0, delete.y)));
    assert_eq!(rig.editor.current_selection(), Some(Selection::new(8, 10)));
    assert_eq!(
        rig.machine.pointer_phase(0),
        Some(PointerPhase::GestureEscalated)
    );
    assert_eq!(rig.machine.next_deadline(), None);

    // Escalated pointers re-evaluate on every sample.
    rig.feed(moved(80, Point::new(delete.x - 64.0, delete.y)));
    assert_eq!(rig.editor.current_selection(), Some(Selection::new(6, 10)));

    rig.feed(up(120, Point::new(delete.x - 64.0, delete.y)));
    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::DELETE),
            KeyboardOutput::Selection { start: 8, end: 10 },
            KeyboardOutput::Cancel(KeyCode::DELETE),
            KeyboardOutput::Selection { start: 6, end: 10 },
            KeyboardOutput::DeleteBackwards,
        ]
    );
}

#[test]
fn precise_delete_clamps_at_text_start() {
    let mut rig = Rig::new();
    rig.editor = RecordingEditor::new(rig.log.clone()).with_selection(2, 2);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    rig.feed(moved(40, Point::new(delete.x - 90.0, delete.y)));
    assert_eq!(rig.editor.current_selection(), Some(Selection::new(0, 2)));
}

#[test]
fn precise_delete_back_to_cursor_deletes_nothing() {
    let mut rig = Rig::new();
    rig.editor = RecordingEditor::new(rig.log.clone()).with_selection(10, 10);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    rig.feed(moved(40, Point::new(delete.x - 30.0, delete.y)));
    rig.feed(moved(80, Point::new(delete.x + 1.0, delete.y)));
    assert_eq!(rig.editor.current_selection(), Some(Selection::new(10, 10)));
    rig.feed(up(120, Point::new(delete.x + 1.0, delete.y)));

    let outputs = rig.log.take();
    assert!(!outputs.contains(&KeyboardOutput::DeleteBackwards));
    assert!(!outputs.contains(&KeyboardOutput::Up(KeyCode::DELETE)));
}

#[test]
fn word_delete_swipe_selects_and_deselects_words() {
    let mut config = KeyboardConfig::default();
    config.gestures.delete_key_swipe_left = DeleteSwipeMode::WordsPrecisely;
    let mut rig = Rig::with_config(config);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    rig.feed(moved(40, Point::new(delete.x - 50.0, delete.y)));
    rig.feed(moved(80, Point::new(delete.x - 20.0, delete.y)));
    rig.feed(up(120, Point::new(delete.x - 20.0, delete.y)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::DELETE),
            KeyboardOutput::SelectWordsLeft(2),
            KeyboardOutput::Cancel(KeyCode::DELETE),
            KeyboardOutput::DeselectWordsLeft(2),
        ]
    );
}

#[test]
fn whole_word_delete_fires_on_fast_release() {
    let mut config = KeyboardConfig::default();
    config.gestures.delete_key_swipe_left = DeleteSwipeMode::WholeWord;
    let mut rig = Rig::with_config(config);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    rig.feed(up(40, Point::new(delete.x - 70.0, delete.y)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::DELETE),
            KeyboardOutput::Action(SwipeAction::DeleteWord),
            KeyboardOutput::Cancel(KeyCode::DELETE),
        ]
    );
}

#[test]
fn space_drag_spends_one_unit_on_deadzone() {
    let mut rig = Rig::new();
    let space = rig.at(KeyCode::SPACE);

    rig.feed(down(0, space));
    rig.feed(moved(50, Point::new(space.x + 36.0, space.y)));
    assert_eq!(arrow_right_count(&rig.log.snapshot()), 2);
    assert_eq!(rig.machine.next_deadline(), None);

    // No deadzone once the drag is a gesture.
    rig.feed(moved(80, Point::new(space.x + 60.0, space.y)));
    rig.feed(up(120, Point::new(space.x + 60.0, space.y)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::SPACE),
            KeyboardOutput::DownUp {
                code: KeyCode::ARROW_RIGHT,
                repeat: 0
            },
            KeyboardOutput::DownUp {
                code: KeyCode::ARROW_RIGHT,
                repeat: 1
            },
            KeyboardOutput::Cancel(KeyCode::SPACE),
            KeyboardOutput::DownUp {
                code: KeyCode::ARROW_RIGHT,
                repeat: 0
            },
            KeyboardOutput::DownUp {
                code: KeyCode::ARROW_RIGHT,
                repeat: 1
            },
        ]
    );
}

#[test]
fn space_drag_never_presses_neighbouring_keys() {
    let mut rig = Rig::new();
    let space = rig.at(KeyCode::SPACE);

    rig.feed(down(0, space));
    rig.feed(moved(40, Point::new(space.x, space.y - 40.0)));
    rig.feed(moved(80, Point::new(space.x, space.y - 80.0)));
    rig.feed(up(400, Point::new(space.x, space.y - 80.0)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::SPACE),
            KeyboardOutput::Cancel(KeyCode::SPACE),
        ]
    );
}

#[test]
fn fast_space_flick_up_runs_configured_action() {
    let mut config = KeyboardConfig::default();
    config.gestures.space_bar_swipe_up = SwipeAction::HideKeyboard;
    let mut rig = Rig::with_config(config);
    let space = rig.at(KeyCode::SPACE);

    rig.feed(down(0, space));
    rig.feed(up(40, Point::new(space.x, space.y - 100.0)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::SPACE),
            KeyboardOutput::Action(SwipeAction::HideKeyboard),
            KeyboardOutput::Cancel(KeyCode::SPACE),
        ]
    );
}

#[test]
fn character_flick_runs_direction_action() {
    let mut rig = Rig::new();
    let h = rig.at(ch('h'));

    rig.feed(down(0, h));
    rig.feed(up(50, Point::new(h.x, h.y - 60.0)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(ch('h')),
            KeyboardOutput::PopupShow(ch('h')),
            KeyboardOutput::Action(SwipeAction::ShiftLock),
            KeyboardOutput::Cancel(ch('h')),
            KeyboardOutput::PopupHide,
        ]
    );
}

#[test]
fn unconfigured_flick_is_an_ordinary_tap() {
    let mut config = KeyboardConfig::default();
    config.gestures.swipe_down = SwipeAction::NoAction;
    let mut rig = Rig::with_config(config);
    let h = rig.at(ch('h'));

    rig.feed(down(0, h));
    rig.feed(up(50, Point::new(h.x, h.y + 60.0)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(ch('h')),
            KeyboardOutput::PopupShow(ch('h')),
            KeyboardOutput::Up(ch('h')),
            KeyboardOutput::PopupHide,
        ]
    );
}

#[test]
fn shift_slid_onto_space_moves_cursor() {
    let mut rig = Rig::new();
    let shift = rig.at(KeyCode::SHIFT);

    rig.feed(down(0, shift));
    rig.feed(moved(40, Point::new(100.0, 200.0)));
    assert!(rig.is_pressed(KeyCode::SPACE));
    rig.feed(moved(80, Point::new(140.0, 200.0)));

    let outputs = rig.log.take();
    assert_eq!(
        &outputs[..3],
        &[
            KeyboardOutput::Down(KeyCode::SHIFT),
            KeyboardOutput::Cancel(KeyCode::SHIFT),
            KeyboardOutput::Down(KeyCode::SPACE),
        ]
    );
    assert_eq!(arrow_right_count(&outputs), 3);
    assert_eq!(outputs.last(), Some(&KeyboardOutput::Cancel(KeyCode::SPACE)));

    // Nothing is left to commit once the drag has cancelled both keys.
    rig.feed(up(120, Point::new(140.0, 200.0)));
    assert!(rig.log.take().is_empty());
    assert!(rig.dispatcher.pressed().is_empty());
}

#[test]
fn shift_released_on_another_key_commits_it() {
    let mut rig = Rig::new();
    let shift = rig.at(KeyCode::SHIFT);
    let z = rig.at(ch('z'));

    rig.feed(down(0, shift));
    rig.feed(moved(40, z));
    rig.feed(up(60, Point::new(z.x + 60.0, z.y)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::SHIFT),
            KeyboardOutput::Cancel(KeyCode::SHIFT),
            KeyboardOutput::Down(ch('z')),
            KeyboardOutput::PopupShow(ch('z')),
            KeyboardOutput::Up(ch('z')),
            KeyboardOutput::PopupHide,
        ]
    );
    assert!(rig.dispatcher.pressed().is_empty());
}

#[test]
fn glide_takes_over_from_discrete_keys() {
    let mut rig = Rig::with_config(glide_config());
    let h = rig.at(ch('h'));

    rig.feed(down(0, h));
    rig.feed(moved(30, Point::new(280.0, 95.0)));
    assert!(rig.machine.glide().is_gliding());
    assert_eq!(rig.machine.pointer_phase(0), Some(PointerPhase::Gliding));
    rig.feed(moved(60, Point::new(330.0, 100.0)));
    rig.feed(up(90, Point::new(360.0, 100.0)));

    assert_eq!(
        rig.log.take(),
        std::vec![
            KeyboardOutput::Down(ch('h')),
            KeyboardOutput::PopupShow(ch('h')),
            KeyboardOutput::Cancel(ch('h')),
            KeyboardOutput::PopupHide,
            KeyboardOutput::GlideCompleted { samples: 4 },
        ]
    );
    assert!(rig.machine.registry().is_empty());
    assert!(!rig.machine.glide().is_gliding());
    assert!(rig.machine.glide_mut().fading_trail(100).is_some());
}

#[test]
fn glide_is_off_outside_character_mode() {
    let mut rig = Rig::with_config(glide_config());
    rig.layout.set_mode(KeyboardMode::Symbols);
    let h = rig.at(ch('h'));

    rig.feed(down(0, h));
    rig.feed(moved(30, Point::new(280.0, 95.0)));
    rig.feed(moved(60, Point::new(330.0, 100.0)));
    rig.feed(up(90, Point::new(360.0, 100.0)));

    let outputs = rig.log.take();
    assert!(!outputs
        .iter()
        .any(|output| matches!(output, KeyboardOutput::GlideCompleted { .. })));
    assert_eq!(outputs[outputs.len() - 2], KeyboardOutput::Up(ch('l')));
}

#[test]
fn delete_key_keeps_its_swipe_with_glide_enabled() {
    let mut rig = Rig::with_config(glide_config());
    rig.editor = RecordingEditor::new(rig.log.clone()).with_selection(10, 10);
    let delete = rig.at(KeyCode::DELETE);

    rig.feed(down(0, delete));
    rig.feed(moved(30, Point::new(delete.x - 40.0, delete.y)));

    assert!(!rig.machine.glide().is_gliding());
    assert_eq!(rig.editor.current_selection(), Some(Selection::new(8, 10)));
}

#[test]
fn cancel_during_glide_reports_it() {
    let mut rig = Rig::with_config(glide_config());
    let h = rig.at(ch('h'));

    rig.feed(down(0, h));
    rig.feed(moved(30, Point::new(280.0, 95.0)));
    rig.feed(frame(50, TouchAction::Cancel, 0, &[(0, Point::new(290.0, 95.0))]));

    let outputs = rig.log.take();
    assert_eq!(outputs.last(), Some(&KeyboardOutput::GlideCancelled));
    assert!(rig.machine.registry().is_empty());
}
