use embassy_futures::block_on;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;

use super::*;
use crate::{
    config::KeyboardConfig,
    output::{
        KeyboardOutput, OutputLog, RecordingDispatcher, RecordingEditor, RecordingPopup,
        StaticLayout,
    },
    types::{KeyCode, TouchAction},
};

struct Collaborators {
    log: OutputLog,
    layout: StaticLayout,
    dispatcher: RecordingDispatcher,
    popup: RecordingPopup,
    editor: RecordingEditor,
}

impl Collaborators {
    fn new() -> Self {
        let log = OutputLog::new();
        Self {
            layout: StaticLayout::qwerty(40.0, 60.0),
            dispatcher: RecordingDispatcher::new(log.clone()),
            popup: RecordingPopup::new(log.clone()),
            editor: RecordingEditor::new(log.clone()),
            log,
        }
    }

    fn context(&mut self) -> TouchContext<'_> {
        TouchContext::new(
            &mut self.layout,
            &mut self.dispatcher,
            &mut self.popup,
            &mut self.editor,
        )
    }
}

fn tap_frames(t_ms: u64) -> [TouchFrame; 2] {
    [
        TouchFrame::new(t_ms, TouchAction::Down, 0).with_pointer(0, 20.0, 90.0),
        TouchFrame::new(t_ms + 40, TouchAction::Up, 0).with_pointer(0, 20.0, 90.0),
    ]
}

#[test]
fn frames_are_handled_in_order() {
    let pipeline: TouchPipeline<CriticalSectionRawMutex> = TouchPipeline::new();
    let mut machine = TouchStateMachine::new(KeyboardConfig::default());
    let mut parts = Collaborators::new();

    for frame in tap_frames(0) {
        assert!(pipeline.push_frame(frame));
    }
    assert_eq!(pipeline.pending(), 2);

    let mut context = parts.context();
    assert_eq!(block_on(pipeline.step(&mut machine, &mut context)), PipelineStep::Frame);
    assert_eq!(block_on(pipeline.step(&mut machine, &mut context)), PipelineStep::Frame);
    drop(context);

    let a = KeyCode::from_char('a');
    assert_eq!(
        parts.log.take(),
        std::vec![
            KeyboardOutput::Down(a),
            KeyboardOutput::PopupShow(a),
            KeyboardOutput::Up(a),
            KeyboardOutput::PopupHide,
        ]
    );
    assert_eq!(pipeline.pending(), 0);
}

#[test]
fn full_queue_drops_newest_input() {
    let pipeline: TouchPipeline<CriticalSectionRawMutex, 2> = TouchPipeline::new();
    let [down, up] = tap_frames(0);

    assert!(pipeline.push_frame(down.clone()));
    assert!(pipeline.push_frame(up));
    assert!(!pipeline.push_frame(down));
    assert_eq!(pipeline.dropped(), 1);
    assert_eq!(pipeline.pending(), 2);
}

#[test]
fn idle_step_waits_for_long_press_deadline() {
    let pipeline: TouchPipeline<CriticalSectionRawMutex> = TouchPipeline::new();
    let mut machine = TouchStateMachine::new(KeyboardConfig::default());
    let mut parts = Collaborators::new();
    let [down, _] = tap_frames(0);

    pipeline.push_frame(down);
    let mut context = parts.context();
    assert_eq!(block_on(pipeline.step(&mut machine, &mut context)), PipelineStep::Frame);
    assert_eq!(machine.next_deadline(), Some(300));

    assert_eq!(
        block_on(pipeline.step(&mut machine, &mut context)),
        PipelineStep::Timers(1)
    );
    assert_eq!(machine.next_deadline(), None);
}

#[test]
fn long_press_fires_when_producer_clock_has_its_own_epoch() {
    let pipeline: TouchPipeline<CriticalSectionRawMutex> = TouchPipeline::new();
    let mut machine = TouchStateMachine::new(KeyboardConfig::default());
    let mut parts = Collaborators::new();
    let uptime_ms = 1_000_000;
    let [down, _] = tap_frames(uptime_ms);

    pipeline.push_frame(down);
    let mut context = parts.context();
    assert_eq!(block_on(pipeline.step(&mut machine, &mut context)), PipelineStep::Frame);
    assert_eq!(machine.next_deadline(), Some(uptime_ms + 300));
    assert!(pipeline.now_ms() >= uptime_ms);

    let started = embassy_time::Instant::now();
    assert_eq!(
        block_on(pipeline.step(&mut machine, &mut context)),
        PipelineStep::Timers(1)
    );
    assert!(started.elapsed() < embassy_time::Duration::from_millis(1_000));
    assert!(pipeline.now_ms() >= uptime_ms + 300);
    drop(context);

    assert_eq!(
        parts.log.take(),
        std::vec![
            KeyboardOutput::Down(KeyCode::from_char('a')),
            KeyboardOutput::PopupShow(KeyCode::from_char('a')),
        ]
    );
}

#[test]
fn reset_discards_queue_and_cancels_pointers() {
    let pipeline: TouchPipeline<CriticalSectionRawMutex> = TouchPipeline::new();
    let mut machine = TouchStateMachine::new(KeyboardConfig::default());
    let mut parts = Collaborators::new();
    let [down, up] = tap_frames(0);

    pipeline.push_frame(down);
    let mut context = parts.context();
    block_on(pipeline.step(&mut machine, &mut context));

    pipeline.push_frame(up);
    pipeline.request_reset();
    assert_eq!(pipeline.pending(), 1);
    assert_eq!(block_on(pipeline.step(&mut machine, &mut context)), PipelineStep::Reset);
    drop(context);

    let a = KeyCode::from_char('a');
    assert_eq!(
        parts.log.take(),
        std::vec![
            KeyboardOutput::Down(a),
            KeyboardOutput::PopupShow(a),
            KeyboardOutput::Cancel(a),
            KeyboardOutput::PopupHide,
        ]
    );
    assert!(machine.registry().is_empty());
}
