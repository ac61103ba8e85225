use std::{
    env,
    fs::File,
    io::{BufRead, BufReader},
    path::{Path, PathBuf},
    process,
};

use touchkeys::{
    output::{
        KeyboardOutput, OutputLog, RecordingDispatcher, RecordingEditor, RecordingPopup,
        StaticLayout,
    },
    types::KeyCode,
    KeyboardConfig, TouchAction, TouchContext, TouchFrame, TouchStateMachine,
};

const KEY_WIDTH_PX: f32 = 40.0;
const KEY_HEIGHT_PX: f32 = 60.0;
const TRACE_HEADER: &str = "touch,ms,action,index,pointers";

fn main() {
    if let Err(err) = run() {
        eprintln!("error: {err}");
        process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        return Err(usage());
    }

    let mut trace_path: Option<PathBuf> = None;
    let mut expect_path: Option<PathBuf> = None;
    let mut config_path: Option<PathBuf> = None;

    let mut idx = 1usize;
    while idx < args.len() {
        match args[idx].as_str() {
            "--expect" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --expect".into());
                };
                expect_path = Some(PathBuf::from(path));
            }
            "--config" => {
                idx += 1;
                let Some(path) = args.get(idx) else {
                    return Err("missing path after --config".into());
                };
                config_path = Some(PathBuf::from(path));
            }
            "-h" | "--help" => {
                println!("{}", usage());
                return Ok(());
            }
            value if value.starts_with('-') => {
                return Err(format!("unknown argument: {value}"));
            }
            value => {
                if trace_path.is_some() {
                    return Err("multiple trace paths provided".into());
                }
                trace_path = Some(PathBuf::from(value));
            }
        }
        idx += 1;
    }

    let trace_path = trace_path.ok_or_else(usage)?;
    let config = match config_path {
        Some(path) => KeyboardConfig::load(&path).map_err(|e| e.to_string())?,
        None => KeyboardConfig::default(),
    };
    let frames = parse_trace(&trace_path)?;

    let log = OutputLog::new();
    let mut layout = StaticLayout::qwerty(KEY_WIDTH_PX, KEY_HEIGHT_PX);
    let mut dispatcher = RecordingDispatcher::new(log.clone());
    let mut popup = RecordingPopup::new(log.clone());
    let mut editor = RecordingEditor::new(log.clone());
    let mut machine = TouchStateMachine::new(config);

    let mut outputs: Vec<(u64, KeyboardOutput)> = Vec::new();
    {
        let mut context =
            TouchContext::new(&mut layout, &mut dispatcher, &mut popup, &mut editor);
        for frame in &frames {
            machine.handle_frame(frame, &mut context);
            outputs.extend(log.take().into_iter().map(|o| (frame.t_ms, o)));
        }

        // Let timers scheduled by the last frames run out, as a live pipeline would.
        while let Some(deadline_ms) = machine.next_deadline() {
            machine.fire_timers(deadline_ms, &mut context);
            outputs.extend(log.take().into_iter().map(|o| (deadline_ms, o)));
        }
    }

    println!("output,ms,kind,detail");
    for (t_ms, output) in &outputs {
        println!("output,{},{},{}", t_ms, output.kind(), detail(output));
    }

    if let Some(expect_path) = expect_path {
        let expected = parse_expected_kinds(&expect_path)?;
        let actual: Vec<&'static str> = outputs.iter().map(|(_, o)| o.kind()).collect();
        if actual != expected {
            eprintln!("expected kinds: {}", expected.join(","));
            eprintln!("actual kinds:   {}", actual.join(","));
            return Err("output sequence mismatch".into());
        }
    }

    Ok(())
}

fn usage() -> String {
    "usage: touch_replay <trace.csv> [--config keyboard.toml] [--expect expected_kinds.txt]"
        .to_string()
}

fn detail(output: &KeyboardOutput) -> String {
    match output {
        KeyboardOutput::Down(code)
        | KeyboardOutput::Up(code)
        | KeyboardOutput::Cancel(code)
        | KeyboardOutput::UnmatchedRelease(code)
        | KeyboardOutput::PopupShow(code)
        | KeyboardOutput::PopupExtend(code) => code_label(*code),
        KeyboardOutput::DownUp { code, repeat } => format!("{}#{}", code_label(*code), repeat),
        KeyboardOutput::Action(action) => format!("{action:?}"),
        KeyboardOutput::Selection { start, end } => format!("{start}..{end}"),
        KeyboardOutput::SelectWordsLeft(count) | KeyboardOutput::DeselectWordsLeft(count) => {
            count.to_string()
        }
        KeyboardOutput::GlideCompleted { samples } => samples.to_string(),
        KeyboardOutput::PopupHide
        | KeyboardOutput::DeleteBackwards
        | KeyboardOutput::InputMethodPicker
        | KeyboardOutput::GlideCancelled => String::new(),
    }
}

fn code_label(code: KeyCode) -> String {
    match code {
        KeyCode::SPACE => "space".into(),
        KeyCode::DELETE => "delete".into(),
        KeyCode::SHIFT => "shift".into(),
        KeyCode::CAPS_LOCK => "caps_lock".into(),
        KeyCode::ARROW_LEFT => "arrow_left".into(),
        KeyCode::ARROW_RIGHT => "arrow_right".into(),
        KeyCode::LANGUAGE_SWITCH => "language_switch".into(),
        KeyCode(value) => char::from_u32(value as u32)
            .filter(|c| !c.is_control() && value > 0)
            .map(String::from)
            .unwrap_or_else(|| value.to_string()),
    }
}

fn parse_trace(path: &Path) -> Result<Vec<TouchFrame>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut out: Vec<TouchFrame> = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed == TRACE_HEADER {
            continue;
        }

        let parts: Vec<&str> = trimmed.split(',').collect();
        if parts.len() < 5 {
            return Err(format!(
                "{}:{} invalid trace line, expected at least 5 columns",
                path.display(),
                line_no
            ));
        }
        if parts[0].trim() != "touch" {
            continue;
        }

        let ms = parse_u64(parts[1], path, line_no, "ms")?;
        let action = parse_action(parts[2]).ok_or_else(|| {
            format!(
                "{}:{} invalid action '{}'",
                path.display(),
                line_no,
                parts[2].trim()
            )
        })?;
        let index = parse_u64(parts[3], path, line_no, "index")? as usize;

        let mut frame = TouchFrame::new(ms, action, index);
        for raw in &parts[4..] {
            let (id, x, y) = parse_pointer(raw, path, line_no)?;
            frame = frame.with_pointer(id, x, y);
        }
        out.push(frame);
    }

    Ok(out)
}

fn parse_action(raw: &str) -> Option<TouchAction> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "down" => Some(TouchAction::Down),
        "pointer_down" => Some(TouchAction::PointerDown),
        "move" => Some(TouchAction::Move),
        "pointer_up" => Some(TouchAction::PointerUp),
        "up" => Some(TouchAction::Up),
        "cancel" => Some(TouchAction::Cancel),
        _ => None,
    }
}

fn parse_pointer(raw: &str, path: &Path, line_no: usize) -> Result<(u32, f32, f32), String> {
    let fields: Vec<&str> = raw.trim().split(':').collect();
    let [id, x, y] = fields.as_slice() else {
        return Err(format!(
            "{}:{} invalid pointer '{}', expected id:x:y",
            path.display(),
            line_no,
            raw.trim()
        ));
    };
    let id = parse_u64(id, path, line_no, "pointer id")? as u32;
    Ok((
        id,
        parse_f32(x, path, line_no, "x")?,
        parse_f32(y, path, line_no, "y")?,
    ))
}

fn parse_expected_kinds(path: &Path) -> Result<Vec<&'static str>, String> {
    let file = File::open(path).map_err(|e| format!("failed to open {}: {e}", path.display()))?;
    let reader = BufReader::new(file);

    let mut kinds = Vec::new();
    for (line_no, line_result) in reader.lines().enumerate() {
        let line_no = line_no + 1;
        let line = line_result
            .map_err(|e| format!("failed to read {}:{}: {e}", path.display(), line_no))?;
        let token = line.trim();
        if token.is_empty() || token.starts_with('#') {
            continue;
        }

        let normalized = normalize_kind(token).ok_or_else(|| {
            format!(
                "{}:{} invalid expected output kind: {}",
                path.display(),
                line_no,
                token
            )
        })?;
        kinds.push(normalized);
    }

    Ok(kinds)
}

fn normalize_kind(kind: &str) -> Option<&'static str> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "down" => Some("down"),
        "up" => Some("up"),
        "cancel" => Some("cancel"),
        "unmatched_release" => Some("unmatched_release"),
        "down_up" => Some("down_up"),
        "popup_show" => Some("popup_show"),
        "popup_extend" => Some("popup_extend"),
        "popup_hide" => Some("popup_hide"),
        "action" => Some("action"),
        "selection" => Some("selection"),
        "select_words_left" => Some("select_words_left"),
        "deselect_words_left" => Some("deselect_words_left"),
        "delete_backwards" => Some("delete_backwards"),
        "input_method_picker" => Some("input_method_picker"),
        "glide_completed" => Some("glide_completed"),
        "glide_cancelled" => Some("glide_cancelled"),
        _ => None,
    }
}

fn parse_u64(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<u64, String> {
    raw.trim().parse::<u64>().map_err(|e| {
        format!(
            "{}:{} invalid {} '{}': {}",
            path.display(),
            line_no,
            field,
            raw.trim(),
            e
        )
    })
}

fn parse_f32(raw: &str, path: &Path, line_no: usize, field: &str) -> Result<f32, String> {
    raw.trim().parse::<f32>().map_err(|e| {
        format!(
            "{}:{} invalid {} '{}': {}",
            path.display(),
            line_no,
            field,
            raw.trim(),
            e
        )
    })
}
