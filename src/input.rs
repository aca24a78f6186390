use crossterm::event::{
    self, Event, KeyCode, KeyEventKind, KeyModifiers, MouseButton, MouseEventKind,
};
use std::time::Duration;

const PROGRESS_STEP: f32 = 5.0;

#[derive(Clone, Debug, PartialEq)]
pub(crate) enum InputEvent {
    Key { key: KeyCode, mods: KeyModifiers },
    Click { row: u16 },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum Action {
    Trigger,
    ToggleRipple,
    NudgeProgress(f32),
    SetProgress(f32),
    ToggleMode,
    ToggleHud,
    Quit,
}

pub(crate) fn collect_input_nonblocking(
    max_frame_time: Duration,
) -> anyhow::Result<Vec<InputEvent>> {
    let mut out = Vec::new();

    // poll with a tiny timeout so we stay responsive
    let timeout = std::cmp::min(Duration::from_millis(1), max_frame_time);
    while event::poll(timeout)? {
        match event::read()? {
            Event::Key(k) if matches!(k.kind, KeyEventKind::Press | KeyEventKind::Repeat) => {
                out.push(InputEvent::Key {
                    key: k.code,
                    mods: k.modifiers,
                });
            }
            Event::Mouse(m) if m.kind == MouseEventKind::Down(MouseButton::Left) => {
                out.push(InputEvent::Click { row: m.row });
            }
            _ => {}
        }
        if out.len() >= 32 {
            break;
        }
    }
    Ok(out)
}

pub(crate) fn map_event_to_action(ev: &InputEvent) -> Option<Action> {
    let (key, mods) = match ev {
        InputEvent::Click { .. } => return Some(Action::Trigger),
        InputEvent::Key { key, mods } => (*key, *mods),
    };

    if key == KeyCode::Char('c') && mods.contains(KeyModifiers::CONTROL) {
        return Some(Action::Quit);
    }
    match key {
        KeyCode::Char(' ') | KeyCode::Enter => Some(Action::Trigger),
        KeyCode::Char('r') | KeyCode::Char('R') => Some(Action::ToggleRipple),
        KeyCode::Up | KeyCode::Char('+') | KeyCode::Char('=') => {
            Some(Action::NudgeProgress(PROGRESS_STEP))
        }
        KeyCode::Down | KeyCode::Char('-') | KeyCode::Char('_') => {
            Some(Action::NudgeProgress(-PROGRESS_STEP))
        }
        KeyCode::Char(d @ '0'..='9') => {
            let tens = d.to_digit(10).unwrap_or(0) as f32;
            Some(Action::SetProgress(tens * 10.0))
        }
        KeyCode::Char('m') | KeyCode::Char('M') => Some(Action::ToggleMode),
        KeyCode::Char('h') | KeyCode::Char('H') => Some(Action::ToggleHud),
        KeyCode::Char('q') | KeyCode::Char('Q') | KeyCode::Esc => Some(Action::Quit),
        _ => None,
    }
}
