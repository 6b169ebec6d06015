use indoc::indoc;
use ratatui::Frame;
use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Clear, Paragraph};

use super::SimState;
use crate::payload::OverlayPayload;
use crate::window::{Dimension, WindowParams};

pub const PANEL_HEIGHT: u16 = 11;

const CLOSE_LABEL: &str = "[x]";

pub const HELP_TEXT: &str = indoc! {"
    r  incoming call    a  answer
    d  dial out         i  hang up
    l  lookup result    s  show with data
    b  boot pre-warm    +/- height
    p  toggle overlay permission
    x  remove overlay externally
    q  quit     drag the top rows to move
"};

/// Splits the terminal into the simulated screen and the bottom panel.
pub fn split(area: Rect) -> (Rect, Rect) {
    let [screen, panel] =
        Layout::vertical([Constraint::Min(3), Constraint::Length(PANEL_HEIGHT)]).areas(area);
    (screen, panel)
}

fn clamp_u16(value: u32) -> u16 {
    value.min(u16::MAX as u32) as u16
}

pub fn overlay_width(params: &WindowParams, screen_width: u32) -> u16 {
    let screen = clamp_u16(screen_width);
    match params.width {
        Dimension::Pixels(width) => clamp_u16(width).min(screen),
        Dimension::MatchParent | Dimension::WrapContent => screen,
    }
}

fn content_lines(payload: Option<&OverlayPayload>) -> Vec<Line<'static>> {
    let Some(payload) = payload else {
        return vec![Line::from("waiting for data")];
    };
    let status = payload.status().unwrap_or("-").to_string();
    let number = payload.number().unwrap_or("-").to_string();
    let identity = match (payload.name(), payload.is_personal()) {
        (Some(name), Some(true)) => format!("{name} (personal)"),
        (Some(name), _) => name.to_string(),
        (None, _) => "looking up caller...".to_string(),
    };
    vec![
        Line::from(Span::styled(
            status,
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(number),
        Line::from(identity),
    ]
}

fn overlay_height(params: &WindowParams, payload: Option<&OverlayPayload>) -> u16 {
    match params.height {
        Dimension::Pixels(height) => clamp_u16(height),
        Dimension::WrapContent | Dimension::MatchParent => {
            content_lines(payload).len() as u16 + 2
        }
    }
}

/// Where the on-screen surface is drawn, clamped to `screen`.
pub fn overlay_rect(state: &SimState, screen: Rect) -> Option<Rect> {
    let view = state.overlay?;
    let width = overlay_width(&view.params, screen.width as u32).max(1);
    let height = overlay_height(&view.params, state.payload.as_ref())
        .min(screen.height)
        .max(1);
    let centred = (screen.width as i32 - width as i32) / 2 + view.params.position.x;
    let x = centred.clamp(0, screen.width.saturating_sub(width) as i32);
    let y = view
        .params
        .position
        .y
        .clamp(0, screen.height.saturating_sub(height) as i32);
    Some(Rect::new(
        screen.x + x as u16,
        screen.y + y as u16,
        width,
        height,
    ))
}

/// Whether a surface-relative point lands on the close button.
pub fn hits_close(width: u16, x: f32, y: f32) -> bool {
    let right = width as i32 - 2;
    let left = right - (CLOSE_LABEL.len() as i32 - 1);
    let (x, y) = (x.floor() as i32, y.floor() as i32);
    y == 1 && (left..=right).contains(&x)
}

pub fn render(frame: &mut Frame, state: &SimState, status: &str, log_lines: &[String]) {
    let (screen, panel) = split(frame.area());
    render_screen(frame, state, screen, status);
    render_panel(frame, panel, log_lines);
}

fn render_screen(frame: &mut Frame, state: &SimState, screen: Rect, status: &str) {
    let bar = Rect::new(
        screen.x,
        screen.y,
        screen.width,
        state.screen.status_bar_px.min(screen.height as u32) as u16,
    );
    let engine = if state.engine_running { "up" } else { "down" };
    let listener = if state.listening { "on" } else { "off" };
    let permission = if state.overlay_denied { "denied" } else { "granted" };
    frame.render_widget(
        Paragraph::new(format!(
            " call: {status} | engine: {engine} | listener: {listener} | overlay: {permission}"
        ))
        .style(Style::default().add_modifier(Modifier::REVERSED)),
        bar,
    );

    let Some(rect) = overlay_rect(state, screen) else {
        return;
    };
    frame.render_widget(Clear, rect);
    let block = Block::bordered()
        .title(" == ")
        .border_style(Style::default().fg(Color::Cyan));
    let inner = block.inner(rect);
    frame.render_widget(block, rect);
    frame.render_widget(Paragraph::new(content_lines(state.payload.as_ref())), inner);

    let close_width = CLOSE_LABEL.len() as u16;
    if inner.width > close_width && inner.height > 0 {
        let close = Rect::new(inner.right() - close_width, inner.y, close_width, 1);
        frame.render_widget(
            Paragraph::new(CLOSE_LABEL).style(Style::default().fg(Color::Red)),
            close,
        );
    }
}

fn render_panel(frame: &mut Frame, panel: Rect, log_lines: &[String]) {
    let [help, log] =
        Layout::horizontal([Constraint::Length(40), Constraint::Min(10)]).areas(panel);
    frame.render_widget(
        Paragraph::new(HELP_TEXT).block(Block::bordered().title(" keys ")),
        help,
    );
    let lines: Vec<Line> = log_lines.iter().map(|l| Line::from(l.as_str())).collect();
    frame.render_widget(
        Paragraph::new(lines).block(Block::bordered().title(" log ")),
        log,
    );
}
