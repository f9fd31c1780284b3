use ratatui::Frame;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::symbols::Marker;
use ratatui::text::{Line, Span};
use ratatui::widgets::canvas::{Canvas, Circle};
use ratatui::widgets::{Block, Borders, Paragraph};

use duet::{PlayerPosition, RenderFrame, Role};

const PLAYER_RADIUS: f64 = 0.04;

pub fn render(frame: &mut Frame, state: &RenderFrame) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(0), Constraint::Length(4)])
        .split(frame.area());

    render_field(frame, chunks[0], state);
    render_status(frame, chunks[1], state);
}

fn player_color(role: Role) -> Color {
    match role {
        Role::Authority => Color::Yellow,
        Role::Initiator => Color::Magenta,
    }
}

/// Positions grow downwards, the canvas grows upwards.
fn canvas_point(position: PlayerPosition) -> (f64, f64) {
    (position.x() as f64, -(position.y() as f64))
}

fn render_field(frame: &mut Frame, area: Rect, state: &RenderFrame) {
    let block = Block::default()
        .title(format!(" {} ", state.role.label()))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan));

    let canvas = Canvas::default()
        .block(block)
        .marker(Marker::Braille)
        .x_bounds([-1.0, 1.0])
        .y_bounds([-1.0, 1.0])
        .paint(|ctx| {
            for role in [Role::Authority, Role::Initiator] {
                let (x, y) = canvas_point(state.position(role));
                let color = player_color(role);
                ctx.draw(&Circle {
                    x,
                    y,
                    radius: PLAYER_RADIUS,
                    color,
                });
                let tag = if role == state.role { "you" } else { "peer" };
                ctx.print(x, y, Span::styled(tag, Style::default().fg(color)));
            }
        });

    frame.render_widget(canvas, area);
}

fn render_status(frame: &mut Frame, area: Rect, state: &RenderFrame) {
    let block = Block::default()
        .title(" Link ")
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Yellow));

    let stats = &state.stats;
    let own = state.own();
    let peer = state.peer();

    let lines = vec![
        Line::from(vec![
            Span::styled("Tick: ", Style::default().fg(Color::Gray)),
            Span::raw(format!("{}  ", state.tick)),
            Span::styled("Records: ", Style::default().fg(Color::Gray)),
            Span::raw(format!(
                "{} sent / {} recv ({} / {})  ",
                stats.records_sent,
                stats.records_received,
                format_bytes(stats.bytes_sent),
                format_bytes(stats.bytes_received)
            )),
            Span::styled("Encoding: ", Style::default().fg(Color::Gray)),
            Span::raw(state.encoding.label()),
        ]),
        Line::from(vec![
            Span::styled(
                format!("you ({:+.3}, {:+.3})  ", own.x(), own.y()),
                Style::default().fg(player_color(state.role)),
            ),
            Span::styled(
                format!("peer ({:+.3}, {:+.3})  ", peer.x(), peer.y()),
                Style::default().fg(player_color(state.role.peer())),
            ),
            Span::styled(
                "Arrows move, Esc quits",
                Style::default()
                    .fg(Color::DarkGray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]),
    ];

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{}B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1}KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1}MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
