//! TUI rendering

use ratatui::layout::{Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};
use ratatui::Frame;

use super::app::{App, InputMode};

pub fn draw(f: &mut Frame, app: &App) {
    let constraints = match app.input_mode {
        InputMode::Input => vec![
            Constraint::Min(3),
            Constraint::Length(3),
            Constraint::Length(1),
        ],
        InputMode::Normal => vec![Constraint::Min(3), Constraint::Length(1)],
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(f.area());

    draw_list(f, app, chunks[0]);
    if app.input_mode == InputMode::Input {
        draw_input(f, app, chunks[1]);
    }
    draw_status_bar(f, app, chunks[chunks.len() - 1]);
}

fn draw_list(f: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .items
        .iter()
        .map(|item| {
            let (marker, style) = if item.done {
                (
                    "[x] ",
                    Style::default()
                        .fg(Color::DarkGray)
                        .add_modifier(Modifier::CROSSED_OUT | Modifier::ITALIC),
                )
            } else {
                ("[ ] ", Style::default())
            };
            ListItem::new(Line::from(vec![
                Span::raw(marker),
                Span::styled(item.text.clone(), style),
            ]))
        })
        .collect();

    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(" tido "))
        .highlight_style(Style::default().add_modifier(Modifier::REVERSED))
        .highlight_symbol("> ");

    let mut state = ListState::default();
    if !app.items.is_empty() {
        state.select(Some(app.selected));
    }
    f.render_stateful_widget(list, area, &mut state);
}

fn draw_input(f: &mut Frame, app: &App, area: Rect) {
    let input = Paragraph::new(app.input.as_str())
        .block(Block::default().borders(Borders::ALL).title(" new todo "));
    f.render_widget(input, area);
    f.set_cursor_position(Position::new(
        area.x + app.input.len() as u16 + 1,
        area.y + 1,
    ));
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let hint = match app.input_mode {
        InputMode::Normal => "a: add  space: toggle  d: delete  j/k: move  q: quit",
        InputMode::Input => "enter: save  esc: cancel",
    };
    let sync = if app.synced { " synced " } else { " local " };

    let bar = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Min(0), Constraint::Length(sync.len() as u16)])
        .split(area);

    f.render_widget(
        Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
        bar[0],
    );
    f.render_widget(
        Paragraph::new(sync).style(Style::default().fg(Color::Black).bg(if app.synced {
            Color::Green
        } else {
            Color::DarkGray
        })),
        bar[1],
    );
}
