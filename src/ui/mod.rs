use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Wrap};
use unicode_width::UnicodeWidthChar;

use crate::app::{App, ConfirmDeleteState, DeleteTarget, InputPromptState, OverlayState, Screen};
use crate::config::ClientMode;

mod screens;
mod theme;
use theme::*;

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠹", "⠸"];

pub fn render(f: &mut Frame<'_>, app: &App) {
    let size = f.size();
    let lang = app.lang();
    if size.width < 80 || size.height < 24 {
        let block = Paragraph::new(lang.terminal_too_small())
            .wrap(Wrap { trim: true })
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title(lang.app_title())
                    .borders(Borders::ALL)
                    .style(Style::default().fg(FG_PRIMARY).bg(OVERLAY_BG)),
            )
            .style(Style::default().fg(FG_PRIMARY).bg(BG_PRIMARY));
        f.render_widget(block, size);
        return;
    }

    f.render_widget(Block::default().style(Style::default().bg(BG_PRIMARY)), size);

    let banner_height = if app.banner().is_some() { 3 } else { 0 };
    let vertical = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Length(banner_height),
            Constraint::Min(5),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(size);

    render_header(f, app, vertical[0]);
    if let Some(message) = app.banner() {
        render_error_banner(f, app, message, vertical[1]);
    }
    match app.screen {
        Screen::Agents => screens::render_agent_list(f, app, vertical[2]),
        Screen::AgentForm => screens::render_agent_form(f, app, vertical[2]),
        Screen::Knowledge => screens::render_knowledge(f, app, vertical[2]),
        Screen::Chat => screens::render_chat(f, app, vertical[2]),
    }
    render_hint_bar(f, app, vertical[3]);
    render_status_bar(f, app, vertical[4]);

    if let Some(overlay) = app.overlay.as_ref() {
        match overlay {
            OverlayState::InputPrompt(state) => render_input_prompt_overlay(f, app, state),
            OverlayState::ConfirmDelete(state) => render_confirm_delete_overlay(f, app, state),
        }
    }
}

fn screen_title(app: &App) -> String {
    let lang = app.lang();
    match app.screen {
        Screen::Agents => lang.agents_title().to_string(),
        Screen::AgentForm => match app.form.as_ref().and_then(|form| form.editing.as_ref()) {
            Some(_) => lang.edit_agent_title().to_string(),
            None => lang.create_agent_title().to_string(),
        },
        Screen::Knowledge => match app.knowledge.as_ref() {
            Some(pane) => format!("{} · {}", lang.knowledge_title(), pane.agent_name),
            None => lang.knowledge_title().to_string(),
        },
        Screen::Chat => match app.chat.as_ref() {
            Some(pane) => format!("{} · {}", lang.chat_title(), pane.agent_name),
            None => lang.chat_title().to_string(),
        },
    }
}

fn render_header(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let mode = match app.mode {
        ClientMode::RemoteWithFallback => lang.mode_remote(),
        ClientMode::MockOnly => lang.mode_mock(),
    };
    let bar = Style::default().fg(BAR_TEXT).bg(BAR_BG);
    let mut spans = vec![
        Span::styled(
            format!(" {} ", lang.app_title()),
            bar.bg(BAR_HIGHLIGHT_BG).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {} ", screen_title(app)), bar),
        Span::styled(format!("[{mode}] [{}]", lang.language_name()), bar),
    ];
    if app.is_loading() {
        spans.push(Span::styled(
            format!(" {} {}", SPINNER[app.spinner_frame % SPINNER.len()], lang.loading()),
            bar.fg(Color::Yellow),
        ));
    }
    f.render_widget(Paragraph::new(Line::from(spans)).style(bar), area);
}

fn render_error_banner(f: &mut Frame<'_>, app: &App, message: &str, area: Rect) {
    let lang = app.lang();
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(ERROR_FG))
        .title(Span::styled(
            lang.error_title(),
            Style::default().fg(ERROR_FG).add_modifier(Modifier::BOLD),
        ))
        .title_alignment(Alignment::Left)
        .style(Style::default().bg(ERROR_BG));
    let line = Line::from(vec![
        Span::styled(message.to_string(), Style::default().fg(Color::White)),
        Span::styled(format!("  ({})", lang.dismiss_hint()), Style::default().fg(FG_DIM)),
    ]);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(line).block(block), area);
}

fn render_hint_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let hint = match app.screen {
        Screen::Agents => lang.agent_list_hint(),
        Screen::AgentForm => lang.form_hint(),
        Screen::Knowledge => lang.knowledge_hint(),
        Screen::Chat => lang.chat_hint(),
    };
    let paragraph = Paragraph::new(hint).style(Style::default().fg(FG_DIM).bg(BG_PANEL));
    f.render_widget(paragraph, area);
}

fn render_status_bar(f: &mut Frame<'_>, app: &App, area: Rect) {
    let style = Style::default().fg(BAR_TEXT).bg(BAR_BG);
    let line = Line::from(vec![
        Span::styled(format!(" {}", app.status_message), style),
        Span::styled(format!("  · F2 {}", app.locale.toggle().strings().language_name()), style.fg(FG_DIM)),
    ]);
    f.render_widget(Clear, area);
    f.render_widget(Paragraph::new(line).style(style), area);
}

fn render_input_prompt_overlay(f: &mut Frame<'_>, app: &App, state: &InputPromptState) {
    let lang = app.lang();
    let area = centered_rect(60, 30, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            state.title.as_str(),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(OVERLAY_BORDER))
        .style(Style::default().bg(OVERLAY_BG));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(1),
            Constraint::Min(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let placeholder = Paragraph::new(state.placeholder.as_str())
        .style(Style::default().fg(FG_DIM).bg(OVERLAY_BG));
    f.render_widget(placeholder, chunks[0]);

    let mut input_spans = vec![Span::styled("> ", Style::default().fg(FG_PRIMARY))];
    if state.value.is_empty() {
        input_spans.push(Span::styled(lang.nothing_entered(), Style::default().fg(FG_DIM)));
    } else {
        input_spans.push(Span::styled(
            state.value.as_str(),
            Style::default().fg(Color::White),
        ));
    }
    input_spans.push(Span::styled(" ▍", Style::default().fg(BORDER_FOCUS)));
    let input = Paragraph::new(Line::from(input_spans))
        .style(Style::default().bg(OVERLAY_BG))
        .wrap(Wrap { trim: false });
    f.render_widget(input, chunks[1]);

    let message = match state.error.as_ref() {
        Some(error) => Paragraph::new(error.as_str()).style(Style::default().fg(ERROR_FG).bg(OVERLAY_BG)),
        None => Paragraph::new(lang.prompt_hint()).style(Style::default().fg(FG_DIM).bg(OVERLAY_BG)),
    };
    f.render_widget(message, chunks[2]);
}

fn render_confirm_delete_overlay(f: &mut Frame<'_>, app: &App, state: &ConfirmDeleteState) {
    let lang = app.lang();
    let area = centered_rect(50, 28, f.size());
    f.render_widget(Clear, area);
    let block = Block::default()
        .title(Span::styled(
            lang.confirm_delete_title(),
            Style::default().fg(BAR_TEXT).add_modifier(Modifier::BOLD),
        ))
        .borders(Borders::ALL)
        .border_style(Style::default().fg(OVERLAY_BORDER))
        .style(Style::default().bg(OVERLAY_BG));
    f.render_widget(block.clone(), area);
    let inner = block.inner(area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(2),
            Constraint::Length(1),
            Constraint::Length(1),
        ])
        .split(inner);

    let question = match &state.target {
        DeleteTarget::Agent { name, .. } => lang.confirm_delete_agent(name),
        DeleteTarget::Knowledge { .. } => lang.confirm_delete_knowledge().to_string(),
    };
    let message = Paragraph::new(vec![
        Line::from(Span::styled(question, Style::default().fg(Color::White))),
        Line::from(Span::styled(lang.irreversible(), Style::default().fg(FG_DIM))),
    ])
    .wrap(Wrap { trim: true })
    .style(Style::default().bg(OVERLAY_BG));
    f.render_widget(message, chunks[0]);

    let button = |index: usize| {
        if state.selected_index == index {
            Style::default()
                .bg(PANEL_HIGHLIGHT_BG)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(BAR_TEXT)
        }
    };
    let buttons = Paragraph::new(Line::from(vec![
        Span::styled(format!(" [{}] ", lang.delete_button()), button(0)),
        Span::styled("  ", Style::default().bg(OVERLAY_BG)),
        Span::styled(format!(" [{}] ", lang.cancel_button()), button(1)),
    ]))
    .style(Style::default().bg(OVERLAY_BG))
    .alignment(Alignment::Center);
    f.render_widget(buttons, chunks[1]);

    let hint = Paragraph::new(lang.confirm_hint()).style(Style::default().fg(FG_DIM).bg(OVERLAY_BG));
    f.render_widget(hint, chunks[2]);
}

fn push_wrapped_line(lines: &mut Vec<Line<'static>>, text: &str, style: Style, width: usize) {
    for segment in wrap_to_width(text, width) {
        lines.push(Line::from(Span::styled(segment, style)));
    }
}

/// Splits `text` into rows of at most `width` display cells.
fn wrap_to_width(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![text.to_string()];
    }
    if text.is_empty() {
        return vec![String::new()];
    }
    let mut result = Vec::new();
    let mut current = String::new();
    let mut current_width = 0usize;
    for ch in text.chars() {
        let ch_width = UnicodeWidthChar::width(ch).unwrap_or(1).max(1);
        if current_width + ch_width > width && !current.is_empty() {
            result.push(std::mem::take(&mut current));
            current_width = 0;
        }
        current.push(ch);
        current_width += ch_width;
    }
    result.push(current);
    result
}

fn centered_rect(percent_x: u16, percent_y: u16, area: Rect) -> Rect {
    let horizontal = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(area);
    Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(horizontal[1])[1]
}
