use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, List, ListItem, ListState, Paragraph, Wrap};

use super::theme::*;
use super::{push_wrapped_line, wrap_to_width};
use crate::app::App;
use crate::forms::FormField;
use crate::model::{Agent, Knowledge, KnowledgeKind, Role};

const IMAGE_EXTENSIONS: [&str; 5] = [".png", ".jpg", ".jpeg", ".gif", ".webp"];

fn panel(title: impl Into<String>, focused: bool) -> Block<'static> {
    let border = if focused {
        Style::default().fg(BORDER_FOCUS).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(BORDER_IDLE)
    };
    Block::default()
        .borders(Borders::ALL)
        .border_style(border)
        .title(Span::styled(title.into(), Style::default().fg(FG_PRIMARY)))
        .style(Style::default().bg(BG_PANEL))
}

pub(super) fn render_agent_list(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let agents = app.agents.agents();
    let block = panel(lang.agents_title(), true);
    if agents.is_empty() {
        let empty = Paragraph::new(lang.no_agents())
            .style(Style::default().fg(FG_DIM))
            .wrap(Wrap { trim: true })
            .block(block);
        f.render_widget(empty, columns[0]);
    } else {
        let items: Vec<ListItem> = agents
            .iter()
            .map(|agent| {
                ListItem::new(vec![
                    Line::from(Span::styled(
                        agent.name.clone(),
                        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
                    )),
                    Line::from(Span::styled(
                        format!("{} · {}", agent.llm.model, lang.knowledge_count(agent.knowledge.len())),
                        Style::default().fg(FG_DIM),
                    )),
                ])
            })
            .collect();
        let mut list_state = ListState::default();
        list_state.select(Some(app.agent_cursor.min(agents.len() - 1)));
        let list = List::new(items)
            .block(block)
            .highlight_style(Style::default().bg(PANEL_HIGHLIGHT_BG).fg(Color::Black));
        f.render_stateful_widget(list, columns[0], &mut list_state);
    }

    let details = panel(lang.details_title(), false);
    let width = details.inner(columns[1]).width.max(1) as usize;
    let lines = app
        .highlighted_agent()
        .map(|agent| agent_details(app, agent, width))
        .unwrap_or_default();
    f.render_widget(Paragraph::new(lines).block(details), columns[1]);
}

fn agent_details(app: &App, agent: &Agent, width: usize) -> Vec<Line<'static>> {
    let lang = app.lang();
    let heading = Style::default().fg(BORDER_FOCUS).add_modifier(Modifier::BOLD);
    let body = Style::default().fg(FG_PRIMARY);
    let mut lines = vec![Line::from(Span::styled(
        agent.name.clone(),
        Style::default().fg(Color::White).add_modifier(Modifier::BOLD),
    ))];
    push_wrapped_line(&mut lines, &agent.description, Style::default().fg(FG_DIM), width);

    let sections = [
        (FormField::Persona, vec![agent.character.persona.clone()]),
        (FormField::Goals, bullets(&agent.character.goals)),
        (FormField::Constraints, bullets(&agent.character.constraints)),
    ];
    for (field, rows) in sections {
        lines.push(Line::default());
        lines.push(Line::from(Span::styled(lang.field_label(field), heading)));
        for row in rows {
            push_wrapped_line(&mut lines, &row, body, width);
        }
    }

    lines.push(Line::default());
    lines.push(Line::from(vec![
        Span::styled(format!("{}: ", lang.field_label(FormField::Model)), heading),
        Span::styled(
            format!("{} / {} · {:.1}", agent.llm.provider, agent.llm.model, agent.llm.temperature),
            body,
        ),
    ]));
    lines.push(Line::from(Span::styled(
        lang.knowledge_count(agent.knowledge.len()),
        body,
    )));
    lines.push(Line::from(Span::styled(
        format!(
            "{} {} · {} {}",
            lang.created_label(),
            agent.created_at.format("%Y-%m-%d %H:%M"),
            lang.updated_label(),
            agent.updated_at.format("%Y-%m-%d %H:%M"),
        ),
        Style::default().fg(FG_DIM),
    )));
    lines
}

fn bullets(items: &[String]) -> Vec<String> {
    items.iter().map(|item| format!("• {item}")).collect()
}

pub(super) fn render_agent_form(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let Some(form) = app.form.as_ref() else {
        return;
    };
    let title = if form.editing.is_some() {
        lang.edit_agent_title()
    } else {
        lang.create_agent_title()
    };
    let block = panel(title, true);
    let inner = block.inner(area);
    let width = inner.width.max(1) as usize;

    let mut lines: Vec<Line<'static>> = Vec::new();
    let mut focused_row = 0usize;
    for field in FormField::ALL {
        let focused = field == form.focused;
        if focused {
            focused_row = lines.len();
        }
        let label_style = if focused {
            Style::default().fg(BORDER_FOCUS).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(FG_DIM)
        };
        lines.push(Line::from(Span::styled(
            format!("{}{}", if focused { "▶ " } else { "  " }, lang.field_label(field)),
            label_style,
        )));
        let mut value = form.values.get(field).to_string();
        if focused {
            value.push('▍');
        }
        for segment in wrap_to_width(&value, width.saturating_sub(4).max(1)) {
            lines.push(Line::from(vec![
                Span::raw("    "),
                Span::styled(segment, Style::default().fg(Color::White)),
            ]));
        }
        if let Some(message) = form.errors.message(field, lang) {
            lines.push(Line::from(Span::styled(
                format!("    {message}"),
                Style::default().fg(ERROR_FG),
            )));
        }
    }

    let visible = inner.height.max(1) as usize;
    let scroll = focused_row.saturating_sub(visible.saturating_sub(3));
    let paragraph = Paragraph::new(lines)
        .block(block)
        .scroll((scroll.min(u16::MAX as usize) as u16, 0));
    f.render_widget(paragraph, area);
}

pub(super) fn render_knowledge(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let Some(pane) = app.knowledge.as_ref() else {
        return;
    };
    let block = panel(format!("{} · {}", lang.knowledge_title(), pane.agent_name), true);
    let items = pane.state.items();
    if items.is_empty() {
        let empty = Paragraph::new(lang.no_knowledge())
            .style(Style::default().fg(FG_DIM))
            .block(block);
        f.render_widget(empty, area);
        return;
    }

    let width = block.inner(area).width.max(1) as usize;
    let rows: Vec<ListItem> = items
        .iter()
        .map(|item| ListItem::new(knowledge_lines(app, item, width)))
        .collect();
    let mut list_state = ListState::default();
    list_state.select(Some(pane.selected.min(items.len() - 1)));
    let list = List::new(rows)
        .block(block)
        .highlight_style(Style::default().bg(BAR_HIGHLIGHT_BG));
    f.render_stateful_widget(list, area, &mut list_state);
}

fn knowledge_lines(app: &App, item: &Knowledge, width: usize) -> Vec<Line<'static>> {
    let lang = app.lang();
    let kind = format!("[{}] ", lang.knowledge_kind(item.kind));
    let summary = match item.kind {
        KnowledgeKind::File => match (&item.filename, &item.file_type) {
            (Some(name), Some(file_type)) => format!("{name} ({file_type})"),
            (Some(name), None) => name.clone(),
            _ => item.content.clone(),
        },
        _ => item.content.lines().next().unwrap_or_default().to_string(),
    };
    let mut first = vec![
        Span::styled(kind, Style::default().fg(BORDER_FOCUS)),
        Span::styled(summary, Style::default().fg(Color::White)),
    ];
    if item.kind == KnowledgeKind::Url && is_displayable_image(app, &item.content) {
        first.push(Span::styled(
            format!(" {}", lang.image_marker()),
            Style::default().fg(ASSISTANT_FG),
        ));
    }
    let mut lines = vec![Line::from(first)];
    if item.kind == KnowledgeKind::Text && item.content.lines().count() > 1 {
        let rest: String = item.content.lines().skip(1).collect::<Vec<_>>().join(" ");
        if let Some(preview) = wrap_to_width(&rest, width.saturating_sub(4).max(1)).into_iter().next() {
            lines.push(Line::from(Span::styled(format!("    {preview}"), Style::default().fg(FG_DIM))));
        }
    }
    lines.push(Line::from(Span::styled(
        format!("    {} {}", lang.created_label(), item.created_at.format("%Y-%m-%d %H:%M")),
        Style::default().fg(FG_DIM),
    )));
    lines
}

/// Images are only shown for hosts on the configured allow-list.
fn is_displayable_image(app: &App, url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let path = lower.split(['?', '#']).next().unwrap_or_default();
    IMAGE_EXTENSIONS.iter().any(|ext| path.ends_with(ext)) && app.config().is_allowed_image_host(url)
}

pub(super) fn render_chat(f: &mut Frame<'_>, app: &App, area: Rect) {
    let lang = app.lang();
    let Some(pane) = app.chat.as_ref() else {
        return;
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(3), Constraint::Length(3)])
        .split(area);

    let block = panel(format!("{} · {}", lang.chat_title(), pane.agent_name), false);
    let inner = block.inner(chunks[0]);
    let width = inner.width.max(1) as usize;
    let mut lines: Vec<Line<'static>> = Vec::new();
    if pane.state.messages().is_empty() {
        lines.push(Line::from(Span::styled(lang.no_messages(), Style::default().fg(FG_DIM))));
    }
    for message in pane.state.messages() {
        let (label, color) = match message.role {
            Role::User => (lang.you().to_string(), USER_FG),
            Role::Assistant => (pane.agent_name.clone(), ASSISTANT_FG),
        };
        lines.push(Line::from(vec![
            Span::styled(label, Style::default().fg(color).add_modifier(Modifier::BOLD)),
            Span::styled(
                format!("  {}", message.timestamp.format("%H:%M")),
                Style::default().fg(FG_DIM),
            ),
        ]));
        for row in message.content.lines() {
            push_wrapped_line(&mut lines, row, Style::default().fg(FG_PRIMARY), width);
        }
        lines.push(Line::default());
    }
    let visible = inner.height as usize;
    let offset = lines
        .len()
        .saturating_sub(visible)
        .saturating_sub(pane.scroll_back);
    let transcript = Paragraph::new(lines)
        .block(block)
        .scroll((offset.min(u16::MAX as usize) as u16, 0));
    f.render_widget(transcript, chunks[0]);

    let busy = pane.state.loading();
    let title = if busy { lang.composer_busy() } else { lang.composer_title() };
    let input_block = panel(title, !busy);
    let input_inner = input_block.inner(chunks[1]);
    let input = Paragraph::new(pane.composer.buffer().to_string())
        .style(Style::default().fg(if busy { FG_DIM } else { Color::White }))
        .block(input_block);
    f.render_widget(Clear, chunks[1]);
    f.render_widget(input, chunks[1]);

    if app.overlay.is_none() {
        let column = pane
            .composer
            .cursor_column()
            .min(input_inner.width.saturating_sub(1));
        f.set_cursor(input_inner.x.saturating_add(column), input_inner.y);
    }
}
