use crate::app::{App, Focus, LABEL_SAVE};
use crate::markup::{ControlRole, FeedRow};
use crate::sync::ListRegion;
use crate::util::{display_width, truncate_to_width};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem, ListState, Paragraph},
    Frame,
};

use super::helpers::{border_style, control_style, spinner};

/// Render the feed list panel
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let is_focused = matches!(app.focus, Focus::Feeds | Focus::EditForm);
    let block = |title: String| {
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(is_focused))
            .title(title)
    };

    let list = match &app.list {
        ListRegion::Loading => {
            let text = format!("{} Loading feeds…", spinner(app.spinner_frame));
            f.render_widget(Paragraph::new(text).block(block("Feeds".into())), area);
            return;
        }
        ListRegion::Failed(message) => {
            let text = Span::styled(*message, Style::default().fg(Color::Red));
            f.render_widget(Paragraph::new(text).block(block("Feeds".into())), area);
            return;
        }
        ListRegion::Loaded(list) => list,
    };

    if list.is_empty() {
        let notice = list.notice.as_deref().unwrap_or("No feeds found.");
        f.render_widget(
            Paragraph::new(notice).block(block("Feeds (0)".into())),
            area,
        );
        return;
    }

    let items: Vec<ListItem> = list
        .rows
        .iter()
        .enumerate()
        .map(|(i, row)| {
            ListItem::new(row_lines(app, row, i == app.selected_row, area.width))
        })
        .collect();

    let mut state = ListState::default().with_selected(Some(app.selected_row));
    let widget = List::new(items)
        .block(block(format!("Feeds ({})", list.rows.len())))
        .highlight_style(Style::default().bg(Color::DarkGray).fg(Color::White));

    f.render_stateful_widget(widget, area, &mut state);
}

fn row_lines<'a>(app: &'a App, row: &'a FeedRow, selected: bool, width: u16) -> Vec<Line<'a>> {
    let state = app.row_state(&row.key);
    let mut lines = Vec::with_capacity(3);

    let mut title = vec![Span::styled(
        row.name.as_str(),
        Style::default().add_modifier(Modifier::BOLD),
    )];
    if let Some(source) = &row.source_url {
        // Borders, padding and the spinner
        let budget = (width as usize).saturating_sub(display_width(&row.name) + 8);
        if budget > 3 {
            title.push(Span::styled(
                format!("  {}", truncate_to_width(source, budget)),
                Style::default().fg(Color::Gray),
            ));
        }
    }
    if state.saving || state.removing {
        title.push(Span::raw(format!(" {}", spinner(app.spinner_frame))));
    }
    lines.push(Line::from(title));

    let mut controls: Vec<Span> = vec![Span::raw("  ")];
    if row.has_control(ControlRole::EditToggle) {
        controls.push(Span::styled(
            format!("[e] {}  ", app.edit_label(&row.key)),
            Style::default().fg(Color::Cyan),
        ));
    }
    if row.has_control(ControlRole::RemoveFeed) {
        let style = if app.gate.is_armed(&row.key) {
            Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
        } else if state.removing {
            control_style(false)
        } else {
            Style::default().fg(Color::Red)
        };
        controls.push(Span::styled(
            format!("[x] {}  ", app.remove_label(&row.key)),
            style,
        ));
    }
    if row.has_control(ControlRole::CopyXml) {
        let style = if app.transients.is_active(&row.key) {
            Style::default().fg(Color::Green)
        } else {
            Style::default().fg(Color::Yellow)
        };
        controls.push(Span::styled(
            format!("[y] {}", app.copy_label(&row.key)),
            style,
        ));
    }
    if controls.len() > 1 {
        lines.push(Line::from(controls));
    }

    if state.edit.is_shown() {
        let editing = selected && app.focus == Focus::EditForm;
        for (index, field) in row.present_fields().into_iter().enumerate() {
            let value = row.field_value(field).unwrap_or_default();
            let cursor = editing && index == app.selected_edit_field;
            let value_text = if field.is_choice() {
                format!("< {} >", value)
            } else if cursor {
                format!("{}▏", value)
            } else {
                value.to_string()
            };
            let marker = if cursor { "› " } else { "  " };
            lines.push(Line::from(vec![
                Span::raw(format!("    {}{}: ", marker, field.label())),
                Span::styled(
                    value_text,
                    if cursor {
                        Style::default().add_modifier(Modifier::REVERSED)
                    } else {
                        Style::default()
                    },
                ),
            ]));
        }
        if row.has_control(ControlRole::SaveEdit) {
            lines.push(Line::from(Span::styled(
                format!("      [s] {}", LABEL_SAVE),
                control_style(state.save_enabled && !state.saving),
            )));
        }
    }

    lines
}
