use crate::api::EditField;
use crate::app::{App, Focus};
use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::helpers::{border_style, control_style, spinner};

/// Render the add-feed form with the reload control beneath it.
pub fn render(f: &mut Frame, app: &App, area: Rect) {
    let form = &app.add_form;
    let focused = app.focus == Focus::AddForm;
    let mut lines: Vec<Line> = Vec::new();

    let url_cursor = focused && form.selected == 0;
    lines.push(input_line(
        "YouTube URL",
        &form.youtube_url,
        url_cursor,
        false,
    ));

    lines.push(Line::from(Span::styled(
        format!("[Ctrl+a] {}", form.advanced_label()),
        Style::default().fg(Color::Cyan),
    )));

    if form.advanced.is_shown() {
        for (index, field) in EditField::ALL.into_iter().enumerate() {
            let cursor = focused && form.selected == index + 1;
            lines.push(input_line(
                field.label(),
                form.value(field),
                cursor,
                field.is_choice(),
            ));
        }
    }

    let mut buttons = vec![Span::styled(
        format!("[Enter] {}", form.submit_label()),
        control_style(!form.busy),
    )];
    if form.busy {
        buttons.push(Span::raw(format!(" {}", spinner(app.spinner_frame))));
    }
    buttons.push(Span::raw("   "));
    buttons.push(Span::styled(
        format!("[F5] {}", app.reload_label()),
        control_style(!app.reload_busy),
    ));
    if app.reload_busy {
        buttons.push(Span::raw(format!(" {}", spinner(app.spinner_frame))));
    }
    lines.push(Line::from(buttons));

    let paragraph = Paragraph::new(lines).block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(border_style(focused))
            .title("Add Feed"),
    );
    f.render_widget(paragraph, area);
}

fn input_line<'a>(label: &'a str, value: &'a str, cursor: bool, choice: bool) -> Line<'a> {
    let shown = match (choice, value.is_empty()) {
        (true, true) => "< default >".to_string(),
        (true, false) => format!("< {} >", value),
        (false, _) if cursor => format!("{}▏", value),
        (false, _) => value.to_string(),
    };
    let value_style = if cursor {
        Style::default().add_modifier(Modifier::REVERSED)
    } else {
        Style::default()
    };
    Line::from(vec![
        Span::raw(if cursor { "› " } else { "  " }),
        Span::raw(format!("{}: ", label)),
        Span::styled(shown, value_style),
    ])
}
