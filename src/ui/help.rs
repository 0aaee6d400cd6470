//! Help overlay: keybinding table grouped by focus region.

use ratatui::{
    layout::Constraint,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Row, Table},
    Frame,
};

use super::helpers::centered_rect;

/// (section, [(key, description)])
const BINDINGS: &[(&str, &[(&str, &str)])] = &[
    (
        "General",
        &[
            ("Tab / S-Tab", "Switch between add form and feed list"),
            ("F5 / Ctrl+r", "Reload container"),
            ("F1", "Toggle this help"),
            ("Ctrl+c", "Quit"),
        ],
    ),
    (
        "Feed List",
        &[
            ("j / k", "Select feed"),
            ("e", "Edit feed / cancel edit"),
            ("Enter", "Focus the open edit form"),
            ("s", "Save changes"),
            ("x", "Remove feed (press twice)"),
            ("y", "Copy XML path to clipboard"),
            ("o", "Open source channel in browser"),
            ("a", "Go to add form"),
            ("r", "Reload container"),
            ("?", "Toggle this help"),
            ("q", "Quit"),
        ],
    ),
    (
        "Edit Form",
        &[
            ("Up / Down", "Select field"),
            ("Left / Right", "Cycle choice"),
            ("Enter", "Save changes"),
            ("Ctrl+u", "Clear field"),
            ("Ctrl+e", "Cancel edit"),
            ("Esc", "Back to feed list"),
        ],
    ),
    (
        "Add Form",
        &[
            ("Up / Down", "Select field"),
            ("Left / Right", "Cycle choice"),
            ("Ctrl+a", "Show / hide advanced options"),
            ("Ctrl+u", "Clear field"),
            ("Enter", "Add feed"),
            ("Esc", "Back to feed list"),
        ],
    ),
];

/// Render the help overlay on top of the current view.
pub fn render(f: &mut Frame) {
    let overlay = centered_rect(80, 80, f.area());
    if overlay.width < 20 || overlay.height < 6 {
        return;
    }

    // Clear the background behind the overlay
    f.render_widget(Clear, overlay);

    let mut rows: Vec<Row> = Vec::new();
    for (section, bindings) in BINDINGS {
        rows.push(Row::new(vec![
            Line::from(Span::styled(
                format!("-- {} --", section),
                Style::default().add_modifier(Modifier::BOLD),
            )),
            Line::from(""),
        ]));
        for (key, description) in *bindings {
            rows.push(Row::new(vec![format!("  {}", key), description.to_string()]));
        }
        rows.push(Row::new(vec![String::new(), String::new()]));
    }
    rows.pop();

    let widths = [Constraint::Length(16), Constraint::Min(20)];
    let table = Table::new(rows, widths)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(" Help (? or Esc to close) "),
        )
        .header(
            Row::new(vec!["Key", "Action"])
                .style(
                    Style::default()
                        .add_modifier(Modifier::BOLD)
                        .add_modifier(Modifier::UNDERLINED),
                )
                .bottom_margin(1),
        );

    f.render_widget(table, overlay);
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::layout::Rect;

    #[test]
    fn test_every_section_has_bindings() {
        assert!(BINDINGS.iter().all(|(_, bindings)| !bindings.is_empty()));
    }

    #[test]
    fn test_overlay_fits_standard_terminal() {
        let overlay = centered_rect(80, 80, Rect::new(0, 0, 80, 24));
        assert!(overlay.width >= 20 && overlay.height >= 6);
    }
}
