//! UI module: View components for the TUI.

pub mod application;
pub mod assessment;
pub mod dashboard;

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use crate::tui::styles::LendingTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Model-based recommendation only. The final credit decision rests with the bank.",
            LendingTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "Estimates outside the form ranges are not meaningful.",
            LendingTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(LendingTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}
