//! Dashboard view: Main overview screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::domain::Recommendation;
use crate::tui::styles::{LendingTheme, APP_NAME};

/// Count of assessments made in this session, per outcome.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionTally {
    pub likely_default: u32,
    pub unlikely_default: u32,
}

impl SessionTally {
    pub fn record(&mut self, recommendation: Recommendation) {
        match recommendation {
            Recommendation::LikelyDefault => self.likely_default += 1,
            Recommendation::UnlikelyDefault => self.unlikely_default += 1,
        }
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.likely_default + self.unlikely_default
    }
}

/// Dashboard state for rendering.
#[derive(Debug, Clone, Default)]
pub struct DashboardState {
    pub artifact_dir: String,
    /// `None` when artifacts loaded, otherwise the load error.
    pub artifact_error: Option<String>,
    pub n_features: usize,
    pub threshold: f64,
    pub tally: SessionTally,
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
        ])
        .split(area);

    render_header(f, chunks[0]);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(45), Constraint::Percentage(55)])
        .split(chunks[1]);

    render_status_panels(f, columns[0], state);
    render_tally(f, columns[1], state.tally);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", LendingTheme::text()),
        Span::styled(format!(" {APP_NAME} "), LendingTheme::header()),
        Span::styled(" │ ", LendingTheme::text_muted()),
        Span::styled("Loan Default Risk Assessment", LendingTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_status_panels(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(8), // Model status
            Constraint::Min(0),    // Quick actions
        ])
        .margin(1)
        .split(area);

    let mut status = vec![Line::from(vec![
        Span::styled("  Artifacts: ", LendingTheme::text_secondary()),
        Span::styled(state.artifact_dir.clone(), LendingTheme::text()),
    ])];
    match &state.artifact_error {
        None => {
            status.push(Line::from(vec![
                Span::styled("  OK ", LendingTheme::success()),
                Span::styled("Model loaded", LendingTheme::text()),
            ]));
            status.push(Line::from(vec![
                Span::styled("  Features: ", LendingTheme::text_secondary()),
                Span::styled(state.n_features.to_string(), LendingTheme::text()),
            ]));
            status.push(Line::from(vec![
                Span::styled("  Threshold: ", LendingTheme::text_secondary()),
                Span::styled(format!("{:.4}", state.threshold), LendingTheme::figure()),
            ]));
        }
        Some(error) => {
            status.push(Line::from(vec![
                Span::styled("  FAIL ", LendingTheme::danger()),
                Span::styled("Model unavailable", LendingTheme::text()),
            ]));
            status.push(Line::from(vec![Span::styled(
                format!("  {error}"),
                LendingTheme::text_muted(),
            )]));
            status.push(Line::from(vec![Span::styled(
                "  Run train_model to produce artifacts.",
                LendingTheme::text_muted(),
            )]));
        }
    }

    let status_block = Block::default()
        .title(Span::styled(" Model Status ", LendingTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(LendingTheme::border());
    f.render_widget(
        Paragraph::new(status)
            .block(status_block)
            .wrap(Wrap { trim: false }),
        chunks[0],
    );

    let actions = vec![
        Line::from(vec![
            Span::styled("[N] ", LendingTheme::key_hint()),
            Span::styled("New Application", LendingTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[R] ", LendingTheme::key_hint()),
            Span::styled("Reset Session Tally", LendingTheme::key_desc()),
        ]),
        Line::from(vec![
            Span::styled("[Q] ", LendingTheme::key_hint()),
            Span::styled("Quit", LendingTheme::key_desc()),
        ]),
    ];
    let actions_block = Block::default()
        .title(Span::styled(" Quick Actions ", LendingTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(LendingTheme::border());
    f.render_widget(Paragraph::new(actions).block(actions_block), chunks[1]);
}

fn render_tally(f: &mut Frame, area: Rect, tally: SessionTally) {
    let block = Block::default()
        .title(Span::styled(" This Session ", LendingTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(LendingTheme::border());

    if tally.total() == 0 {
        let empty = Paragraph::new(Line::from(vec![Span::styled(
            "No applications assessed yet. Press [N] to start.",
            LendingTheme::text_muted(),
        )]))
        .block(block);
        f.render_widget(empty, area);
        return;
    }

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Length(3), Constraint::Min(0)])
        .margin(1)
        .split(inner);

    let lines = vec![
        Line::from(vec![
            Span::styled("Assessed: ", LendingTheme::text_secondary()),
            Span::styled(tally.total().to_string(), LendingTheme::text()),
        ]),
        Line::from(vec![
            Span::styled("Likely default: ", LendingTheme::text_secondary()),
            Span::styled(
                tally.likely_default.to_string(),
                LendingTheme::recommendation(Recommendation::LikelyDefault),
            ),
            Span::styled("  Unlikely default: ", LendingTheme::text_secondary()),
            Span::styled(
                tally.unlikely_default.to_string(),
                LendingTheme::recommendation(Recommendation::UnlikelyDefault),
            ),
        ]),
    ];
    f.render_widget(Paragraph::new(lines), chunks[0]);

    let share = f64::from(tally.likely_default) / f64::from(tally.total());
    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" High-risk share ", LendingTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(LendingTheme::border()),
        )
        .gauge_style(LendingTheme::danger())
        .ratio(share.clamp(0.0, 1.0))
        .label(format!("{:.0}%", share * 100.0));
    f.render_widget(gauge, chunks[1]);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_tally() {
        let mut tally = SessionTally::default();
        tally.record(Recommendation::LikelyDefault);
        tally.record(Recommendation::UnlikelyDefault);
        tally.record(Recommendation::UnlikelyDefault);

        assert_eq!(tally.likely_default, 1);
        assert_eq!(tally.unlikely_default, 2);
        assert_eq!(tally.total(), 3);
    }
}
