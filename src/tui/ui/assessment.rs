//! Assessment result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use crate::application::Assessment;
use crate::tui::styles::LendingTheme;

/// Assessment state
#[derive(Debug, Clone, Default)]
pub enum AssessmentState {
    /// Nothing submitted yet
    #[default]
    Idle,
    Complete { assessment: Assessment },
    /// The request was rejected; the officer can correct the form
    InputError { message: String },
    /// The model is not available
    ConfigurationError { message: String },
}

/// Render the assessment view
pub fn render_assessment(f: &mut Frame, area: Rect, state: &AssessmentState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0]);
    match state {
        AssessmentState::Idle => render_idle(f, chunks[1]),
        AssessmentState::Complete { assessment } => render_result(f, chunks[1], assessment),
        AssessmentState::InputError { message } => {
            render_error(f, chunks[1], "Invalid application", message);
        }
        AssessmentState::ConfigurationError { message } => {
            render_error(f, chunks[1], "Configuration error", message);
        }
    }
    render_footer(f, chunks[2], state);
}

fn render_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", LendingTheme::text()),
        Span::styled("Risk Assessment", LendingTheme::title()),
        Span::styled(" │ Logistic regression", LendingTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_idle(f: &mut Frame, area: Rect) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(
            "No application assessed yet",
            LendingTheme::text_secondary(),
        )),
    ])
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, assessment: &Assessment) {
    let block = Block::default()
        .title(Span::styled(" Prediction Result ", LendingTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(LendingTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Decision
            Constraint::Length(3), // Probability
            Constraint::Length(2), // Threshold
            Constraint::Min(0),    // Recommendation
        ])
        .margin(1)
        .split(inner);

    let rec = assessment.recommendation;
    let rec_style = LendingTheme::recommendation(rec);
    let decision = Paragraph::new(vec![
        Line::from(Span::styled(rec.to_string(), rec_style)),
        Line::from(Span::styled(rec.description(), LendingTheme::text_secondary())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(decision, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(
                    " Default Probability ",
                    LendingTheme::text_secondary(),
                ))
                .borders(Borders::ALL)
                .border_style(LendingTheme::border()),
        )
        .gauge_style(LendingTheme::probability(
            assessment.probability,
            assessment.threshold,
        ))
        .ratio(assessment.probability.clamp(0.0, 1.0))
        .label(format!("{:.2}%", assessment.probability * 100.0));
    f.render_widget(gauge, chunks[1]);

    let threshold = Paragraph::new(Line::from(vec![
        Span::styled("Decision threshold: ", LendingTheme::text_secondary()),
        Span::styled(format!("{:.4}", assessment.threshold), LendingTheme::figure()),
        Span::styled("   Ref: ", LendingTheme::text_muted()),
        Span::styled(assessment.id.clone(), LendingTheme::text_muted()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(threshold, chunks[2]);

    let mut lines = vec![Line::from(Span::styled(
        "Recommendation for the bank",
        LendingTheme::subtitle(),
    ))];
    for action in rec.actions() {
        lines.push(Line::from(vec![
            Span::styled("• ", rec_style),
            Span::styled(*action, LendingTheme::text()),
        ]));
    }
    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[3]);
}

fn render_error(f: &mut Frame, area: Rect, title: &str, message: &str) {
    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(format!("! {title}"), LendingTheme::danger())),
        Line::from(""),
        Line::from(Span::styled(message, LendingTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(LendingTheme::danger()),
    );

    f.render_widget(content, area);
}

fn render_footer(f: &mut Frame, area: Rect, state: &AssessmentState) {
    let content = match state {
        AssessmentState::Complete { .. } => Line::from(vec![
            Span::styled("[Enter] ", LendingTheme::key_hint()),
            Span::styled("Dashboard ", LendingTheme::key_desc()),
            Span::styled("[N] ", LendingTheme::key_hint()),
            Span::styled("New Application", LendingTheme::key_desc()),
        ]),
        AssessmentState::InputError { .. } => Line::from(vec![
            Span::styled("[Enter] ", LendingTheme::key_hint()),
            Span::styled("Edit Application ", LendingTheme::key_desc()),
            Span::styled("[Esc] ", LendingTheme::key_hint()),
            Span::styled("Dashboard", LendingTheme::key_desc()),
        ]),
        _ => Line::from(vec![
            Span::styled("[Esc] ", LendingTheme::key_hint()),
            Span::styled("Dashboard", LendingTheme::key_desc()),
        ]),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(footer, area);
}
