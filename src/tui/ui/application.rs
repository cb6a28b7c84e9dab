//! Loan application input form.
//!
//! Numeric fields are typed; categorical fields and the loan term are
//! selectors cycled with Left/Right. Category options come from the loaded
//! catalog so the form can only offer values the model knows.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};
use zeroize::Zeroize;

use crate::domain::{ApplicantProfile, CategoryCatalog, CATEGORICAL_FIELDS, LOAN_TERMS};
use crate::tui::styles::LendingTheme;

/// How a form field is edited.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// Typed number within `[min, max]`. `percent` values are divided by 100.
    Number { min: f64, max: f64, percent: bool },
    /// One of a fixed list of options.
    Choice { options: Vec<String>, index: usize },
}

/// Form field definition
#[derive(Debug, Clone)]
pub struct FormField {
    pub label: &'static str,
    pub hint: &'static str,
    pub kind: FieldKind,
    pub value: String,
}

impl FormField {
    fn number(label: &'static str, hint: &'static str, min: f64, max: f64) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Number {
                min,
                max,
                percent: false,
            },
            value: String::new(),
        }
    }

    fn choice(label: &'static str, hint: &'static str, options: Vec<String>) -> Self {
        Self {
            label,
            hint,
            kind: FieldKind::Choice { options, index: 0 },
            value: String::new(),
        }
    }

    /// Text shown in the field box.
    #[must_use]
    pub fn display(&self) -> Option<&str> {
        match &self.kind {
            FieldKind::Number { .. } if self.value.is_empty() => None,
            FieldKind::Number { .. } => Some(self.value.as_str()),
            FieldKind::Choice { options, index } => options.get(*index).map(String::as_str),
        }
    }

    fn parse_number(&self) -> Result<f64, String> {
        let FieldKind::Number { min, max, percent } = self.kind else {
            return Err(format!("{}: not a numeric field", self.label));
        };
        let value: f64 = self
            .value
            .trim()
            .parse()
            .map_err(|_| format!("{}: Invalid number", self.label))?;
        if !(min..=max).contains(&value) {
            return Err(format!(
                "{}: Value must be between {} and {}",
                self.label, min, max
            ));
        }
        Ok(if percent { value / 100.0 } else { value })
    }

    fn selected(&self) -> Result<String, String> {
        self.display()
            .map(str::to_string)
            .ok_or_else(|| format!("{}: No options available", self.label))
    }
}

/// Index of the loan term selector; numeric inputs come before it.
const TERM_FIELD: usize = 7;

/// Loan application form state
pub struct ApplicationFormState {
    pub fields: Vec<FormField>,
    pub selected_field: usize,
    pub error_message: Option<String>,
}

impl ApplicationFormState {
    /// Build the form, taking category options from `catalog`.
    #[must_use]
    pub fn new(catalog: Option<&CategoryCatalog>) -> Self {
        let terms = LOAN_TERMS.iter().map(u32::to_string).collect();
        let mut fields = vec![
            FormField::number("Age", "years (18-70)", 18.0, 70.0),
            FormField::number("Income", "per year (10000-500000)", 10_000.0, 500_000.0),
            FormField::number("Loan Amount", "(1000-1000000)", 1_000.0, 1_000_000.0),
            FormField::number("Credit Score", "(300-850)", 300.0, 850.0),
            FormField::number("Months Employed", "(0-360)", 0.0, 360.0),
            FormField::number("Credit Lines", "open lines (1-15)", 1.0, 15.0),
            FormField {
                label: "Interest Rate",
                hint: "% per year (0.01-30)",
                kind: FieldKind::Number {
                    min: 0.01,
                    max: 30.0,
                    percent: true,
                },
                value: String::new(),
            },
            FormField::choice("Loan Term", "months", terms),
            FormField::number("DTI Ratio", "debt-to-income (0.01-0.99)", 0.01, 0.99),
        ];

        let labels: [(&'static str, &'static str); 7] = [
            ("Education", "highest level"),
            ("Employment", "type"),
            ("Marital Status", ""),
            ("Has Mortgage", ""),
            ("Has Dependents", ""),
            ("Loan Purpose", ""),
            ("Has Co-Signer", ""),
        ];
        for ((label, hint), field) in labels.into_iter().zip(CATEGORICAL_FIELDS) {
            let options = catalog
                .and_then(|c| c.categories(field))
                .map(<[String]>::to_vec)
                .unwrap_or_default();
            fields.push(FormField::choice(label, hint, options));
        }

        Self {
            fields,
            selected_field: 0,
            error_message: None,
        }
    }

    /// Move to the next field
    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    /// Move to the previous field
    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    /// Type into the current field (numbers only)
    pub fn input_char(&mut self, c: char) {
        let field = &mut self.fields[self.selected_field];
        if matches!(field.kind, FieldKind::Number { .. })
            && (c.is_ascii_digit() || c == '.' || c == '-')
        {
            field.value.push(c);
            self.error_message = None;
        }
    }

    /// Delete the last character
    pub fn delete_char(&mut self) {
        self.fields[self.selected_field].value.pop();
    }

    /// Clear the current field
    pub fn clear_field(&mut self) {
        self.fields[self.selected_field].value.zeroize();
    }

    /// Cycle the current selector by `step` options.
    pub fn cycle(&mut self, step: isize) {
        if let FieldKind::Choice { options, index } = &mut self.fields[self.selected_field].kind {
            if options.is_empty() {
                return;
            }
            let len = options.len() as isize;
            *index = (*index as isize + step).rem_euclid(len) as usize;
            self.error_message = None;
        }
    }

    /// Wipe all typed values and reset selectors.
    pub fn clear_sensitive(&mut self) {
        for field in &mut self.fields {
            field.value.zeroize();
            if let FieldKind::Choice { index, .. } = &mut field.kind {
                *index = 0;
            }
        }
        self.error_message = None;
        self.selected_field = 0;
    }

    /// Parse and bound-check every field.
    ///
    /// # Errors
    /// Returns the first invalid field.
    pub fn to_profile(&self) -> Result<ApplicantProfile, String> {
        let mut numbers = [0.0; 9];
        for (i, slot) in numbers.iter_mut().enumerate() {
            let field = &self.fields[i];
            *slot = if i == TERM_FIELD {
                field
                    .selected()?
                    .parse()
                    .map_err(|_| format!("{}: Invalid term", field.label))?
            } else {
                field.parse_number()?
            };
        }

        let mut categories = Vec::with_capacity(CATEGORICAL_FIELDS.len());
        for field in &self.fields[9..] {
            categories.push(field.selected()?);
        }
        let [education, employment_type, marital_status, has_mortgage, has_dependents, loan_purpose, has_co_signer]: [String; 7] =
            categories
                .try_into()
                .map_err(|_| "Form is missing categorical fields".to_string())?;

        Ok(ApplicantProfile {
            age: numbers[0],
            income: numbers[1],
            loan_amount: numbers[2],
            credit_score: numbers[3],
            months_employed: numbers[4],
            num_credit_lines: numbers[5],
            interest_rate: numbers[6],
            loan_term: numbers[7],
            dti_ratio: numbers[8],
            education,
            employment_type,
            marital_status,
            has_mortgage,
            has_dependents,
            loan_purpose,
            has_co_signer,
        })
    }

    /// Fill the form with a typical applicant.
    pub fn load_sample_data(&mut self) {
        let numbers = ["30", "50000", "15000", "700", "60", "2", "8", "", "0.40"];
        for (field, value) in self.fields.iter_mut().zip(numbers) {
            if matches!(field.kind, FieldKind::Number { .. }) {
                field.value = value.to_string();
            }
        }

        let choices = [
            "36",
            "High School",
            "Full-time",
            "Single",
            "No",
            "No",
            "Business",
            "No",
        ];
        let selectors = std::iter::once(TERM_FIELD).chain(9..self.fields.len());
        for (i, wanted) in selectors.zip(choices) {
            if let FieldKind::Choice { options, index } = &mut self.fields[i].kind {
                if let Some(pos) = options.iter().position(|o| o == wanted) {
                    *index = pos;
                }
            }
        }
        self.error_message = None;
    }
}

/// Render the loan application form
pub fn render_application_form(f: &mut Frame, area: Rect, state: &ApplicationFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer/error
        ])
        .split(area);

    render_form_header(f, chunks[0]);
    render_form_fields(f, chunks[1], state);
    render_form_footer(f, chunks[2], state);
}

fn render_form_header(f: &mut Frame, area: Rect) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", LendingTheme::text()),
        Span::styled("Loan Application", LendingTheme::title()),
        Span::styled(" │ Applicant and loan details", LendingTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(header, area);
}

fn render_form_fields(f: &mut Frame, area: Rect, state: &ApplicationFormState) {
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(area);

    // Financial details left, applicant profile right
    let mid = 9;
    render_field_column(f, columns[0], &state.fields[..mid], 0, state.selected_field);
    render_field_column(
        f,
        columns[1],
        &state.fields[mid..],
        mid,
        state.selected_field,
    );
}

fn render_field_column(
    f: &mut Frame,
    area: Rect,
    fields: &[FormField],
    offset: usize,
    selected: usize,
) {
    let constraints: Vec<Constraint> = fields
        .iter()
        .map(|_| Constraint::Length(3))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (i, field) in fields.iter().enumerate() {
        let is_selected = offset + i == selected;
        let (border_style, title_style) = if is_selected {
            (LendingTheme::border_focused(), LendingTheme::subtitle())
        } else {
            (LendingTheme::border(), LendingTheme::text_secondary())
        };

        let block = Block::default()
            .title(Span::styled(format!(" {} ", field.label), title_style))
            .borders(Borders::ALL)
            .border_style(border_style);

        let value = match field.display() {
            Some(v) => Span::styled(v, LendingTheme::text()),
            None if field.hint.is_empty() => Span::styled("-", LendingTheme::text_muted()),
            None => Span::styled(field.hint, LendingTheme::text_muted()),
        };

        let mut spans = vec![Span::raw(" ")];
        match &field.kind {
            FieldKind::Choice { .. } => {
                spans.push(Span::styled("◀ ", LendingTheme::key_hint()));
                spans.push(value);
                spans.push(Span::styled(" ▶", LendingTheme::key_hint()));
            }
            FieldKind::Number { .. } => {
                spans.push(value);
                if is_selected {
                    spans.push(Span::styled("▌", LendingTheme::border_focused()));
                }
            }
        }

        f.render_widget(Paragraph::new(Line::from(spans)).block(block), chunks[i]);
    }
}

fn render_form_footer(f: &mut Frame, area: Rect, state: &ApplicationFormState) {
    let content = if let Some(err) = &state.error_message {
        Line::from(vec![
            Span::styled("! ", LendingTheme::danger()),
            Span::styled(err.clone(), LendingTheme::danger()),
        ])
    } else {
        Line::from(vec![
            Span::styled("[↑↓] ", LendingTheme::key_hint()),
            Span::styled("Navigate ", LendingTheme::key_desc()),
            Span::styled("[←→] ", LendingTheme::key_hint()),
            Span::styled("Choose ", LendingTheme::key_desc()),
            Span::styled("[Enter] ", LendingTheme::key_hint()),
            Span::styled("Assess ", LendingTheme::key_desc()),
            Span::styled("[S] ", LendingTheme::key_hint()),
            Span::styled("Sample Data ", LendingTheme::key_desc()),
            Span::styled("[Esc] ", LendingTheme::key_hint()),
            Span::styled("Cancel", LendingTheme::key_desc()),
        ])
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(LendingTheme::border()),
    );

    f.render_widget(footer, area);
}
