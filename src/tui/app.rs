//! Main TUI application state machine.
//!
//! Handles:
//! - Screen navigation
//! - Input event handling
//! - Service integration

use std::io;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout},
    Terminal,
};

use crate::adapters::FsArtifactStore;
use crate::application::PredictionService;
use crate::config::AppConfig;

use super::ui::{
    application::{render_application_form, ApplicationFormState},
    assessment::{render_assessment, AssessmentState},
    dashboard::{render_dashboard, DashboardState},
    render_disclaimer,
};

/// Current screen/view in the application
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Dashboard,
    ApplicationForm,
    Assessment,
}

/// Main application state
pub struct App {
    screen: Screen,
    should_quit: bool,

    /// Loaded model, or why it could not be loaded
    service: std::result::Result<PredictionService, String>,

    dashboard_state: DashboardState,
    form_state: ApplicationFormState,
    assessment_state: AssessmentState,
}

impl App {
    /// Load artifacts as configured and build the application.
    ///
    /// A load failure does not stop the UI; it is shown on the dashboard.
    #[must_use]
    pub fn new(config: &AppConfig) -> Self {
        let store =
            FsArtifactStore::new(&config.artifact_dir).require_manifest(config.require_manifest);
        let service = PredictionService::from_store(&store).map_err(|e| {
            tracing::error!("Model artifacts unavailable: {}", e);
            e.to_string()
        });
        Self::with_service(service, config.artifact_dir.display().to_string())
    }

    /// Create application with an already built service (Composition Root pattern).
    #[must_use]
    pub fn with_service(
        service: std::result::Result<PredictionService, String>,
        artifact_dir: String,
    ) -> Self {
        let mut dashboard_state = DashboardState {
            artifact_dir,
            ..DashboardState::default()
        };
        match &service {
            Ok(svc) => {
                dashboard_state.n_features = svc.context().feature_names().len();
                dashboard_state.threshold = svc.context().threshold();
            }
            Err(e) => dashboard_state.artifact_error = Some(e.clone()),
        }

        let mut app = Self {
            screen: Screen::Dashboard,
            should_quit: false,
            service,
            dashboard_state,
            form_state: ApplicationFormState::new(None),
            assessment_state: AssessmentState::default(),
        };
        app.form_state = app.fresh_form();
        app
    }

    #[must_use]
    pub fn screen(&self) -> Screen {
        self.screen
    }

    fn fresh_form(&self) -> ApplicationFormState {
        ApplicationFormState::new(self.service.as_ref().ok().map(|s| s.context().catalog()))
    }

    /// Run the main application loop.
    ///
    /// # Errors
    /// Returns error if terminal operations fail.
    pub fn run(&mut self) -> Result<()> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;

        let result = self.main_loop(&mut terminal);

        // Restore terminal
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        result
    }

    fn main_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|f| {
                let chunks = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(0), Constraint::Length(3)])
                    .split(f.area());

                match self.screen {
                    Screen::Dashboard => render_dashboard(f, chunks[0], &self.dashboard_state),
                    Screen::ApplicationForm => {
                        render_application_form(f, chunks[0], &self.form_state);
                    }
                    Screen::Assessment => {
                        render_assessment(f, chunks[0], &self.assessment_state);
                    }
                }

                render_disclaimer(f, chunks[1]);
            })?;

            if event::poll(Duration::from_millis(100))? {
                if let Event::Key(key) = event::read()? {
                    self.handle_key(key.code, key.modifiers);
                }
            }

            if self.should_quit {
                break;
            }
        }

        Ok(())
    }

    pub fn handle_key(&mut self, key: KeyCode, modifiers: KeyModifiers) {
        if key == KeyCode::Char('q') && modifiers.contains(KeyModifiers::CONTROL) {
            self.should_quit = true;
            return;
        }

        match self.screen {
            Screen::Dashboard => self.handle_dashboard_key(key),
            Screen::ApplicationForm => self.handle_form_key(key),
            Screen::Assessment => self.handle_assessment_key(key),
        }
    }

    fn handle_dashboard_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Char('n' | 'N') => self.open_form(),
            KeyCode::Char('r' | 'R') => {
                self.dashboard_state.tally = Default::default();
            }
            KeyCode::Char('q' | 'Q') => {
                self.should_quit = true;
            }
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyCode) {
        match key {
            KeyCode::Esc => {
                self.form_state.clear_sensitive();
                self.screen = Screen::Dashboard;
            }
            KeyCode::Up | KeyCode::BackTab => self.form_state.prev_field(),
            KeyCode::Down | KeyCode::Tab => self.form_state.next_field(),
            KeyCode::Left => self.form_state.cycle(-1),
            KeyCode::Right => self.form_state.cycle(1),
            KeyCode::Char('s' | 'S') => self.form_state.load_sample_data(),
            KeyCode::Char(c) => self.form_state.input_char(c),
            KeyCode::Backspace => self.form_state.delete_char(),
            KeyCode::Delete => self.form_state.clear_field(),
            KeyCode::Enter => self.submit_application(),
            _ => {}
        }
    }

    fn handle_assessment_key(&mut self, key: KeyCode) {
        let complete = matches!(self.assessment_state, AssessmentState::Complete { .. });
        let rejected = matches!(self.assessment_state, AssessmentState::InputError { .. });

        match key {
            KeyCode::Char('n' | 'N') if complete => self.open_form(),
            KeyCode::Enter if rejected => {
                self.screen = Screen::ApplicationForm;
            }
            KeyCode::Enter | KeyCode::Esc => {
                self.screen = Screen::Dashboard;
            }
            _ => {}
        }
    }

    fn open_form(&mut self) {
        self.form_state = self.fresh_form();
        self.screen = Screen::ApplicationForm;
    }

    fn submit_application(&mut self) {
        let service = match &self.service {
            Ok(service) => service,
            Err(e) => {
                self.assessment_state = AssessmentState::ConfigurationError {
                    message: format!("Model artifacts unavailable: {e}"),
                };
                self.form_state.clear_sensitive();
                self.screen = Screen::Assessment;
                return;
            }
        };

        let profile = match self.form_state.to_profile() {
            Ok(profile) => profile,
            Err(e) => {
                self.form_state.error_message = Some(e);
                return;
            }
        };
        if let Err(errors) = profile.validate() {
            self.form_state.error_message = Some(errors.join(", "));
            return;
        }

        self.assessment_state = match service.assess_profile(&profile) {
            Ok(assessment) => {
                self.dashboard_state.tally.record(assessment.recommendation);
                AssessmentState::Complete { assessment }
            }
            Err(e) if e.is_recoverable() => AssessmentState::InputError {
                message: e.to_string(),
            },
            Err(e) => AssessmentState::ConfigurationError {
                message: e.to_string(),
            },
        };

        self.form_state.clear_sensitive();
        self.screen = Screen::Assessment;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::application::{train, ModelContext, TrainingConfig};
    use crate::application::training::tests::synthetic_dataset;

    fn trained_app() -> App {
        let outcome = train(&synthetic_dataset(300, 21), &TrainingConfig::default()).expect("train");
        let context = ModelContext::new(outcome.artifacts).expect("context");
        App::with_service(
            Ok(PredictionService::new(Arc::new(context))),
            "models".to_string(),
        )
    }

    fn press(app: &mut App, key: KeyCode) {
        app.handle_key(key, KeyModifiers::NONE);
    }

    #[test]
    fn test_submit_sample_application() {
        let mut app = trained_app();
        press(&mut app, KeyCode::Char('n'));
        assert_eq!(app.screen(), Screen::ApplicationForm);

        press(&mut app, KeyCode::Char('s'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Assessment);
        assert!(matches!(
            app.assessment_state,
            AssessmentState::Complete { .. }
        ));
        assert_eq!(app.dashboard_state.tally.total(), 1);
        assert!(app.form_state.fields.iter().all(|f| f.value.is_empty()));
    }

    #[test]
    fn test_incomplete_form_stays_open() {
        let mut app = trained_app();
        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::ApplicationForm);
        assert!(app.form_state.error_message.is_some());
    }

    #[test]
    fn test_missing_artifacts_reports_configuration_error() {
        let mut app = App::with_service(Err("missing model.json".into()), "models".into());
        assert!(app.dashboard_state.artifact_error.is_some());

        press(&mut app, KeyCode::Char('n'));
        press(&mut app, KeyCode::Enter);

        assert_eq!(app.screen(), Screen::Assessment);
        assert!(matches!(
            app.assessment_state,
            AssessmentState::ConfigurationError { .. }
        ));

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.screen(), Screen::Dashboard);
    }

    #[test]
    fn test_quit() {
        let mut app = App::with_service(Err("none".into()), "models".into());
        app.handle_key(KeyCode::Char('q'), KeyModifiers::CONTROL);
        assert!(app.should_quit);
    }
}
