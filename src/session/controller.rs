//! Session controller: the only owner of `SessionState`.
//!
//! Every user intent is a method here (or a `Command` passed to `dispatch`), and every
//! method that changes the state writes it back through `SessionPersistence` before it
//! returns.

use super::clipboard::{Clipboard, SystemClipboard};
use super::persistence::SessionPersistence;
use super::state::{render_results, SessionState};
use crate::filter::FilterCategory;
use crate::lookup::{dedupe, input_lines, GeoLookup, ProviderProfile, QueryOrchestrator, SessionError};

pub const MSG_COPIED: &str = "查询结果已复制到剪贴板";
pub const MSG_CLEARED: &str = "数据已清除";
pub const MSG_NO_DUPLICATES: &str = "没有发现重复IP";

/// A discrete user intent coming from the view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    InputChanged(String),
    Query,
    Dedupe,
    Copy,
    Clear,
    ToggleFilter(FilterCategory),
}

/// What the view should show after a command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Feedback {
    /// Nothing beyond the (possibly updated) results view.
    View,
    /// A plain status line.
    Status(String),
    /// Text that was copied.
    Copied(String),
    /// Text for the user that went to no clipboard.
    Output(String),
    /// A user-visible failure.
    Error(SessionError),
}

pub struct SessionController {
    state: SessionState,
    persistence: SessionPersistence,
    lookup: Box<dyn GeoLookup>,
    profile: ProviderProfile,
    clipboard: Box<dyn Clipboard>,
}

impl SessionController {
    /// Start a session, rehydrating whatever the store remembers.
    pub fn restore(
        persistence: SessionPersistence,
        lookup: Box<dyn GeoLookup>,
        profile: ProviderProfile,
    ) -> Self {
        let state = persistence.load().unwrap_or_default();
        log::info!(
            "Session restored: {} input line(s), {} result(s), filter {}",
            input_lines(&state.input_text).len(),
            state.last_results.len(),
            state.active_filter,
        );
        Self {
            state,
            persistence,
            lookup,
            profile,
            clipboard: Box::new(SystemClipboard),
        }
    }

    pub fn with_clipboard(mut self, clipboard: Box<dyn Clipboard>) -> Self {
        self.clipboard = clipboard;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn profile(&self) -> &ProviderProfile {
        &self.profile
    }

    /// Route a command to its handler. Errors are contained here and come back as feedback.
    pub fn dispatch(&mut self, command: Command) -> Feedback {
        let outcome = match command {
            Command::InputChanged(text) => {
                self.on_input_changed(text);
                Ok(Feedback::View)
            }
            Command::Query => self.on_query_requested().map(|_| Feedback::View),
            Command::Dedupe => self.on_dedupe_requested().map(Feedback::Status),
            Command::Copy => self.on_copy_requested().map(|text| {
                if self.clipboard.is_pasteable() {
                    Feedback::Copied(text)
                } else {
                    Feedback::Output(text)
                }
            }),
            Command::Clear => Ok(Feedback::Status(self.on_clear_requested())),
            Command::ToggleFilter(category) => {
                self.on_filter_toggled(category);
                Ok(Feedback::View)
            }
        };
        outcome.unwrap_or_else(Feedback::Error)
    }

    pub fn on_input_changed(&mut self, text: String) {
        self.state.input_text = text;
        self.save();
    }

    /// Look up every input line and replace the stored results.
    ///
    /// Resets the active filter, since the previous selection belonged to other results.
    pub fn on_query_requested(&mut self) -> Result<(), SessionError> {
        let lines = input_lines(&self.state.input_text);
        let results = QueryOrchestrator::new(self.lookup.as_ref(), &self.profile).run_query(&lines)?;

        self.state.rendered_view = render_results(&results);
        self.state.last_results = results;
        self.state.active_filter = FilterCategory::All;
        self.save();
        Ok(())
    }

    /// Drop duplicate lines from the input, returning the status text.
    pub fn on_dedupe_requested(&mut self) -> Result<String, SessionError> {
        let lines = input_lines(&self.state.input_text);
        if lines.is_empty() {
            return Err(SessionError::EmptyInput);
        }

        let (unique, removed) = dedupe(&lines);
        self.state.input_text = unique.join("\n");
        let message = if removed > 0 {
            format!("已去除 {} 个重复IP", removed)
        } else {
            MSG_NO_DUPLICATES.to_string()
        };
        self.state.rendered_view = message.clone();
        self.save();
        Ok(message)
    }

    /// The visible result lines, one per line.
    pub fn copy_text(&self) -> Result<String, SessionError> {
        let visible = self.state.visible_results();
        if visible.is_empty() {
            return Err(SessionError::NothingToCopy);
        }
        Ok(visible
            .iter()
            .map(|r| r.display_line())
            .collect::<Vec<_>>()
            .join("\n"))
    }

    /// Put the visible result lines on the clipboard and return them.
    pub fn on_copy_requested(&mut self) -> Result<String, SessionError> {
        let text = self.copy_text()?;
        if self.clipboard.is_pasteable() {
            self.clipboard
                .set_text(&text)
                .map_err(SessionError::CopyFailure)?;
            log::info!("{}", MSG_COPIED);
        }
        Ok(text)
    }

    /// Wipe the session, in memory and in the store.
    pub fn on_clear_requested(&mut self) -> String {
        self.state = SessionState::default();
        self.persistence.clear();
        MSG_CLEARED.to_string()
    }

    /// Select `category`, or fall back to `All` when it is already the active one.
    pub fn on_filter_toggled(&mut self, category: FilterCategory) {
        self.state.active_filter = if self.state.active_filter == category {
            FilterCategory::All
        } else {
            category
        };
        self.state.rendered_view = render_results(&self.state.visible_results());
        self.save();
    }

    fn save(&mut self) {
        self.state.saved_at = Some(self.persistence.save(&self.state));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lookup::orchestrator::tests::ScriptedLookup;
    use crate::lookup::types::LookupError;
    use crate::session::clipboard::NoClipboard;
    use crate::session::state::NO_RESULTS;
    use crate::session::store::tests::FailingStore;
    use crate::session::store::JsonFileStore;
    use serde_json::json;
    use std::cell::RefCell;
    use std::path::PathBuf;
    use std::rc::Rc;
    use tempfile::TempDir;

    #[derive(Default, Clone)]
    struct RecordingClipboard {
        copied: Rc<RefCell<Vec<String>>>,
        fail: bool,
    }

    impl Clipboard for RecordingClipboard {
        fn set_text(&mut self, text: &str) -> Result<(), String> {
            if self.fail {
                return Err("clipboard unavailable".into());
            }
            self.copied.borrow_mut().push(text.to_string());
            Ok(())
        }
    }

    fn lookup() -> ScriptedLookup {
        ScriptedLookup::default()
            .ok("1.1.1.1", "中国", "江苏", "中国移动")
            .ok("2.2.2.2", "中国", "江苏", "中国电信")
            .ok("3.3.3.3", "中国", "香港", "PCCW")
            .with("9.9.9.9", Err(LookupError::Network("timed out".into())))
    }

    fn controller_at(path: PathBuf) -> SessionController {
        let persistence = SessionPersistence::new(Box::new(JsonFileStore::load_from(path)));
        SessionController::restore(persistence, Box::new(lookup()), ProviderProfile::qjqq())
            .with_clipboard(Box::new(RecordingClipboard::default()))
    }

    fn controller() -> (SessionController, TempDir) {
        let dir = TempDir::new().unwrap();
        let c = controller_at(dir.path().join("session.json"));
        (c, dir)
    }

    #[test]
    fn test_dedupe_scenario() {
        let (mut c, _dir) = controller();
        c.on_input_changed("1.1.1.1\n1.1.1.1\n8.8.8.8".into());
        assert_eq!(c.on_dedupe_requested().unwrap(), "已去除 1 个重复IP");
        assert_eq!(c.state().input_text, "1.1.1.1\n8.8.8.8");

        assert_eq!(c.on_dedupe_requested().unwrap(), MSG_NO_DUPLICATES);
    }

    #[test]
    fn test_empty_input() {
        let (mut c, _dir) = controller();
        c.on_input_changed("  \n\n".into());
        assert_eq!(c.on_query_requested(), Err(SessionError::EmptyInput));
        assert_eq!(c.on_dedupe_requested(), Err(SessionError::EmptyInput));
        assert!(c.state().last_results.is_empty());
    }

    #[test]
    fn test_query_renders_and_tolerates_failures() {
        let (mut c, _dir) = controller();
        c.on_input_changed("1.1.1.1\n9.9.9.9\n2.2.2.2".into());
        c.on_query_requested().unwrap();

        let state = c.state();
        assert_eq!(state.last_results.len(), 3);
        let lines: Vec<&str> = state.rendered_view.lines().collect();
        assert_eq!(lines[0], "1.1.1.1 => 中国-江苏-中国移动");
        assert!(lines[1].starts_with("9.9.9.9 => 查询失败: "));
        assert_eq!(lines[2], "2.2.2.2 => 中国-江苏-中国电信");
    }

    #[test]
    fn test_filter_toggle() {
        let (mut c, _dir) = controller();
        c.on_input_changed("1.1.1.1\n2.2.2.2\n3.3.3.3\n9.9.9.9".into());
        c.on_query_requested().unwrap();

        c.on_filter_toggled(FilterCategory::Mobile);
        assert_eq!(c.state().active_filter, FilterCategory::Mobile);
        assert_eq!(c.state().rendered_view, "1.1.1.1 => 中国-江苏-中国移动");

        // Switching replaces the active filter.
        c.on_filter_toggled(FilterCategory::Hmt);
        assert_eq!(c.state().active_filter, FilterCategory::Hmt);
        assert_eq!(c.state().rendered_view, "3.3.3.3 => 中国-香港-PCCW");

        // Toggling the active one restores the full view.
        c.on_filter_toggled(FilterCategory::Hmt);
        assert_eq!(c.state().active_filter, FilterCategory::All);
        assert_eq!(c.state().rendered_view.lines().count(), 4);

        c.on_filter_toggled(FilterCategory::Unicom);
        assert_eq!(c.state().rendered_view, NO_RESULTS);
    }

    #[test]
    fn test_copy_visible_results() {
        let dir = TempDir::new().unwrap();
        let clipboard = RecordingClipboard::default();
        let persistence =
            SessionPersistence::new(Box::new(JsonFileStore::load_from(dir.path().join("s.json"))));
        let mut c = SessionController::restore(persistence, Box::new(lookup()), ProviderProfile::qjqq())
            .with_clipboard(Box::new(clipboard.clone()));

        assert_eq!(c.on_copy_requested(), Err(SessionError::NothingToCopy));

        c.on_input_changed("1.1.1.1\n2.2.2.2".into());
        c.on_query_requested().unwrap();
        c.on_filter_toggled(FilterCategory::Telecom);

        let text = c.on_copy_requested().unwrap();
        assert_eq!(text, "2.2.2.2 => 中国-江苏-中国电信");
        assert_eq!(*clipboard.copied.borrow(), vec![text]);
    }

    #[test]
    fn test_copy_failure() {
        let (c, _dir) = controller();
        let mut c = c.with_clipboard(Box::new(RecordingClipboard { fail: true, ..Default::default() }));
        c.on_input_changed("1.1.1.1".into());
        c.on_query_requested().unwrap();

        match c.dispatch(Command::Copy) {
            Feedback::Error(SessionError::CopyFailure(msg)) => assert_eq!(msg, "clipboard unavailable"),
            other => panic!("unexpected feedback: {:?}", other),
        }
    }

    #[test]
    fn test_state_survives_restart() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        {
            let mut c = controller_at(path.clone());
            c.on_input_changed("1.1.1.1\n3.3.3.3".into());
            c.on_query_requested().unwrap();
            c.on_filter_toggled(FilterCategory::Hmt);
        }

        let c = controller_at(path);
        let state = c.state();
        assert_eq!(state.input_text, "1.1.1.1\n3.3.3.3");
        assert_eq!(state.last_results.len(), 2);
        assert_eq!(state.active_filter, FilterCategory::Hmt);
        assert_eq!(state.rendered_view, "3.3.3.3 => 中国-香港-PCCW");
        assert!(state.saved_at.is_some());
    }

    #[test]
    fn test_clear_forgets_everything() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("session.json");
        {
            let mut c = controller_at(path.clone());
            c.on_input_changed("1.1.1.1".into());
            c.on_query_requested().unwrap();
            assert_eq!(c.on_clear_requested(), MSG_CLEARED);
            assert_eq!(*c.state(), SessionState::default());
        }
        assert_eq!(*controller_at(path).state(), SessionState::default());
    }

    #[test]
    fn test_new_query_resets_filter() {
        let (mut c, _dir) = controller();
        c.on_input_changed("1.1.1.1".into());
        c.on_query_requested().unwrap();
        c.on_filter_toggled(FilterCategory::Mobile);
        c.on_query_requested().unwrap();
        assert_eq!(c.state().active_filter, FilterCategory::All);
    }

    #[test]
    fn test_dispatch_routes_commands() {
        let (mut c, _dir) = controller();
        assert_eq!(c.dispatch(Command::Query), Feedback::Error(SessionError::EmptyInput));
        assert_eq!(c.dispatch(Command::InputChanged("1.1.1.1\n1.1.1.1".into())), Feedback::View);
        assert_eq!(
            c.dispatch(Command::Dedupe),
            Feedback::Status("已去除 1 个重复IP".into())
        );
        assert_eq!(c.dispatch(Command::Query), Feedback::View);
        assert_eq!(c.dispatch(Command::ToggleFilter(FilterCategory::Mobile)), Feedback::View);
        assert_eq!(
            c.dispatch(Command::Copy),
            Feedback::Copied("1.1.1.1 => 中国-江苏-中国移动".into())
        );
        assert_eq!(c.dispatch(Command::Clear), Feedback::Status(MSG_CLEARED.into()));
    }

    #[test]
    fn test_provider_message_reaches_view() {
        let lookup = ScriptedLookup::default()
            .with("9.9.9.9", Ok(json!({"code": 429, "msg": "请求过于频繁"})));
        let dir = TempDir::new().unwrap();
        let persistence =
            SessionPersistence::new(Box::new(JsonFileStore::load_from(dir.path().join("s.json"))));
        let mut c = SessionController::restore(persistence, Box::new(lookup), ProviderProfile::qjqq());
        c.on_input_changed("9.9.9.9".into());
        c.on_query_requested().unwrap();
        assert_eq!(c.state().rendered_view, "9.9.9.9 => 查询失败: 请求过于频繁");
    }

    #[test]
    fn test_copy_without_clipboard_is_output() {
        let (c, _dir) = controller();
        let mut c = c.with_clipboard(Box::new(NoClipboard));
        c.on_input_changed("1.1.1.1".into());
        c.on_query_requested().unwrap();
        assert_eq!(
            c.dispatch(Command::Copy),
            Feedback::Output("1.1.1.1 => 中国-江苏-中国移动".into())
        );
    }

    #[test]
    fn test_store_failures_do_not_interrupt_session() {
        let persistence = SessionPersistence::new(Box::new(FailingStore));
        let mut c = SessionController::restore(persistence, Box::new(lookup()), ProviderProfile::qjqq())
            .with_clipboard(Box::new(RecordingClipboard::default()));
        assert_eq!(*c.state(), SessionState::default());

        c.on_input_changed("1.1.1.1\n3.3.3.3".into());
        c.on_query_requested().unwrap();
        assert_eq!(c.state().last_results.len(), 2);
        assert!(c.state().saved_at.is_some());

        c.on_filter_toggled(FilterCategory::Hmt);
        assert_eq!(c.state().rendered_view, "3.3.3.3 => 中国-香港-PCCW");

        assert_eq!(c.on_clear_requested(), MSG_CLEARED);
        assert_eq!(*c.state(), SessionState::default());
    }
}
