use std::collections::{HashMap, HashSet};
use std::path::PathBuf;

use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender};
use tracing::{debug, warn};

use crate::error::FillError;
use crate::matcher::matching_forms;
use crate::protocol::{ContentReply, CoreMessage, ViewId};
use crate::store::RuleStore;
use crate::types::FormSpec;

/// Events the coordinator surfaces to the host UI.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Informational message to show for a view (status line, notification).
    Notice { view: ViewId, message: String },

    /// Present a profile selection menu. Entries are profile names in
    /// rule-file order; the user's pick comes back through
    /// [`FillCoordinator::choose`] as an index into this list.
    Menu { view: ViewId, entries: Vec<String> },

    /// Open the rule file in the user's editor.
    EditRules { path: PathBuf },
}

/// Per-view interaction state. Exactly one mode is live per view; every
/// protocol failure and every completed interaction lands back on `Idle`.
#[derive(Debug)]
enum Mode {
    Idle,
    /// A `Filter` message is out, waiting for the applicable subset.
    AwaitingFilter { forms: Vec<FormSpec> },
    /// The menu is up, waiting for the user's pick.
    AwaitingChoice { candidates: Vec<FormSpec> },
    /// An element-capture session is live on the content side.
    Capturing,
}

struct ViewHandle {
    tx: UnboundedSender<CoreMessage>,
    mode: Mode,
}

/// Orchestrates the fill and capture operations against the per-view
/// content modules.
///
/// Every operation starts from a fresh read of the rule file, matches the
/// current page address, and hands the resulting form specs to the view's
/// content module over its channel. Replies come back through
/// [`handle_reply`](Self::handle_reply); a reply for a view that no longer
/// exists, or that arrives in a mode that no longer expects it, is dropped
/// silently.
pub struct FillCoordinator {
    store: RuleStore,
    views: HashMap<ViewId, ViewHandle>,
    events: UnboundedSender<UiEvent>,
}

impl FillCoordinator {
    /// Create a coordinator around a rule store. The returned receiver
    /// carries the [`UiEvent`]s the host must render.
    #[must_use]
    pub fn new(store: RuleStore) -> (Self, UnboundedReceiver<UiEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        (
            Self {
                store,
                views: HashMap::new(),
                events,
            },
            rx,
        )
    }

    #[must_use]
    pub fn store(&self) -> &RuleStore {
        &self.store
    }

    /// Register a page view. The host drains the returned receiver and
    /// forwards each message to that view's content module.
    pub fn attach_view(&mut self, view: ViewId) -> UnboundedReceiver<CoreMessage> {
        let (tx, rx) = mpsc::unbounded_channel();
        self.views.insert(view, ViewHandle { tx, mode: Mode::Idle });
        rx
    }

    /// Drop a view. Any reply still in flight for it becomes a no-op.
    pub fn detach_view(&mut self, view: ViewId) {
        self.views.remove(&view);
    }

    // -- Fill operations ----------------------------------------------------

    /// Fill the first usable form on the page, without interaction.
    ///
    /// # Errors
    ///
    /// Returns [`FillError::NoRulesMatched`] if no stored rule matches
    /// `uri`; nothing is sent to the content module in that case.
    pub fn fast_fill(&mut self, view: ViewId, uri: &str) -> Result<(), FillError> {
        let rules = self.store.load_or_empty();
        let forms = matching_forms(&rules, uri);
        if forms.is_empty() {
            return Err(FillError::NoRulesMatched);
        }
        self.send(view, CoreMessage::FillFast { forms });
        Ok(())
    }

    /// Start a menu fill: ask the content module which of the matched specs
    /// are applicable, then (on its reply) offer the profiled ones.
    ///
    /// # Errors
    ///
    /// Returns [`FillError::NoRulesMatched`] if no stored rule matches
    /// `uri`; nothing is sent to the content module in that case.
    pub fn menu_fill(&mut self, view: ViewId, uri: &str) -> Result<(), FillError> {
        let rules = self.store.load_or_empty();
        let forms = matching_forms(&rules, uri);
        if forms.is_empty() {
            return Err(FillError::NoRulesMatched);
        }
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "menu fill for an unknown view, dropping");
            return Ok(());
        };
        handle.mode = Mode::AwaitingFilter {
            forms: forms.clone(),
        };
        if handle.tx.send(CoreMessage::Filter { forms }).is_err() {
            debug!(?view, "content channel closed, dropping filter request");
            handle.mode = Mode::Idle;
        }
        Ok(())
    }

    /// Apply the menu entry the user picked. `index` is the position in the
    /// entries of the [`UiEvent::Menu`] shown for this view.
    pub fn choose(&mut self, view: ViewId, index: usize) {
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "menu choice for an unknown view, dropping");
            return;
        };
        match std::mem::replace(&mut handle.mode, Mode::Idle) {
            Mode::AwaitingChoice { candidates } => match candidates.into_iter().nth(index) {
                Some(form) => {
                    if handle.tx.send(CoreMessage::ApplyForm { form }).is_err() {
                        debug!(?view, "content channel closed, dropping chosen form");
                    }
                }
                None => debug!(?view, index, "menu choice out of range, ignoring"),
            },
            other => {
                handle.mode = other;
                debug!(?view, "menu choice outside menu mode, ignoring");
            }
        }
    }

    /// Dismiss the menu for a view without applying anything.
    pub fn dismiss_menu(&mut self, view: ViewId) {
        if let Some(handle) = self.views.get_mut(&view) {
            if matches!(
                handle.mode,
                Mode::AwaitingFilter { .. } | Mode::AwaitingChoice { .. }
            ) {
                handle.mode = Mode::Idle;
            }
        }
    }

    // -- Capture (add-new-rule) ---------------------------------------------

    /// Begin capturing a new rule from a manually selected page element.
    pub fn begin_capture(&mut self, view: ViewId) {
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "capture request for an unknown view, dropping");
            return;
        };
        handle.mode = Mode::Capturing;
        if handle.tx.send(CoreMessage::Enter).is_err() {
            debug!(?view, "content channel closed, abandoning capture");
            handle.mode = Mode::Idle;
        }
    }

    /// Forward a change of the capture session's filter text.
    pub fn capture_changed(&mut self, view: ViewId, text: impl Into<String>) {
        self.send_capturing(view, CoreMessage::Changed { text: text.into() });
    }

    /// Move the capture focus forward (`+1`) or back (`-1`).
    pub fn capture_focus(&mut self, view: ViewId, step: i32) {
        self.send_capturing(view, CoreMessage::Focus { step });
    }

    /// Confirm the currently focused element; the content module answers
    /// with [`ContentReply::Add`].
    pub fn capture_confirm(&mut self, view: ViewId) {
        self.send_capturing(view, CoreMessage::Select);
    }

    /// Abort the capture session.
    pub fn cancel_capture(&mut self, view: ViewId) {
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "capture cancel for an unknown view, dropping");
            return;
        };
        if matches!(handle.mode, Mode::Capturing) {
            handle.mode = Mode::Idle;
            let _ = handle.tx.send(CoreMessage::Leave);
        }
    }

    // -- Other commands -----------------------------------------------------

    /// Ask the host to open the rule file in the user's editor.
    pub fn edit_rules(&self) {
        let _ = self.events.send(UiEvent::EditRules {
            path: self.store.path().to_owned(),
        });
    }

    // -- Reply dispatch -----------------------------------------------------

    /// Process one reply from a content module. Never fails: stale and
    /// unknown replies are dropped, failures reset the view to idle.
    pub fn handle_reply(&mut self, reply: ContentReply) {
        match reply {
            ContentReply::Filtered { view, indices } => self.on_filtered(view, indices),
            ContentReply::Failed { view, message } => self.on_failed(view, message),
            ContentReply::Add { view, fragment } => self.on_add(view, fragment),
        }
    }

    fn on_filtered(&mut self, view: ViewId, indices: Vec<usize>) {
        let events = self.events.clone();
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "filter reply for an unknown view, dropping");
            return;
        };
        let forms = match std::mem::replace(&mut handle.mode, Mode::Idle) {
            Mode::AwaitingFilter { forms } => forms,
            other => {
                handle.mode = other;
                debug!(?view, "stale filter reply, dropping");
                return;
            }
        };

        // The reply selects from the list we sent; out-of-range or repeated
        // indices are dropped, and our file order wins over reply order.
        let wanted: HashSet<usize> = indices.into_iter().collect();
        let candidates: Vec<FormSpec> = forms
            .into_iter()
            .enumerate()
            .filter(|(i, form)| wanted.contains(i) && form.is_profiled())
            .map(|(_, form)| form)
            .collect();

        if candidates.is_empty() {
            let _ = events.send(UiEvent::Notice {
                view,
                message: FillError::NoProfiledForms.to_string(),
            });
            return;
        }

        let entries: Vec<String> = candidates
            .iter()
            .filter_map(|form| form.profile.clone())
            .collect();
        handle.mode = Mode::AwaitingChoice { candidates };
        let _ = events.send(UiEvent::Menu { view, entries });
    }

    fn on_failed(&mut self, view: ViewId, message: String) {
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "failure reply for an unknown view, dropping");
            return;
        };
        handle.mode = Mode::Idle;
        warn!(?view, %message, "content module reported failure");
        let _ = self.events.send(UiEvent::Notice { view, message });
    }

    fn on_add(&mut self, view: ViewId, fragment: String) {
        let Some(handle) = self.views.get_mut(&view) else {
            debug!(?view, "captured fragment for an unknown view, dropping");
            return;
        };
        if !matches!(handle.mode, Mode::Capturing) {
            debug!(?view, "captured fragment outside capture mode, dropping");
            return;
        }
        handle.mode = Mode::Idle;

        match self.store.append(&fragment) {
            Ok(()) => {
                let _ = self.events.send(UiEvent::EditRules {
                    path: self.store.path().to_owned(),
                });
            }
            Err(err) => {
                warn!(%err, "failed to append captured rule fragment");
                let _ = self.events.send(UiEvent::Notice {
                    view,
                    message: format!("could not save captured rule: {err}"),
                });
            }
        }
    }

    // -- Internals ----------------------------------------------------------

    fn send(&self, view: ViewId, msg: CoreMessage) {
        match self.views.get(&view) {
            Some(handle) => {
                if handle.tx.send(msg).is_err() {
                    debug!(?view, "content channel closed, dropping message");
                }
            }
            None => debug!(?view, "message for an unknown view, dropping"),
        }
    }

    fn send_capturing(&self, view: ViewId, msg: CoreMessage) {
        match self.views.get(&view) {
            Some(handle) if matches!(handle.mode, Mode::Capturing) => {
                if handle.tx.send(msg).is_err() {
                    debug!(?view, "content channel closed, dropping capture message");
                }
            }
            Some(_) => debug!(?view, "capture message outside capture mode, ignoring"),
            None => debug!(?view, "capture message for an unknown view, dropping"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coordinator_with_rules(
        text: &str,
    ) -> (
        FillCoordinator,
        UnboundedReceiver<UiEvent>,
        tempfile::TempDir,
    ) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("rules");
        std::fs::write(&path, text).unwrap();
        let (coordinator, events) = FillCoordinator::new(RuleStore::new(path));
        (coordinator, events, dir)
    }

    const TWO_PROFILES: &str = r#"
on "example.com" {
    form "work" { input { name = "user", value = "alice" } }
    form "home" { input { name = "user", value = "bob" } }
    form { input { name = "user", value = "anon" } }
}
"#;

    #[test]
    fn fast_fill_sends_matched_forms_in_order() {
        let (mut coordinator, _events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.fast_fill(view, "https://example.com/login").unwrap();

        match content.try_recv().unwrap() {
            CoreMessage::FillFast { forms } => {
                assert_eq!(forms.len(), 3);
                assert_eq!(forms[0].profile.as_deref(), Some("work"));
                assert_eq!(forms[1].profile.as_deref(), Some("home"));
                assert_eq!(forms[2].profile, None);
            }
            other => panic!("expected FillFast, got {other:?}"),
        }
    }

    #[test]
    fn fast_fill_without_match_sends_nothing() {
        let (mut coordinator, _events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        let err = coordinator.fast_fill(view, "https://other.net/").unwrap_err();
        assert!(matches!(err, FillError::NoRulesMatched));
        assert!(content.try_recv().is_err());
    }

    #[test]
    fn fast_fill_with_missing_rule_file_reports_no_match() {
        let dir = tempfile::tempdir().unwrap();
        let (mut coordinator, _events) =
            FillCoordinator::new(RuleStore::new(dir.path().join("rules")));
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);

        let err = coordinator.fast_fill(view, "https://example.com/").unwrap_err();
        assert!(matches!(err, FillError::NoRulesMatched));
    }

    #[test]
    fn fast_fill_with_broken_rule_file_reports_no_match() {
        let (mut coordinator, _events, _dir) =
            coordinator_with_rules("on \"example.com\" { form {");
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);

        let err = coordinator.fast_fill(view, "https://example.com/").unwrap_err();
        assert!(matches!(err, FillError::NoRulesMatched));
    }

    #[test]
    fn menu_fill_offers_only_profiled_forms() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.menu_fill(view, "https://example.com/").unwrap();
        let sent = match content.try_recv().unwrap() {
            CoreMessage::Filter { forms } => forms,
            other => panic!("expected Filter, got {other:?}"),
        };
        assert_eq!(sent.len(), 3);

        // Content module confirms all three; only the two profiled ones
        // may appear in the menu.
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![0, 1, 2],
        });
        match events.try_recv().unwrap() {
            UiEvent::Menu { entries, .. } => assert_eq!(entries, ["work", "home"]),
            other => panic!("expected Menu, got {other:?}"),
        }

        coordinator.choose(view, 1);
        match content.try_recv().unwrap() {
            CoreMessage::ApplyForm { form } => {
                assert_eq!(form.profile.as_deref(), Some("home"));
            }
            other => panic!("expected ApplyForm, got {other:?}"),
        }
    }

    #[test]
    fn menu_fill_all_unprofiled_reports_no_profiled_forms() {
        let (mut coordinator, mut events, _dir) =
            coordinator_with_rules(r#"on "example.com" { form { } form { } }"#);
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);

        coordinator.menu_fill(view, "https://example.com/").unwrap();
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![0, 1],
        });

        match events.try_recv().unwrap() {
            UiEvent::Notice { message, .. } => {
                assert_eq!(message, "no forms with profile names found");
            }
            other => panic!("expected Notice, got {other:?}"),
        }
    }

    #[test]
    fn filtered_reply_ignores_out_of_range_indices() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);

        coordinator.menu_fill(view, "https://example.com/").unwrap();
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![1, 99, 1],
        });

        match events.try_recv().unwrap() {
            UiEvent::Menu { entries, .. } => assert_eq!(entries, ["home"]),
            other => panic!("expected Menu, got {other:?}"),
        }
    }

    #[test]
    fn stale_filtered_reply_is_ignored() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);

        // No menu fill in flight; a filtered reply must do nothing.
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![0],
        });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn dismissed_menu_ignores_choice() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.menu_fill(view, "https://example.com/").unwrap();
        let _ = content.try_recv();
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![0, 1],
        });
        let _ = events.try_recv();

        coordinator.dismiss_menu(view);
        coordinator.choose(view, 0);
        assert!(content.try_recv().is_err());
    }

    #[test]
    fn reply_for_unknown_view_is_ignored() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);

        coordinator.handle_reply(ContentReply::Failed {
            view: ViewId(42),
            message: "view is gone".into(),
        });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn failure_reply_resets_mode_and_surfaces_message() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.menu_fill(view, "https://example.com/").unwrap();
        let _ = content.try_recv();

        coordinator.handle_reply(ContentReply::Failed {
            view,
            message: "document went away".into(),
        });
        match events.try_recv().unwrap() {
            UiEvent::Notice { message, .. } => assert_eq!(message, "document went away"),
            other => panic!("expected Notice, got {other:?}"),
        }

        // The pending filter state is gone; a late reply is now stale.
        coordinator.handle_reply(ContentReply::Filtered {
            view,
            indices: vec![0],
        });
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn capture_flow_appends_fragment_and_opens_editor() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules("");
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.begin_capture(view);
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Enter);

        coordinator.capture_changed(view, "user");
        coordinator.capture_focus(view, 1);
        coordinator.capture_focus(view, -1);
        coordinator.capture_confirm(view);
        assert_eq!(
            content.try_recv().unwrap(),
            CoreMessage::Changed { text: "user".into() }
        );
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Focus { step: 1 });
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Focus { step: -1 });
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Select);

        let fragment = r#"on "example.com" { form { input { name = "user" } } }"#;
        coordinator.handle_reply(ContentReply::Add {
            view,
            fragment: fragment.into(),
        });

        match events.try_recv().unwrap() {
            UiEvent::EditRules { path } => {
                assert_eq!(path, coordinator.store().path());
            }
            other => panic!("expected EditRules, got {other:?}"),
        }
        let rules = coordinator.store().load().unwrap();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].pattern, "example\\.com");
    }

    #[test]
    fn capture_messages_outside_capture_mode_are_dropped() {
        let (mut coordinator, _events, _dir) = coordinator_with_rules("");
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.capture_changed(view, "user");
        coordinator.capture_confirm(view);
        assert!(content.try_recv().is_err());
    }

    #[test]
    fn cancel_capture_sends_leave_and_idles() {
        let (mut coordinator, mut events, _dir) = coordinator_with_rules("");
        let view = ViewId(1);
        let mut content = coordinator.attach_view(view);

        coordinator.begin_capture(view);
        coordinator.cancel_capture(view);
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Enter);
        assert_eq!(content.try_recv().unwrap(), CoreMessage::Leave);

        // A fragment arriving after cancellation must not be written.
        coordinator.handle_reply(ContentReply::Add {
            view,
            fragment: "on \"x\" { }".into(),
        });
        assert!(events.try_recv().is_err());
        assert!(coordinator.store().load().unwrap().is_empty());
    }

    #[test]
    fn detached_view_swallows_operations() {
        let (mut coordinator, _events, _dir) = coordinator_with_rules(TWO_PROFILES);
        let view = ViewId(1);
        let _content = coordinator.attach_view(view);
        coordinator.detach_view(view);

        // Matching still happens, but the send is a silent no-op.
        coordinator.fast_fill(view, "https://example.com/").unwrap();
        coordinator.handle_reply(ContentReply::Failed {
            view,
            message: "late".into(),
        });
    }

    #[test]
    fn edit_rules_emits_editor_event() {
        let (coordinator, mut events, _dir) = coordinator_with_rules("");
        coordinator.edit_rules();
        match events.try_recv().unwrap() {
            UiEvent::EditRules { path } => assert_eq!(path, coordinator.store().path()),
            other => panic!("expected EditRules, got {other:?}"),
        }
    }
}
