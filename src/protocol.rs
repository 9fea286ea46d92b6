//! Messages exchanged with the content-matching module.
//!
//! The content module runs in a separate, untrusted execution context, one
//! per page view. Everything crossing that boundary is a one-way message:
//! the core sends [`CoreMessage`]s down a per-view channel and the host
//! routes [`ContentReply`]s back, correlated by [`ViewId`]. There is no
//! blocking wait anywhere, so replies can arrive long after the view that
//! prompted them is gone; the coordinator drops those on the floor.

use serde::{Deserialize, Serialize};

use crate::types::FormSpec;

/// Identifies one page view (tab) on the content side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ViewId(pub u64);

/// Core → content.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CoreMessage {
    /// Apply the first spec whose attribute patterns match a form on the
    /// page; the content module does the searching.
    FillFast { forms: Vec<FormSpec> },

    /// Report which of these specs are applicable to the page, for menu
    /// presentation. Answered with [`ContentReply::Filtered`].
    Filter { forms: Vec<FormSpec> },

    /// Apply exactly this spec; sent after the user picked it from the menu.
    ApplyForm { form: FormSpec },

    /// Begin an element-capture session: start listening for in-page
    /// focus/selection.
    Enter,

    /// Replace the capture session's filter text.
    Changed { text: String },

    /// End the capture session without capturing anything.
    Leave,

    /// Capture the currently focused element. Answered with
    /// [`ContentReply::Add`].
    Select,

    /// Move the capture focus forward (`+1`) or back (`-1`).
    Focus { step: i32 },
}

/// Content → core.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentReply {
    /// Indices into the [`Filter`](CoreMessage::Filter) payload that are
    /// applicable on the page. The content module only ever selects from
    /// the list the core sent it; it cannot inject specs of its own.
    Filtered { view: ViewId, indices: Vec<usize> },

    /// The current mode failed on the content side (view torn down, DOM
    /// query failed). Aborts the mode; the message is shown to the user.
    Failed { view: ViewId, message: String },

    /// A rule fragment generated from a manually selected element, ready to
    /// be appended to the rule file.
    Add { view: ViewId, fragment: String },
}
