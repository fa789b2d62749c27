//! TUI screen definitions.
//!
//! Each screen owns its own view state and rendering. Key handlers never
//! touch the application store; they return an [`Action`] that the app
//! applies.

pub(crate) mod config_panel;
pub(crate) mod editor;
pub(crate) mod landing;
pub(crate) mod scanner;

use amzwp_shared::BlogPost;

/// What a key press asks the application to do.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Action {
    None,
    /// Leave the landing page.
    Enter,
    /// Scan the sitemap of the given site URL.
    StartScan(String),
    /// Open a post in the editor.
    OpenPost(BlogPost),
    /// Leave the editor for the post list.
    Back,
    /// Move to the post `n` positions away in the sitemap.
    SwitchPost(isize),
    /// Fetch the current preview again.
    ReloadPreview,
    /// Panel: discard the draft.
    ClosePanel,
    /// Panel: commit the draft.
    SavePanel,
    /// Panel: test the WordPress connection with the draft.
    TestConnection,
    /// Show an error toast.
    Error(String),
}
