//! Application logic for AmzWP.
//!
//! This crate holds the credential obfuscation, the WordPress connection test,
//! the persisted application store, the configuration panel, and view routing.
//! Frontends (`amzwp`, `amzwp-tui`) drive these with their own I/O.

pub mod connection;
pub mod editor;
pub mod panel;
pub mod router;
pub mod secure;
pub mod store;

pub use connection::{ConnectionOptions, ConnectionStatus, test_connection};
pub use editor::EditorResource;
pub use panel::{ConfigPanel, Notification, NotificationKind, PanelTab, TestStatus};
pub use router::{View, back_to_sitemap, current_view, open_post, route, switch_post};
pub use secure::{SecureStorage, decrypt_secrets, encrypt_secrets, is_secret_field, mask_secret};
pub use store::{AppStore, StateChange};
