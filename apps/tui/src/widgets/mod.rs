//! Reusable TUI widgets.

use std::time::Instant;

use amzwp_core::{Notification, NotificationKind};
use ratatui::prelude::*;
use ratatui::widgets::Paragraph;

/// Bottom status bar.
pub(crate) fn status_bar(msg: &str) -> Paragraph<'_> {
    Paragraph::new(format!(" {msg}")).style(Style::default().bg(Color::DarkGray).fg(Color::White))
}

/// A notification shown in place of the status bar until it expires.
#[derive(Debug, Clone)]
pub(crate) struct Toast {
    pub notification: Notification,
    pub shown_at: Instant,
}

impl Toast {
    pub(crate) fn new(notification: Notification) -> Self {
        Self {
            notification,
            shown_at: Instant::now(),
        }
    }

    pub(crate) fn is_expired(&self, now: Instant) -> bool {
        now.duration_since(self.shown_at) >= self.notification.duration
    }
}

/// Status-bar rendering of a toast.
pub(crate) fn toast_bar(toast: &Toast) -> Paragraph<'_> {
    let (icon, bg) = match toast.notification.kind {
        NotificationKind::Success => ("✓", Color::Green),
        NotificationKind::Error => ("✗", Color::Red),
    };
    Paragraph::new(format!(" {icon} {}", toast.notification.message)).style(
        Style::default()
            .bg(bg)
            .fg(Color::Black)
            .add_modifier(Modifier::BOLD),
    )
}

/// Create a centered rectangle with percentage width and height.
pub(crate) fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
