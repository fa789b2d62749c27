//! Landing screen shown until the user enters the workspace.

use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::Action;

pub(crate) struct LandingScreen;

impl LandingScreen {
    pub(crate) fn new() -> Self {
        Self
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, configured: bool) {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let mut text = vec![
            Line::from(""),
            Line::from("AmzWP").style(bold.fg(Color::Cyan)).alignment(Alignment::Center),
            Line::from("Affiliate content assistant for WordPress").alignment(Alignment::Center),
            Line::from(""),
            Line::from("  1. Connect your WordPress site, Amazon associate account and AI provider."),
            Line::from("  2. Scan the site's sitemap to list your posts."),
            Line::from("  3. Pick a post and open it in the editor."),
            Line::from(""),
        ];
        if !configured {
            text.push(
                Line::from("  No WordPress site configured yet. Press F2 or c to open settings.")
                    .style(Style::default().fg(Color::Yellow)),
            );
            text.push(Line::from(""));
        }
        text.push(
            Line::from("Press Enter to begin")
                .style(bold)
                .alignment(Alignment::Center),
        );

        let p = Paragraph::new(text)
            .wrap(Wrap { trim: false })
            .block(Block::default().borders(Borders::ALL).title(" Welcome "));
        f.render_widget(p, area);
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Action {
        match code {
            KeyCode::Enter => Action::Enter,
            _ => Action::None,
        }
    }
}
