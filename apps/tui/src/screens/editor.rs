//! Editor screen: the selected post and its rendered preview.

use amzwp_core::EditorResource;
use amzwp_discovery::PostPreview;
use amzwp_shared::BlogPost;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Paragraph, Wrap};

use super::Action;

pub(crate) struct EditorScreen {
    scroll: u16,
}

impl EditorScreen {
    pub(crate) fn new() -> Self {
        Self { scroll: 0 }
    }

    /// Scroll back to the top, e.g. after switching posts.
    pub(crate) fn reset_scroll(&mut self) {
        self.scroll = 0;
    }

    pub(crate) fn draw(
        &self,
        f: &mut Frame,
        area: Rect,
        post: &BlogPost,
        preview: &EditorResource<PostPreview>,
        position: Option<(usize, usize)>,
    ) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(4), // Post header
                Constraint::Min(1),    // Preview
                Constraint::Length(1), // Hint
            ])
            .split(area);

        let counter = position
            .map(|(idx, total)| format!(" Post {} of {total} ", idx + 1))
            .unwrap_or_else(|| " Post ".to_string());
        let header = Paragraph::new(vec![
            Line::from(post.title.as_str()).style(Style::default().add_modifier(Modifier::BOLD)),
            Line::from(post.url.as_str()).style(Style::default().fg(Color::Blue)),
        ])
        .block(Block::default().borders(Borders::ALL).title(counter));
        f.render_widget(header, chunks[0]);

        let body_block = Block::default().borders(Borders::ALL).title(" Preview ");
        let body = match preview {
            EditorResource::Ready { value, .. } if value.post_id == post.id => {
                let mut lines = vec![
                    Line::from(value.title.as_str())
                        .style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)),
                ];
                if let Some(desc) = &value.description {
                    lines.push(Line::from(desc.as_str()).style(Style::default().fg(Color::DarkGray)));
                }
                lines.push(
                    Line::from(format!("{} words", value.word_count))
                        .style(Style::default().fg(Color::DarkGray)),
                );
                lines.push(Line::from(""));
                lines.extend(value.markdown.lines().map(Line::from));
                Paragraph::new(lines)
                    .wrap(Wrap { trim: false })
                    .scroll((self.scroll, 0))
            }
            EditorResource::Failed { message, .. } => Paragraph::new(vec![
                Line::from(format!("Could not load the post: {message}"))
                    .style(Style::default().fg(Color::Red)),
                Line::from(""),
                Line::from("Press r to retry."),
            ])
            .wrap(Wrap { trim: false }),
            _ => Paragraph::new("Loading preview...")
                .style(Style::default().fg(Color::Yellow))
                .alignment(Alignment::Center),
        };
        f.render_widget(body.block(body_block), chunks[1]);

        let hint = "[Esc] back to posts  [ [ / ] ] previous/next post  [↑/↓] scroll  [r] reload";
        f.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );
    }

    pub(crate) fn handle_key(&mut self, code: KeyCode, _modifiers: KeyModifiers) -> Action {
        match code {
            KeyCode::Esc | KeyCode::Backspace => Action::Back,
            KeyCode::Char('[') => Action::SwitchPost(-1),
            KeyCode::Char(']') => Action::SwitchPost(1),
            KeyCode::Char('r') => Action::ReloadPreview,
            KeyCode::Up | KeyCode::Char('k') => {
                self.scroll = self.scroll.saturating_sub(1);
                Action::None
            }
            KeyCode::Down | KeyCode::Char('j') => {
                self.scroll = self.scroll.saturating_add(1);
                Action::None
            }
            KeyCode::PageUp => {
                self.scroll = self.scroll.saturating_sub(10);
                Action::None
            }
            KeyCode::PageDown => {
                self.scroll = self.scroll.saturating_add(10);
                Action::None
            }
            _ => Action::None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn navigation_keys_map_to_actions() {
        let mut screen = EditorScreen::new();
        let mods = KeyModifiers::NONE;
        assert_eq!(screen.handle_key(KeyCode::Esc, mods), Action::Back);
        assert_eq!(screen.handle_key(KeyCode::Char('['), mods), Action::SwitchPost(-1));
        assert_eq!(screen.handle_key(KeyCode::Char(']'), mods), Action::SwitchPost(1));
        assert_eq!(screen.handle_key(KeyCode::Char('r'), mods), Action::ReloadPreview);
    }

    #[test]
    fn scroll_saturates() {
        let mut screen = EditorScreen::new();
        screen.handle_key(KeyCode::Up, KeyModifiers::NONE);
        assert_eq!(screen.scroll, 0);
        screen.handle_key(KeyCode::PageDown, KeyModifiers::NONE);
        assert_eq!(screen.scroll, 10);
        screen.reset_scroll();
        assert_eq!(screen.scroll, 0);
    }
}
