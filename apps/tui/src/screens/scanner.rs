//! Scanner screen: site URL input, sitemap scan, and post list.

use amzwp_shared::SitemapState;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, List, ListItem, ListState, Paragraph};

use super::Action;

pub(crate) struct ScannerScreen {
    url: String,
    editing: bool,
    scanning: bool,
    selected: usize,
    status: String,
}

impl ScannerScreen {
    pub(crate) fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            editing: false,
            scanning: false,
            selected: 0,
            status: "Press e to edit the site URL, s to scan.".to_string(),
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.editing
    }

    pub(crate) fn url(&self) -> &str {
        &self.url
    }

    /// Prefill the URL field unless the user already typed one.
    pub(crate) fn prefill(&mut self, url: &str) {
        if self.url.is_empty() {
            self.url = url.to_string();
        }
    }

    /// Mark the scan as running.
    pub(crate) fn scan_started(&mut self) {
        self.scanning = true;
        self.status = format!("Scanning {} ...", self.url);
    }

    /// Mark the scan as finished with `result` (post count or error).
    pub(crate) fn scan_finished(&mut self, result: Result<usize, &str>) {
        self.scanning = false;
        self.selected = 0;
        self.status = match result {
            Ok(0) => "Sitemap scanned, but no posts were found.".to_string(),
            Ok(n) => format!("Found {n} posts. Enter opens the selected post."),
            Err(e) => format!("Scan failed: {e}"),
        };
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, sitemap: &SitemapState) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3), // URL
                Constraint::Min(1),    // Posts
                Constraint::Length(1), // Hint / status
            ])
            .split(area);

        let url_style = if self.editing {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::Cyan)
        };
        let title = if self.scanning { " Site URL (scanning...) " } else { " Site URL " };
        let url_block = Block::default()
            .borders(Borders::ALL)
            .title(title)
            .border_style(url_style);
        f.render_widget(Paragraph::new(self.url.as_str()).block(url_block), chunks[0]);

        if sitemap.posts.is_empty() {
            let empty = Paragraph::new("No posts yet.\n\nEnter your site URL and press s to scan its sitemap.")
                .alignment(Alignment::Center)
                .block(Block::default().borders(Borders::ALL).title(" Posts "));
            f.render_widget(empty, chunks[1]);
        } else {
            let items: Vec<ListItem> = sitemap
                .posts
                .iter()
                .map(|post| {
                    let lastmod = post.lastmod.as_deref().map(|d| d.get(..10).unwrap_or(d));
                    ListItem::new(Line::from(vec![
                        Span::raw(format!("{:>4}  ", post.id)),
                        Span::styled(post.title.clone(), Style::default().add_modifier(Modifier::BOLD)),
                        Span::styled(
                            format!("  {}", lastmod.unwrap_or("")),
                            Style::default().fg(Color::DarkGray),
                        ),
                    ]))
                })
                .collect();

            let title = if sitemap.url.is_empty() {
                format!(" Posts ({}) ", sitemap.posts.len())
            } else {
                format!(" Posts ({}) from {} ", sitemap.posts.len(), sitemap.url)
            };
            let list = List::new(items)
                .block(Block::default().borders(Borders::ALL).title(title))
                .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
                .highlight_symbol("▸ ");

            let mut state = ListState::default().with_selected(Some(self.selected));
            f.render_stateful_widget(list, chunks[1], &mut state);
        }

        let hint = if self.editing {
            "Type the site URL · Enter to scan · Esc to stop editing".to_string()
        } else {
            format!("{}   [e] edit URL  [s] scan  [↑/↓] select  [Enter] open", self.status)
        };
        f.render_widget(
            Paragraph::new(hint).style(Style::default().fg(Color::DarkGray)),
            chunks[2],
        );
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        _modifiers: KeyModifiers,
        sitemap: &SitemapState,
    ) -> Action {
        if self.editing {
            match code {
                KeyCode::Esc => self.editing = false,
                KeyCode::Enter => {
                    self.editing = false;
                    return self.scan_action();
                }
                KeyCode::Backspace => {
                    self.url.pop();
                }
                KeyCode::Char(c) => self.url.push(c),
                _ => {}
            }
            return Action::None;
        }

        let count = sitemap.posts.len();
        match code {
            KeyCode::Char('e') | KeyCode::Char('/') => self.editing = true,
            KeyCode::Char('s') => return self.scan_action(),
            KeyCode::Up | KeyCode::Char('k') => self.selected = self.selected.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.selected + 1 < count {
                    self.selected += 1;
                }
            }
            KeyCode::Home => self.selected = 0,
            KeyCode::End => self.selected = count.saturating_sub(1),
            KeyCode::Enter => {
                if let Some(post) = sitemap.posts.get(self.selected) {
                    return Action::OpenPost(post.clone());
                }
            }
            _ => {}
        }
        Action::None
    }

    fn scan_action(&self) -> Action {
        if self.scanning {
            return Action::None;
        }
        let url = self.url.trim();
        if url.is_empty() {
            return Action::Error("Enter a site URL first".to_string());
        }
        Action::StartScan(url.to_string())
    }
}
