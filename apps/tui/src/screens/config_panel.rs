//! Settings overlay: tabbed form over the configuration panel's draft.

use amzwp_core::{ConfigPanel, PanelTab, TestStatus, mask_secret};
use amzwp_shared::AppConfig;
use crossterm::event::{KeyCode, KeyModifiers};
use ratatui::prelude::*;
use ratatui::widgets::{Block, Borders, Clear, Paragraph, Tabs, Wrap};

use super::Action;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Secret,
    Number,
    Toggle,
    Provider,
    Model,
    BoxStyle,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Field {
    key: &'static str,
    label: &'static str,
    kind: FieldKind,
}

const fn field(key: &'static str, label: &'static str, kind: FieldKind) -> Field {
    Field { key, label, kind }
}

/// Form fields of `tab`. The AI tab depends on the selected provider.
fn fields(tab: PanelTab, draft: &AppConfig) -> Vec<Field> {
    match tab {
        PanelTab::WordPress => vec![
            field("wpUrl", "Site URL *", FieldKind::Text),
            field("wpUser", "Username *", FieldKind::Text),
            field("wpAppPassword", "Application password *", FieldKind::Secret),
        ],
        PanelTab::Amazon => vec![
            field("amazonTag", "Associate tag *", FieldKind::Text),
            field("amazonAccessKey", "Access key", FieldKind::Secret),
            field("amazonSecretKey", "Secret key", FieldKind::Secret),
            field("amazonRegion", "Region", FieldKind::Text),
            field("serpApiKey", "SerpAPI key", FieldKind::Secret),
        ],
        PanelTab::Ai => {
            let provider = draft.ai_provider;
            let model = if provider.uses_custom_model() {
                field("customModel", "Model", FieldKind::Text)
            } else {
                field("aiModel", "Model", FieldKind::Model)
            };
            vec![
                field("aiProvider", "Provider", FieldKind::Provider),
                model,
                field(provider.key_field(), "API key", FieldKind::Secret),
            ]
        }
        PanelTab::Sota => vec![
            field("autoPublishThreshold", "Auto-publish threshold", FieldKind::Number),
            field("concurrencyLimit", "Concurrency limit", FieldKind::Number),
            field("enableSchema", "Schema markup", FieldKind::Toggle),
            field("enableStickyBar", "Sticky bar", FieldKind::Toggle),
            field("boxStyle", "Product box style", FieldKind::BoxStyle),
        ],
    }
}

pub(crate) struct ConfigPanelScreen {
    focused: usize,
    /// Text being typed into the focused field.
    buffer: Option<String>,
}

impl ConfigPanelScreen {
    pub(crate) fn new() -> Self {
        Self {
            focused: 0,
            buffer: None,
        }
    }

    pub(crate) fn is_editing(&self) -> bool {
        self.buffer.is_some()
    }

    /// Forget form state when the panel opens or closes.
    pub(crate) fn reset(&mut self) {
        self.focused = 0;
        self.buffer = None;
    }

    pub(crate) fn draw(&self, f: &mut Frame, area: Rect, panel: &ConfigPanel) {
        let Some(draft) = panel.draft() else {
            return;
        };

        f.render_widget(Clear, area);
        let outer = Block::default()
            .borders(Borders::ALL)
            .title(" Settings ")
            .border_style(Style::default().fg(Color::Cyan));
        let inner = outer.inner(area);
        f.render_widget(outer, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(2), // Tabs
                Constraint::Min(1),    // Fields
                Constraint::Length(3), // Hint, validation, test status
                Constraint::Length(1), // Keys
            ])
            .split(inner);

        let selected = PanelTab::ALL.iter().position(|t| *t == panel.tab()).unwrap_or(0);
        let tabs = Tabs::new(PanelTab::ALL.iter().map(|t| t.label()))
            .select(selected)
            .highlight_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD))
            .divider(" │ ");
        f.render_widget(tabs, chunks[0]);

        let lines: Vec<Line> = fields(panel.tab(), draft)
            .iter()
            .enumerate()
            .map(|(i, field)| self.field_line(i, field, draft))
            .collect();
        f.render_widget(Paragraph::new(lines), chunks[1]);

        let mut info = Vec::new();
        if panel.tab() == PanelTab::Ai {
            let provider = draft.ai_provider;
            let hint = if provider.uses_custom_model() {
                format!("{}  ({})", provider.hint(), provider.custom_model_placeholder())
            } else {
                provider.hint().to_string()
            };
            info.push(Line::from(hint).style(Style::default().fg(Color::DarkGray)));
        }
        let missing = panel.validate();
        if !missing.is_empty() {
            info.push(
                Line::from(format!("Required: {}", missing.join(", ")))
                    .style(Style::default().fg(Color::Yellow)),
            );
        }
        match panel.test_status() {
            TestStatus::Idle => {}
            TestStatus::Testing => info.push(
                Line::from("Testing WordPress connection...").style(Style::default().fg(Color::Yellow)),
            ),
            TestStatus::Success(message) => info.push(
                Line::from(format!("✓ {}", message.as_deref().unwrap_or("Connected")))
                    .style(Style::default().fg(Color::Green)),
            ),
            TestStatus::Error(message) => info.push(
                Line::from(format!("✗ {message}")).style(Style::default().fg(Color::Red)),
            ),
        }
        f.render_widget(Paragraph::new(info).wrap(Wrap { trim: true }), chunks[2]);

        let keys = if self.is_editing() {
            "Type the value · Enter to apply (empty keeps a stored secret) · Esc to cancel"
        } else {
            "[Tab] section  [↑/↓] field  [Enter] edit/toggle  [←/→] choose  [t] test  [Ctrl-S] save  [Esc] cancel"
        };
        f.render_widget(
            Paragraph::new(keys).style(Style::default().fg(Color::DarkGray)),
            chunks[3],
        );
    }

    fn field_line(&self, index: usize, field: &Field, draft: &AppConfig) -> Line<'static> {
        let focused = index == self.focused;
        let value = match (&self.buffer, focused) {
            (Some(buffer), true) if field.kind == FieldKind::Secret => {
                format!("{}▏", "•".repeat(buffer.chars().count()))
            }
            (Some(buffer), true) => format!("{buffer}▏"),
            _ => display_value(field, draft),
        };

        let label_style = if focused {
            Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
        } else {
            Style::default()
        };
        let value_style = if focused && self.is_editing() {
            Style::default().fg(Color::Yellow)
        } else {
            Style::default().fg(Color::White)
        };
        let marker = if focused { "▸ " } else { "  " };

        Line::from(vec![
            Span::styled(format!("{marker}{:<26}", field.label), label_style),
            Span::styled(value, value_style),
        ])
    }

    pub(crate) fn handle_key(
        &mut self,
        code: KeyCode,
        modifiers: KeyModifiers,
        panel: &mut ConfigPanel,
    ) -> Action {
        let Some(draft) = panel.draft() else {
            return Action::None;
        };
        let form = fields(panel.tab(), draft);
        self.focused = self.focused.min(form.len().saturating_sub(1));
        let Some(current) = form.get(self.focused).copied() else {
            return Action::None;
        };

        if let Some(buffer) = self.buffer.as_mut() {
            match code {
                KeyCode::Esc => self.buffer = None,
                KeyCode::Enter => {
                    let value = buffer.trim().to_string();
                    self.buffer = None;
                    // Secrets are retyped from scratch; an empty entry keeps the stored one.
                    if current.kind == FieldKind::Secret && value.is_empty() {
                        return Action::None;
                    }
                    if let Err(e) = panel.set_field(current.key, &value) {
                        return Action::Error(e.to_string());
                    }
                }
                KeyCode::Backspace => {
                    buffer.pop();
                }
                KeyCode::Char(c) => buffer.push(c),
                _ => {}
            }
            return Action::None;
        }

        match code {
            KeyCode::Esc => return Action::ClosePanel,
            KeyCode::Char('s') if modifiers.contains(KeyModifiers::CONTROL) => {
                return Action::SavePanel;
            }
            KeyCode::Char('t') => return Action::TestConnection,
            KeyCode::Tab => {
                panel.next_tab();
                self.focused = 0;
            }
            KeyCode::BackTab => {
                panel.prev_tab();
                self.focused = 0;
            }
            KeyCode::Up | KeyCode::Char('k') => self.focused = self.focused.saturating_sub(1),
            KeyCode::Down | KeyCode::Char('j') => {
                if self.focused + 1 < form.len() {
                    self.focused += 1;
                }
            }
            KeyCode::Enter | KeyCode::Char(' ') => return self.activate(current, panel, 1),
            KeyCode::Right | KeyCode::Char('l') => return self.activate(current, panel, 1),
            KeyCode::Left | KeyCode::Char('h') => return self.activate(current, panel, -1),
            _ => {}
        }
        Action::None
    }

    /// Edit, toggle or cycle the focused field. `step` is the cycling direction.
    fn activate(&mut self, field: Field, panel: &mut ConfigPanel, step: isize) -> Action {
        let Some(draft) = panel.draft() else {
            return Action::None;
        };
        let result = match field.kind {
            FieldKind::Secret => {
                if step > 0 {
                    self.buffer = Some(String::new());
                }
                Ok(())
            }
            FieldKind::Text | FieldKind::Number => {
                if step > 0 {
                    self.buffer = Some(draft.field_value(field.key).unwrap_or_default());
                }
                Ok(())
            }
            FieldKind::Toggle => {
                let on = draft.field_value(field.key).as_deref() == Some("true");
                panel.set_field(field.key, if on { "false" } else { "true" })
            }
            FieldKind::Provider => {
                let provider = if step < 0 {
                    draft.ai_provider.prev()
                } else {
                    draft.ai_provider.next()
                };
                panel.select_provider(provider);
                Ok(())
            }
            FieldKind::Model => {
                let models = draft.ai_provider.models();
                if models.is_empty() {
                    return Action::None;
                }
                let idx = models
                    .iter()
                    .position(|(id, _)| *id == draft.ai_model)
                    .map(|i| i as isize)
                    .unwrap_or(-1);
                let next = (idx + step).rem_euclid(models.len() as isize) as usize;
                panel.set_field("aiModel", models[next].0)
            }
            FieldKind::BoxStyle => {
                let next = draft.box_style.next();
                panel.set_field("boxStyle", &next.to_string())
            }
        };
        match result {
            Ok(()) => Action::None,
            Err(e) => Action::Error(e.to_string()),
        }
    }
}

/// Value shown for a field that is not being edited.
fn display_value(field: &Field, draft: &AppConfig) -> String {
    let raw = draft.field_value(field.key).unwrap_or_default();
    match field.kind {
        FieldKind::Secret if raw.is_empty() => "(not set)".to_string(),
        FieldKind::Secret => mask_secret(&raw),
        FieldKind::Toggle => (if raw == "true" { "[x] on" } else { "[ ] off" }).to_string(),
        FieldKind::Provider => format!("< {} >", draft.ai_provider.label()),
        FieldKind::Model => {
            let label = draft
                .ai_provider
                .models()
                .iter()
                .find(|(id, _)| *id == raw)
                .map(|(_, label)| *label)
                .unwrap_or(raw.as_str());
            format!("< {label} >")
        }
        FieldKind::BoxStyle => format!("< {raw} >"),
        FieldKind::Text | FieldKind::Number if raw.is_empty() => "(empty)".to_string(),
        FieldKind::Text | FieldKind::Number => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use amzwp_shared::AiProvider;

    fn press(screen: &mut ConfigPanelScreen, panel: &mut ConfigPanel, code: KeyCode) -> Action {
        screen.handle_key(code, KeyModifiers::NONE, panel)
    }

    fn open_panel() -> (ConfigPanelScreen, ConfigPanel) {
        let mut panel = ConfigPanel::new();
        panel.open(&AppConfig::default());
        (ConfigPanelScreen::new(), panel)
    }

    #[test]
    fn typing_into_a_field_updates_draft() {
        let (mut screen, mut panel) = open_panel();
        press(&mut screen, &mut panel, KeyCode::Enter);
        assert!(screen.is_editing());
        for c in "blog.example.com".chars() {
            press(&mut screen, &mut panel, KeyCode::Char(c));
        }
        press(&mut screen, &mut panel, KeyCode::Enter);
        assert!(!screen.is_editing());
        assert_eq!(panel.draft().unwrap().wp_url, "blog.example.com");
    }

    #[test]
    fn escape_cancels_edit_then_closes() {
        let (mut screen, mut panel) = open_panel();
        press(&mut screen, &mut panel, KeyCode::Enter);
        press(&mut screen, &mut panel, KeyCode::Char('x'));
        assert_eq!(press(&mut screen, &mut panel, KeyCode::Esc), Action::None);
        assert_eq!(panel.draft().unwrap().wp_url, "");
        assert_eq!(press(&mut screen, &mut panel, KeyCode::Esc), Action::ClosePanel);
    }

    #[test]
    fn provider_cycles_and_model_follows() {
        let (mut screen, mut panel) = open_panel();
        press(&mut screen, &mut panel, KeyCode::Tab);
        press(&mut screen, &mut panel, KeyCode::Tab);
        assert_eq!(panel.tab(), PanelTab::Ai);

        press(&mut screen, &mut panel, KeyCode::Right);
        let draft = panel.draft().unwrap();
        assert_eq!(draft.ai_provider, AiProvider::OpenAi);
        assert_eq!(draft.ai_model, "gpt-4o");

        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Right);
        assert_eq!(panel.draft().unwrap().ai_model, "gpt-4o-mini");
        press(&mut screen, &mut panel, KeyCode::Left);
        press(&mut screen, &mut panel, KeyCode::Left);
        assert_eq!(panel.draft().unwrap().ai_model, "gpt-3.5-turbo");
    }

    #[test]
    fn ai_tab_shows_key_of_selected_provider() {
        let mut draft = AppConfig::default();
        draft.ai_provider = AiProvider::Groq;
        let form = fields(PanelTab::Ai, &draft);
        assert_eq!(form[1].key, "customModel");
        assert_eq!(form[2].key, "groqApiKey");
    }

    #[test]
    fn toggles_flip_flags() {
        let (mut screen, mut panel) = open_panel();
        panel.set_tab(PanelTab::Sota);
        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Char(' '));
        assert!(!panel.draft().unwrap().enable_schema);
    }

    #[test]
    fn invalid_number_reports_error() {
        let (mut screen, mut panel) = open_panel();
        panel.set_tab(PanelTab::Sota);
        press(&mut screen, &mut panel, KeyCode::Enter);
        press(&mut screen, &mut panel, KeyCode::Backspace);
        press(&mut screen, &mut panel, KeyCode::Backspace);
        for c in "250".chars() {
            press(&mut screen, &mut panel, KeyCode::Char(c));
        }
        assert!(matches!(press(&mut screen, &mut panel, KeyCode::Enter), Action::Error(_)));
        assert_eq!(panel.draft().unwrap().auto_publish_threshold, 85);
    }

    #[test]
    fn ctrl_s_and_t_map_to_actions() {
        let (mut screen, mut panel) = open_panel();
        assert_eq!(
            screen.handle_key(KeyCode::Char('s'), KeyModifiers::CONTROL, &mut panel),
            Action::SavePanel
        );
        assert_eq!(press(&mut screen, &mut panel, KeyCode::Char('t')), Action::TestConnection);
    }

    #[test]
    fn secrets_are_masked() {
        let mut draft = AppConfig::default();
        draft.wp_app_password = "abcd efgh".into();
        let shown = display_value(&field("wpAppPassword", "", FieldKind::Secret), &draft);
        assert!(!shown.contains("abcd"));
        assert!(shown.ends_with("efgh"));
    }

    fn rendered(line: &Line) -> String {
        line.spans.iter().map(|span| span.content.as_ref()).collect()
    }

    #[test]
    fn secret_edit_never_shows_plain_text() {
        let mut panel = ConfigPanel::new();
        let mut config = AppConfig::default();
        config.wp_app_password = "hunter2-secret".into();
        panel.open(&config);
        let mut screen = ConfigPanelScreen::new();

        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Enter);
        assert!(screen.is_editing());

        let form = fields(PanelTab::WordPress, panel.draft().unwrap());
        let line = screen.field_line(2, &form[2], panel.draft().unwrap());
        assert!(!rendered(&line).contains("hunter2"));

        for c in "new-pass".chars() {
            press(&mut screen, &mut panel, KeyCode::Char(c));
        }
        let line = screen.field_line(2, &form[2], panel.draft().unwrap());
        assert!(!rendered(&line).contains("new-pass"));
        assert!(rendered(&line).contains("••••••••"));

        press(&mut screen, &mut panel, KeyCode::Enter);
        assert_eq!(panel.draft().unwrap().wp_app_password, "new-pass");
    }

    #[test]
    fn empty_secret_entry_keeps_stored_value() {
        let mut panel = ConfigPanel::new();
        let mut config = AppConfig::default();
        config.wp_app_password = "hunter2-secret".into();
        panel.open(&config);
        let mut screen = ConfigPanelScreen::new();

        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Down);
        press(&mut screen, &mut panel, KeyCode::Enter);
        assert_eq!(press(&mut screen, &mut panel, KeyCode::Enter), Action::None);
        assert!(!screen.is_editing());
        assert_eq!(panel.draft().unwrap().wp_app_password, "hunter2-secret");
    }
}
