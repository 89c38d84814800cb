use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use super::{App, DeleteTarget, PendingInputAction, Screen};

impl App {
    /// The main entry point for handling keyboard events.
    ///
    /// Overlays capture all input. Global shortcuts come next, then the key goes to
    /// the visible screen.
    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }

        if self.overlay.is_some() {
            self.handle_overlay_key(key);
            return;
        }

        if self.handle_global_shortcuts(key) {
            return;
        }

        match self.screen {
            Screen::Agents => self.handle_agent_list_key(key),
            Screen::AgentForm => self.handle_form_key(key),
            Screen::Knowledge => self.handle_knowledge_key(key),
            Screen::Chat => self.handle_chat_key(key),
        }
    }

    /// Returns `true` if the key was handled.
    fn handle_global_shortcuts(&mut self, key: KeyEvent) -> bool {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Char('c') if ctrl => self.should_quit = true,
            KeyCode::Char('x') if ctrl => self.dismiss_banner(),
            KeyCode::F(2) => self.toggle_language(),
            _ => return false,
        }
        true
    }

    fn handle_agent_list_key(&mut self, key: KeyEvent) {
        match key.code {
            KeyCode::Char('q') => self.should_quit = true,
            KeyCode::Up => self.move_agent_cursor(-1),
            KeyCode::Down => self.move_agent_cursor(1),
            KeyCode::Home => self.agent_cursor = 0,
            KeyCode::End => self.move_agent_cursor(isize::MAX / 2),
            KeyCode::Char('r') => self.agents.refresh(),
            KeyCode::Char('n') => self.open_create_form(),
            KeyCode::Char('e') | KeyCode::Enter => self.open_edit_form(),
            KeyCode::Char('k') => self.open_knowledge(),
            KeyCode::Char('t') => self.open_chat(),
            KeyCode::Char('d') | KeyCode::Delete => match self.highlighted_agent() {
                Some(agent) => {
                    let target = DeleteTarget::Agent {
                        id: agent.id.clone(),
                        name: agent.name.clone(),
                    };
                    self.confirm_delete(target);
                }
                None => self.status_message = self.lang().status_no_selection().into(),
            },
            _ => {}
        }
    }

    fn handle_form_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        if key.code == KeyCode::Esc {
            self.form = None;
            self.screen = Screen::Agents;
            self.status_message = self.lang().status_ready().into();
            return;
        }
        if key.code == KeyCode::Enter || (ctrl && key.code == KeyCode::Char('s')) {
            self.submit_form();
            return;
        }
        let Some(form) = self.form.as_mut() else {
            return;
        };
        match key.code {
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Backspace => form.backspace(),
            KeyCode::Char('u') if ctrl => form.clear_field(),
            KeyCode::Char(ch) if !ctrl => form.insert_char(ch),
            _ => {}
        }
    }

    fn handle_knowledge_key(&mut self, key: KeyEvent) {
        let Some(pane) = self.knowledge.as_mut() else {
            self.back_to_agents();
            return;
        };
        match key.code {
            KeyCode::Esc | KeyCode::Char('q') => self.back_to_agents(),
            KeyCode::Up => pane.move_selection(-1),
            KeyCode::Down => pane.move_selection(1),
            KeyCode::Char('r') => pane.state.refresh(),
            KeyCode::Char('a') => self.prompt_input(PendingInputAction::AddText),
            KeyCode::Char('u') => self.prompt_input(PendingInputAction::AddUrl),
            KeyCode::Char('f') => self.prompt_input(PendingInputAction::UploadFile),
            KeyCode::Char('d') | KeyCode::Delete => {
                match pane.state.items().get(pane.selected) {
                    Some(item) => {
                        let target = DeleteTarget::Knowledge {
                            id: item.id.clone(),
                        };
                        self.confirm_delete(target);
                    }
                    None => self.status_message = self.lang().status_no_selection().into(),
                }
            }
            _ => {}
        }
    }

    fn handle_chat_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        let busy = self.lang().status_busy();
        let Some(pane) = self.chat.as_mut() else {
            self.back_to_agents();
            return;
        };
        match key.code {
            KeyCode::Esc => self.back_to_agents(),
            KeyCode::Enter => {
                if pane.composer.is_blank() {
                    return;
                }
                if pane.state.send(pane.composer.buffer()) {
                    pane.composer.take();
                    pane.scroll_back = 0;
                } else {
                    self.status_message = busy.into();
                }
            }
            KeyCode::Char('l') if ctrl => pane.state.reset(),
            KeyCode::Char('r') if ctrl => pane.state.refresh(),
            KeyCode::PageUp => pane.scroll_back = pane.scroll_back.saturating_add(5),
            KeyCode::PageDown => pane.scroll_back = pane.scroll_back.saturating_sub(5),
            KeyCode::Up => {
                pane.composer.history_previous();
            }
            KeyCode::Down => {
                pane.composer.history_next();
            }
            KeyCode::Left => pane.composer.move_left(),
            KeyCode::Right => pane.composer.move_right(),
            KeyCode::Home => pane.composer.move_home(),
            KeyCode::End => pane.composer.move_end(),
            KeyCode::Backspace => pane.composer.backspace(),
            KeyCode::Delete => pane.composer.delete(),
            KeyCode::Char(ch) if !ctrl => pane.composer.insert_char(ch),
            _ => {}
        }
    }
}
