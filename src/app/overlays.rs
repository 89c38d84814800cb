use std::path::Path;

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use log::{debug, warn};

use super::{
    App, ConfirmDeleteState, DeleteTarget, InputPromptState, OverlayState, PendingInputAction,
};
use crate::forms::validate_file_metadata;
use crate::model::{FileUpload, mime_for_path};

impl App {
    /// Opens an input prompt overlay for a knowledge action.
    pub(crate) fn prompt_input(&mut self, action: PendingInputAction) {
        debug!("showing input prompt for {action:?}");
        let prompt = InputPromptState::new(action, self.lang());
        self.status_message = prompt.title.clone();
        self.overlay = Some(OverlayState::InputPrompt(prompt));
    }

    pub(crate) fn confirm_delete(&mut self, target: DeleteTarget) {
        self.overlay = Some(OverlayState::ConfirmDelete(ConfirmDeleteState::new(target)));
    }

    /// Handles key events when an overlay is active.
    pub(crate) fn handle_overlay_key(&mut self, key: KeyEvent) {
        let Some(overlay) = self.overlay.take() else {
            return;
        };
        match overlay {
            OverlayState::InputPrompt(prompt) => self.handle_prompt_key(prompt, key),
            OverlayState::ConfirmDelete(confirm) => self.handle_confirm_key(confirm, key),
        }
    }

    fn handle_prompt_key(&mut self, mut prompt: InputPromptState, key: KeyEvent) {
        match key.code {
            KeyCode::Esc => {
                self.status_message = self.lang().status_ready().into();
                return;
            }
            KeyCode::Enter => {
                match self.submit_prompt(&prompt) {
                    Ok(()) => return,
                    Err(message) => prompt.error = Some(message),
                }
            }
            KeyCode::Backspace => {
                prompt.value.pop();
                prompt.error = None;
            }
            KeyCode::Char('u') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.value.clear();
                prompt.error = None;
            }
            KeyCode::Char(ch) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                prompt.value.push(ch);
                prompt.error = None;
            }
            _ => {}
        }
        self.overlay = Some(OverlayState::InputPrompt(prompt));
    }

    /// Runs the prompt's action. A rejected input is returned as a localized message
    /// and the prompt stays open.
    fn submit_prompt(&mut self, prompt: &InputPromptState) -> Result<(), String> {
        let lang = self.lang();
        let Some(pane) = self.knowledge.as_mut() else {
            return Ok(());
        };
        let value = prompt.value.trim();
        let result = match prompt.action {
            PendingInputAction::AddText => pane.state.add_text(&prompt.value),
            PendingInputAction::AddUrl => pane.state.add_url(value),
            PendingInputAction::UploadFile => {
                let upload = read_upload(Path::new(value)).map_err(|err| match err {
                    UploadReadError::Invalid(input) => input.message(lang),
                    UploadReadError::Io(reason) => lang.file_read_failed(value, &reason),
                })?;
                pane.state.upload_file(upload)
            }
        };
        result.map_err(|err| err.message(lang))
    }

    fn handle_confirm_key(&mut self, mut confirm: ConfirmDeleteState, key: KeyEvent) {
        match key.code {
            KeyCode::Esc | KeyCode::Char('n') => return,
            KeyCode::Left | KeyCode::Right | KeyCode::Tab | KeyCode::BackTab => {
                confirm.toggle_selection();
            }
            KeyCode::Char('y') => {
                self.perform_delete(confirm.target);
                return;
            }
            KeyCode::Enter => {
                if confirm.confirm_selected() {
                    self.perform_delete(confirm.target);
                }
                return;
            }
            _ => {}
        }
        self.overlay = Some(OverlayState::ConfirmDelete(confirm));
    }

    fn perform_delete(&mut self, target: DeleteTarget) {
        match target {
            DeleteTarget::Agent { id, .. } => self.agents.remove(&id),
            DeleteTarget::Knowledge { id } => {
                if let Some(pane) = self.knowledge.as_mut() {
                    pane.state.remove(&id);
                }
            }
        }
    }
}

#[derive(Debug)]
enum UploadReadError {
    Invalid(crate::forms::KnowledgeInputError),
    Io(String),
}

/// Reads a file for upload. Type and size are checked from metadata before the
/// content is read.
fn read_upload(path: &Path) -> Result<FileUpload, UploadReadError> {
    let metadata = std::fs::metadata(path).map_err(|err| UploadReadError::Io(err.to_string()))?;
    if !metadata.is_file() {
        return Err(UploadReadError::Io("not a regular file".into()));
    }
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let mime_type = mime_for_path(path);
    validate_file_metadata(&filename, mime_type, metadata.len())
        .map_err(UploadReadError::Invalid)?;
    let bytes = std::fs::read(path).map_err(|err| {
        warn!("failed to read {}: {err}", path.display());
        UploadReadError::Io(err.to_string())
    })?;
    Ok(FileUpload::new(filename, mime_type, bytes))
}
