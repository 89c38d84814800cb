use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::forms::FormField;
use crate::model::KnowledgeKind;

/// Supported UI languages. German is the default.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Locale {
    #[default]
    De,
    En,
}

static GERMAN: German = German;
static ENGLISH: English = English;

impl Locale {
    pub fn strings(self) -> &'static dyn Language {
        match self {
            Locale::De => &GERMAN,
            Locale::En => &ENGLISH,
        }
    }

    pub fn toggle(self) -> Self {
        match self {
            Locale::De => Locale::En,
            Locale::En => Locale::De,
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            Locale::De => "de",
            Locale::En => "en",
        }
    }
}

impl fmt::Display for Locale {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Locale {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "de" | "de-de" | "deutsch" | "german" => Ok(Locale::De),
            "en" | "en-us" | "en-gb" | "english" => Ok(Locale::En),
            other => Err(format!("unsupported language '{other}' (expected 'de' or 'en')")),
        }
    }
}

pub trait Language: Send + Sync {
    fn app_title(&self) -> &'static str;
    fn language_name(&self) -> &'static str;
    fn agents_title(&self) -> &'static str;
    fn create_agent_title(&self) -> &'static str;
    fn edit_agent_title(&self) -> &'static str;
    fn knowledge_title(&self) -> &'static str;
    fn chat_title(&self) -> &'static str;
    fn details_title(&self) -> &'static str;

    fn loading(&self) -> &'static str;
    fn mode_remote(&self) -> &'static str;
    fn mode_mock(&self) -> &'static str;
    fn error_title(&self) -> &'static str;
    fn dismiss_hint(&self) -> &'static str;
    fn terminal_too_small(&self) -> &'static str;

    fn agent_list_hint(&self) -> &'static str;
    fn form_hint(&self) -> &'static str;
    fn knowledge_hint(&self) -> &'static str;
    fn chat_hint(&self) -> &'static str;

    fn no_agents(&self) -> &'static str;
    fn no_knowledge(&self) -> &'static str;
    fn no_messages(&self) -> &'static str;
    fn you(&self) -> &'static str;
    fn composer_title(&self) -> &'static str;
    fn composer_busy(&self) -> &'static str;
    fn knowledge_count(&self, count: usize) -> String;
    fn created_label(&self) -> &'static str;
    fn updated_label(&self) -> &'static str;
    fn image_marker(&self) -> &'static str;
    fn knowledge_kind(&self, kind: KnowledgeKind) -> &'static str;

    fn field_label(&self, field: FormField) -> &'static str;
    fn field_required(&self, field: FormField) -> &'static str;
    fn temperature_not_a_number(&self) -> &'static str;
    fn temperature_out_of_range(&self) -> &'static str;

    fn invalid_file_type(&self) -> &'static str;
    fn file_too_large(&self, size: &str) -> String;
    fn empty_text(&self) -> &'static str;
    fn empty_url(&self) -> &'static str;
    fn file_read_failed(&self, path: &str, reason: &str) -> String;

    fn add_text_title(&self) -> &'static str;
    fn add_url_title(&self) -> &'static str;
    fn upload_file_title(&self) -> &'static str;
    fn text_placeholder(&self) -> &'static str;
    fn url_placeholder(&self) -> &'static str;
    fn file_placeholder(&self) -> &'static str;
    fn prompt_hint(&self) -> &'static str;
    fn nothing_entered(&self) -> &'static str;

    fn confirm_delete_title(&self) -> &'static str;
    fn confirm_delete_agent(&self, name: &str) -> String;
    fn confirm_delete_knowledge(&self) -> &'static str;
    fn irreversible(&self) -> &'static str;
    fn delete_button(&self) -> &'static str;
    fn cancel_button(&self) -> &'static str;
    fn confirm_hint(&self) -> &'static str;

    fn status_ready(&self) -> &'static str;
    fn status_agent_created(&self, name: &str) -> String;
    fn status_agent_updated(&self, name: &str) -> String;
    fn status_agent_deleted(&self) -> &'static str;
    fn status_knowledge_added(&self) -> &'static str;
    fn status_knowledge_deleted(&self) -> &'static str;
    fn status_chat_cleared(&self) -> &'static str;
    fn status_reply_received(&self) -> &'static str;
    fn status_no_selection(&self) -> &'static str;
    fn status_busy(&self) -> &'static str;
    fn status_form_invalid(&self) -> &'static str;
    fn status_language(&self) -> String;
    fn agent_not_found(&self, id: &str) -> String;

    /// Assistant message used when no reply could be generated.
    fn generation_apology(&self, reason: &str) -> String;
}

pub struct German;
impl Language for German {
    fn app_title(&self) -> &'static str { "Agenten-Konsole" }
    fn language_name(&self) -> &'static str { "Deutsch" }
    fn agents_title(&self) -> &'static str { "Agenten" }
    fn create_agent_title(&self) -> &'static str { "Neuen Agenten erstellen" }
    fn edit_agent_title(&self) -> &'static str { "Agent bearbeiten" }
    fn knowledge_title(&self) -> &'static str { "Wissensbasis" }
    fn chat_title(&self) -> &'static str { "Testchat" }
    fn details_title(&self) -> &'static str { "Details" }

    fn loading(&self) -> &'static str { "Lädt…" }
    fn mode_remote(&self) -> &'static str { "Remote" }
    fn mode_mock(&self) -> &'static str { "Nur lokal" }
    fn error_title(&self) -> &'static str { "Fehler" }
    fn dismiss_hint(&self) -> &'static str { "Strg+X schließen" }
    fn terminal_too_small(&self) -> &'static str { "Terminal zu klein, bitte auf mindestens 80x24 vergrößern." }

    fn agent_list_hint(&self) -> &'static str { "n Neu · e Bearbeiten · d Löschen · k Wissen · t Testen · r Aktualisieren · q Beenden" }
    fn form_hint(&self) -> &'static str { "Tab/Shift+Tab Feld wechseln · Enter Speichern · Esc Abbrechen" }
    fn knowledge_hint(&self) -> &'static str { "a Text · u URL · f Datei · d Löschen · r Aktualisieren · Esc Zurück" }
    fn chat_hint(&self) -> &'static str { "Enter Senden · Strg+L Leeren · Esc Zurück" }

    fn no_agents(&self) -> &'static str { "Noch keine Agenten. Mit 'n' einen neuen erstellen." }
    fn no_knowledge(&self) -> &'static str { "Keine Wissenseinträge vorhanden." }
    fn no_messages(&self) -> &'static str { "Noch keine Nachrichten. Schreibe etwas, um den Agenten zu testen." }
    fn you(&self) -> &'static str { "Du" }
    fn composer_title(&self) -> &'static str { "Nachricht" }
    fn composer_busy(&self) -> &'static str { "Antwort wird generiert…" }
    fn knowledge_count(&self, count: usize) -> String {
        if count == 1 { "1 Wissenseintrag".into() } else { format!("{count} Wissenseinträge") }
    }
    fn created_label(&self) -> &'static str { "Erstellt" }
    fn updated_label(&self) -> &'static str { "Aktualisiert" }
    fn image_marker(&self) -> &'static str { "Bild" }
    fn knowledge_kind(&self, kind: KnowledgeKind) -> &'static str {
        match kind {
            KnowledgeKind::Text => "Text",
            KnowledgeKind::File => "Datei",
            KnowledgeKind::Url => "URL",
        }
    }

    fn field_label(&self, field: FormField) -> &'static str {
        match field {
            FormField::Name => "Name",
            FormField::Description => "Beschreibung",
            FormField::Persona => "Persona",
            FormField::Goals => "Ziele (kommagetrennt)",
            FormField::Constraints => "Einschränkungen (kommagetrennt)",
            FormField::Provider => "Provider",
            FormField::Model => "Modell",
            FormField::Temperature => "Temperatur",
        }
    }
    fn field_required(&self, field: FormField) -> &'static str {
        match field {
            FormField::Name => "Name ist erforderlich",
            FormField::Description => "Beschreibung ist erforderlich",
            FormField::Persona => "Persona ist erforderlich",
            FormField::Goals => "Ziele sind erforderlich",
            FormField::Constraints => "Einschränkungen sind erforderlich",
            FormField::Provider => "Provider ist erforderlich",
            FormField::Model => "Modell ist erforderlich",
            FormField::Temperature => "Temperatur ist erforderlich",
        }
    }
    fn temperature_not_a_number(&self) -> &'static str { "Temperatur muss eine Zahl sein" }
    fn temperature_out_of_range(&self) -> &'static str { "Temperatur muss zwischen 0 und 1 liegen" }

    fn invalid_file_type(&self) -> &'static str { "Ungültiger Dateityp. Unterstützte Typen: .txt, .pdf, .md" }
    fn file_too_large(&self, size: &str) -> String { format!("Datei zu groß ({size}). Maximale Größe: 10MB") }
    fn empty_text(&self) -> &'static str { "Text darf nicht leer sein" }
    fn empty_url(&self) -> &'static str { "URL darf nicht leer sein" }
    fn file_read_failed(&self, path: &str, reason: &str) -> String { format!("Datei {path} konnte nicht gelesen werden: {reason}") }

    fn add_text_title(&self) -> &'static str { "Text hinzufügen" }
    fn add_url_title(&self) -> &'static str { "URL hinzufügen" }
    fn upload_file_title(&self) -> &'static str { "Datei hochladen" }
    fn text_placeholder(&self) -> &'static str { "Wissen als Text eingeben" }
    fn url_placeholder(&self) -> &'static str { "https://…" }
    fn file_placeholder(&self) -> &'static str { "Pfad zur Datei (.txt, .pdf, .md, max. 10MB)" }
    fn prompt_hint(&self) -> &'static str { "Enter bestätigen · Esc abbrechen" }
    fn nothing_entered(&self) -> &'static str { "(noch nichts eingegeben)" }

    fn confirm_delete_title(&self) -> &'static str { "Löschen bestätigen" }
    fn confirm_delete_agent(&self, name: &str) -> String { format!("Agent „{name}“ wird gelöscht.") }
    fn confirm_delete_knowledge(&self) -> &'static str { "Der Wissenseintrag wird gelöscht." }
    fn irreversible(&self) -> &'static str { "Diese Aktion kann nicht rückgängig gemacht werden." }
    fn delete_button(&self) -> &'static str { " [Löschen] " }
    fn cancel_button(&self) -> &'static str { " [Abbrechen] " }
    fn confirm_hint(&self) -> &'static str { "←/→ wählen · Enter bestätigen · Esc abbrechen" }

    fn status_ready(&self) -> &'static str { "Bereit" }
    fn status_agent_created(&self, name: &str) -> String { format!("Agent „{name}“ wurde erstellt") }
    fn status_agent_updated(&self, name: &str) -> String { format!("Agent „{name}“ wurde gespeichert") }
    fn status_agent_deleted(&self) -> &'static str { "Agent wurde gelöscht" }
    fn status_knowledge_added(&self) -> &'static str { "Wissenseintrag hinzugefügt" }
    fn status_knowledge_deleted(&self) -> &'static str { "Wissenseintrag gelöscht" }
    fn status_chat_cleared(&self) -> &'static str { "Chatverlauf geleert" }
    fn status_reply_received(&self) -> &'static str { "Antwort erhalten" }
    fn status_no_selection(&self) -> &'static str { "Kein Agent ausgewählt" }
    fn status_busy(&self) -> &'static str { "Bitte warten, eine Anfrage läuft noch" }
    fn status_form_invalid(&self) -> &'static str { "Bitte die markierten Felder korrigieren" }
    fn status_language(&self) -> String { "Sprache: Deutsch".into() }
    fn agent_not_found(&self, id: &str) -> String { format!("Agent {id} wurde nicht gefunden") }

    fn generation_apology(&self, reason: &str) -> String {
        format!("Es tut mir leid, ich konnte keine Antwort generieren. Fehler: {reason}")
    }
}

pub struct English;
impl Language for English {
    fn app_title(&self) -> &'static str { "Agent Console" }
    fn language_name(&self) -> &'static str { "English" }
    fn agents_title(&self) -> &'static str { "Agents" }
    fn create_agent_title(&self) -> &'static str { "Create agent" }
    fn edit_agent_title(&self) -> &'static str { "Edit agent" }
    fn knowledge_title(&self) -> &'static str { "Knowledge base" }
    fn chat_title(&self) -> &'static str { "Test chat" }
    fn details_title(&self) -> &'static str { "Details" }

    fn loading(&self) -> &'static str { "Loading…" }
    fn mode_remote(&self) -> &'static str { "Remote" }
    fn mode_mock(&self) -> &'static str { "Local only" }
    fn error_title(&self) -> &'static str { "Error" }
    fn dismiss_hint(&self) -> &'static str { "Ctrl+X to dismiss" }
    fn terminal_too_small(&self) -> &'static str { "Terminal too small, please resize to at least 80x24." }

    fn agent_list_hint(&self) -> &'static str { "n New · e Edit · d Delete · k Knowledge · t Test · r Refresh · q Quit" }
    fn form_hint(&self) -> &'static str { "Tab/Shift+Tab switch field · Enter save · Esc cancel" }
    fn knowledge_hint(&self) -> &'static str { "a Text · u URL · f File · d Delete · r Refresh · Esc Back" }
    fn chat_hint(&self) -> &'static str { "Enter send · Ctrl+L clear · Esc back" }

    fn no_agents(&self) -> &'static str { "No agents yet. Press 'n' to create one." }
    fn no_knowledge(&self) -> &'static str { "No knowledge items." }
    fn no_messages(&self) -> &'static str { "No messages yet. Type something to test the agent." }
    fn you(&self) -> &'static str { "You" }
    fn composer_title(&self) -> &'static str { "Message" }
    fn composer_busy(&self) -> &'static str { "Generating reply…" }
    fn knowledge_count(&self, count: usize) -> String {
        if count == 1 { "1 knowledge item".into() } else { format!("{count} knowledge items") }
    }
    fn created_label(&self) -> &'static str { "Created" }
    fn updated_label(&self) -> &'static str { "Updated" }
    fn image_marker(&self) -> &'static str { "image" }
    fn knowledge_kind(&self, kind: KnowledgeKind) -> &'static str {
        match kind {
            KnowledgeKind::Text => "Text",
            KnowledgeKind::File => "File",
            KnowledgeKind::Url => "URL",
        }
    }

    fn field_label(&self, field: FormField) -> &'static str {
        match field {
            FormField::Name => "Name",
            FormField::Description => "Description",
            FormField::Persona => "Persona",
            FormField::Goals => "Goals (comma separated)",
            FormField::Constraints => "Constraints (comma separated)",
            FormField::Provider => "Provider",
            FormField::Model => "Model",
            FormField::Temperature => "Temperature",
        }
    }
    fn field_required(&self, field: FormField) -> &'static str {
        match field {
            FormField::Name => "Name is required",
            FormField::Description => "Description is required",
            FormField::Persona => "Persona is required",
            FormField::Goals => "Goals are required",
            FormField::Constraints => "Constraints are required",
            FormField::Provider => "Provider is required",
            FormField::Model => "Model is required",
            FormField::Temperature => "Temperature is required",
        }
    }
    fn temperature_not_a_number(&self) -> &'static str { "Temperature must be a number" }
    fn temperature_out_of_range(&self) -> &'static str { "Temperature must be between 0 and 1" }

    fn invalid_file_type(&self) -> &'static str { "Invalid file type. Supported types: .txt, .pdf, .md" }
    fn file_too_large(&self, size: &str) -> String { format!("File too large ({size}). Maximum size: 10MB") }
    fn empty_text(&self) -> &'static str { "Text must not be empty" }
    fn empty_url(&self) -> &'static str { "URL must not be empty" }
    fn file_read_failed(&self, path: &str, reason: &str) -> String { format!("Could not read {path}: {reason}") }

    fn add_text_title(&self) -> &'static str { "Add text" }
    fn add_url_title(&self) -> &'static str { "Add URL" }
    fn upload_file_title(&self) -> &'static str { "Upload file" }
    fn text_placeholder(&self) -> &'static str { "Enter knowledge as text" }
    fn url_placeholder(&self) -> &'static str { "https://…" }
    fn file_placeholder(&self) -> &'static str { "Path to a file (.txt, .pdf, .md, max 10MB)" }
    fn prompt_hint(&self) -> &'static str { "Enter confirm · Esc cancel" }
    fn nothing_entered(&self) -> &'static str { "(nothing entered yet)" }

    fn confirm_delete_title(&self) -> &'static str { "Confirm deletion" }
    fn confirm_delete_agent(&self, name: &str) -> String { format!("Agent \"{name}\" will be deleted.") }
    fn confirm_delete_knowledge(&self) -> &'static str { "The knowledge item will be deleted." }
    fn irreversible(&self) -> &'static str { "This action cannot be undone." }
    fn delete_button(&self) -> &'static str { " [Delete] " }
    fn cancel_button(&self) -> &'static str { " [Cancel] " }
    fn confirm_hint(&self) -> &'static str { "←/→ choose · Enter confirm · Esc cancel" }

    fn status_ready(&self) -> &'static str { "Ready" }
    fn status_agent_created(&self, name: &str) -> String { format!("Agent \"{name}\" created") }
    fn status_agent_updated(&self, name: &str) -> String { format!("Agent \"{name}\" saved") }
    fn status_agent_deleted(&self) -> &'static str { "Agent deleted" }
    fn status_knowledge_added(&self) -> &'static str { "Knowledge item added" }
    fn status_knowledge_deleted(&self) -> &'static str { "Knowledge item deleted" }
    fn status_chat_cleared(&self) -> &'static str { "Chat history cleared" }
    fn status_reply_received(&self) -> &'static str { "Reply received" }
    fn status_no_selection(&self) -> &'static str { "No agent selected" }
    fn status_busy(&self) -> &'static str { "Please wait, a request is still running" }
    fn status_form_invalid(&self) -> &'static str { "Please fix the highlighted fields" }
    fn status_language(&self) -> String { "Language: English".into() }
    fn agent_not_found(&self, id: &str) -> String { format!("Agent {id} not found") }

    fn generation_apology(&self, reason: &str) -> String {
        format!("Sorry, I could not generate a reply. Error: {reason}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn german_is_the_default_locale() {
        assert_eq!(Locale::default(), Locale::De);
        assert_eq!(Locale::default().strings().field_required(FormField::Name), "Name ist erforderlich");
    }

    #[test]
    fn toggle_switches_between_both_languages() {
        assert_eq!(Locale::De.toggle(), Locale::En);
        assert_eq!(Locale::En.toggle(), Locale::De);
    }

    #[test]
    fn parses_language_codes() {
        assert_eq!("EN".parse::<Locale>(), Ok(Locale::En));
        assert_eq!("deutsch".parse::<Locale>(), Ok(Locale::De));
        assert!("fr".parse::<Locale>().is_err());
    }

    #[test]
    fn apology_embeds_reason() {
        let text = Locale::De.strings().generation_apology("Gemini API key not found");
        assert_eq!(
            text,
            "Es tut mir leid, ich konnte keine Antwort generieren. Fehler: Gemini API key not found"
        );
    }
}
