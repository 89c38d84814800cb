use crate::model::{Agent, AgentDraft, Character, LlmSettings};

use super::{FieldError, FormField, ValidationErrors};

pub const DEFAULT_PERSONA: &str = "Du bist ein hilfreicher und freundlicher Assistent.";
pub const DEFAULT_GOALS: &str = "Benutzeranfragen beantworten, Hilfe anbieten";
pub const DEFAULT_CONSTRAINTS: &str = "Keine persönlichen Daten teilen, Höflich bleiben";

/// Raw text of every agent form field, exactly as typed.
#[derive(Debug, Clone, PartialEq)]
pub struct AgentFormValues {
    pub name: String,
    pub description: String,
    pub persona: String,
    pub goals: String,
    pub constraints: String,
    pub provider: String,
    pub model: String,
    pub temperature: String,
}

impl Default for AgentFormValues {
    fn default() -> Self {
        let llm = LlmSettings::default();
        Self {
            name: String::new(),
            description: String::new(),
            persona: DEFAULT_PERSONA.into(),
            goals: DEFAULT_GOALS.into(),
            constraints: DEFAULT_CONSTRAINTS.into(),
            provider: llm.provider,
            model: llm.model,
            temperature: llm.temperature.to_string(),
        }
    }
}

impl AgentFormValues {
    /// Pre-fills the form for editing; list fields are joined with `", "`.
    pub fn from_agent(agent: &Agent) -> Self {
        Self {
            name: agent.name.clone(),
            description: agent.description.clone(),
            persona: agent.character.persona.clone(),
            goals: agent.character.goals.join(", "),
            constraints: agent.character.constraints.join(", "),
            provider: agent.llm.provider.clone(),
            model: agent.llm.model.clone(),
            temperature: agent.llm.temperature.to_string(),
        }
    }

    pub fn get(&self, field: FormField) -> &str {
        match field {
            FormField::Name => &self.name,
            FormField::Description => &self.description,
            FormField::Persona => &self.persona,
            FormField::Goals => &self.goals,
            FormField::Constraints => &self.constraints,
            FormField::Provider => &self.provider,
            FormField::Model => &self.model,
            FormField::Temperature => &self.temperature,
        }
    }

    pub fn get_mut(&mut self, field: FormField) -> &mut String {
        match field {
            FormField::Name => &mut self.name,
            FormField::Description => &mut self.description,
            FormField::Persona => &mut self.persona,
            FormField::Goals => &mut self.goals,
            FormField::Constraints => &mut self.constraints,
            FormField::Provider => &mut self.provider,
            FormField::Model => &mut self.model,
            FormField::Temperature => &mut self.temperature,
        }
    }

    /// Checks a single field.
    pub fn check(&self, field: FormField) -> Option<FieldError> {
        let value = self.get(field).trim();
        match field {
            FormField::Goals | FormField::Constraints if split_list(value).is_empty() => {
                Some(FieldError::Required)
            }
            FormField::Temperature => {
                if value.is_empty() {
                    return Some(FieldError::NotANumber);
                }
                match value.parse::<f32>() {
                    Ok(number) if !number.is_finite() => Some(FieldError::NotANumber),
                    Ok(number) if !(0.0..=1.0).contains(&number) => Some(FieldError::OutOfRange),
                    Ok(_) => None,
                    Err(_) => Some(FieldError::NotANumber),
                }
            }
            _ if value.is_empty() => Some(FieldError::Required),
            _ => None,
        }
    }

    pub fn errors(&self) -> ValidationErrors {
        let mut errors = ValidationErrors::new();
        for field in FormField::ALL {
            if let Some(error) = self.check(field) {
                errors.insert(field, error);
            }
        }
        errors
    }

    /// Turns the form into a draft, or reports every failing field.
    pub fn validate(&self) -> Result<AgentDraft, ValidationErrors> {
        let errors = self.errors();
        if !errors.is_empty() {
            return Err(errors);
        }
        let temperature = self
            .temperature
            .trim()
            .parse::<f32>()
            .unwrap_or(crate::model::DEFAULT_TEMPERATURE);
        Ok(AgentDraft {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            character: Character {
                persona: self.persona.trim().to_string(),
                goals: split_list(&self.goals),
                constraints: split_list(&self.constraints),
            },
            llm: LlmSettings {
                provider: self.provider.trim().to_string(),
                model: self.model.trim().to_string(),
                temperature,
            },
            knowledge: Vec::new(),
        })
    }
}

/// Splits a comma separated list, trimming pieces and dropping empty ones.
pub fn split_list(input: &str) -> Vec<String> {
    input
        .split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(String::from)
        .collect()
}
