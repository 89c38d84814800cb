//! Client-side validation for the agent form and knowledge inputs.
//!
//! Validation never touches the network: a form only turns into a draft once
//! every field passes.

use std::collections::BTreeMap;

use crate::i18n::Language;

pub mod agent;
pub mod knowledge;

pub use agent::{AgentFormValues, split_list};
pub use knowledge::{
    KnowledgeInputError, MAX_UPLOAD_BYTES, format_file_size, is_valid_file_type,
    validate_file_metadata, validate_text, validate_upload, validate_url,
};

/// Fields of the agent form, in tab order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum FormField {
    Name,
    Description,
    Persona,
    Goals,
    Constraints,
    Provider,
    Model,
    Temperature,
}

impl FormField {
    pub const ALL: [FormField; 8] = [
        FormField::Name,
        FormField::Description,
        FormField::Persona,
        FormField::Goals,
        FormField::Constraints,
        FormField::Provider,
        FormField::Model,
        FormField::Temperature,
    ];

    fn index(self) -> usize {
        FormField::ALL
            .iter()
            .position(|field| *field == self)
            .unwrap_or(0)
    }

    pub fn next(self) -> Self {
        FormField::ALL[(self.index() + 1) % FormField::ALL.len()]
    }

    pub fn previous(self) -> Self {
        let len = FormField::ALL.len();
        FormField::ALL[(self.index() + len - 1) % len]
    }
}

/// Why a single field was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldError {
    Required,
    NotANumber,
    OutOfRange,
}

/// Field → error map produced by form validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: BTreeMap<FormField, FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, field: FormField, error: FieldError) {
        self.errors.insert(field, error);
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn len(&self) -> usize {
        self.errors.len()
    }

    pub fn get(&self, field: FormField) -> Option<FieldError> {
        self.errors.get(&field).copied()
    }

    pub fn clear_field(&mut self, field: FormField) {
        self.errors.remove(&field);
    }

    pub fn fields(&self) -> impl Iterator<Item = FormField> + '_ {
        self.errors.keys().copied()
    }

    /// Localized message for `field`, if it has an error.
    pub fn message(&self, field: FormField, lang: &dyn Language) -> Option<&'static str> {
        self.get(field).map(|error| match error {
            FieldError::Required => lang.field_required(field),
            FieldError::NotANumber => lang.temperature_not_a_number(),
            FieldError::OutOfRange => lang.temperature_out_of_range(),
        })
    }
}
