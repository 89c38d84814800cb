use crate::i18n::Language;
use crate::model::FileUpload;

/// Upper bound for uploaded files (10 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 10 * 1024 * 1024;

const ALLOWED_MIME_TYPES: [&str; 3] = ["text/plain", "application/pdf", "text/markdown"];
const ALLOWED_EXTENSIONS: [&str; 3] = [".txt", ".pdf", ".md"];

/// Rejections for knowledge input before anything is sent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum KnowledgeInputError {
    UnsupportedType,
    TooLarge { size: u64 },
    EmptyText,
    EmptyUrl,
}

impl KnowledgeInputError {
    pub fn message(&self, lang: &dyn Language) -> String {
        match self {
            KnowledgeInputError::UnsupportedType => lang.invalid_file_type().to_string(),
            KnowledgeInputError::TooLarge { size } => lang.file_too_large(&format_file_size(*size)),
            KnowledgeInputError::EmptyText => lang.empty_text().to_string(),
            KnowledgeInputError::EmptyUrl => lang.empty_url().to_string(),
        }
    }
}

/// A file is accepted when either its MIME type or its extension is on the allow-list.
pub fn is_valid_file_type(filename: &str, mime_type: &str) -> bool {
    let lower = filename.to_ascii_lowercase();
    ALLOWED_MIME_TYPES.contains(&mime_type)
        || ALLOWED_EXTENSIONS.iter().any(|ext| lower.ends_with(ext))
}

/// Checks type and size from metadata alone, so oversized files need not be read.
pub fn validate_file_metadata(
    filename: &str,
    mime_type: &str,
    size: u64,
) -> Result<(), KnowledgeInputError> {
    if !is_valid_file_type(filename, mime_type) {
        return Err(KnowledgeInputError::UnsupportedType);
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(KnowledgeInputError::TooLarge { size });
    }
    Ok(())
}

pub fn validate_upload(upload: &FileUpload) -> Result<(), KnowledgeInputError> {
    validate_file_metadata(&upload.filename, &upload.mime_type, upload.size())
}

pub fn validate_text(text: &str) -> Result<&str, KnowledgeInputError> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return Err(KnowledgeInputError::EmptyText);
    }
    Ok(trimmed)
}

pub fn validate_url(url: &str) -> Result<&str, KnowledgeInputError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(KnowledgeInputError::EmptyUrl);
    }
    Ok(trimmed)
}

/// `N bytes` below 1 KiB, otherwise one decimal of KB or MB.
pub fn format_file_size(bytes: u64) -> String {
    const KIB: u64 = 1024;
    const MIB: u64 = 1024 * 1024;
    if bytes < KIB {
        format!("{bytes} bytes")
    } else if bytes < MIB {
        format!("{:.1} KB", bytes as f64 / KIB as f64)
    } else {
        format!("{:.1} MB", bytes as f64 / MIB as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::i18n::Locale;
    use pretty_assertions::assert_eq;

    #[test]
    fn file_sizes_are_human_readable() {
        assert_eq!(format_file_size(512), "512 bytes");
        assert_eq!(format_file_size(1536), "1.5 KB");
        assert_eq!(format_file_size(11 * 1024 * 1024), "11.0 MB");
    }

    #[test]
    fn allow_list_accepts_extension_or_mime() {
        assert!(is_valid_file_type("notes.MD", "application/octet-stream"));
        assert!(is_valid_file_type("blob", "application/pdf"));
        assert!(!is_valid_file_type("image.png", "image/png"));
    }

    #[test]
    fn oversized_upload_is_rejected_with_size() {
        let upload = FileUpload::new("big.txt", "text/plain", vec![0; 11 * 1024 * 1024]);
        let err = validate_upload(&upload).unwrap_err();
        assert_eq!(err, KnowledgeInputError::TooLarge { size: 11 * 1024 * 1024 });
        assert_eq!(
            err.message(Locale::De.strings()),
            "Datei zu groß (11.0 MB). Maximale Größe: 10MB"
        );
    }

    #[test]
    fn exactly_ten_mebibytes_is_allowed() {
        assert!(validate_file_metadata("a.pdf", "application/pdf", MAX_UPLOAD_BYTES).is_ok());
    }

    #[test]
    fn wrong_type_message() {
        let err = validate_file_metadata("a.exe", "application/x-msdownload", 10).unwrap_err();
        assert_eq!(
            err.message(Locale::De.strings()),
            "Ungültiger Dateityp. Unterstützte Typen: .txt, .pdf, .md"
        );
    }

    #[test]
    fn blank_text_and_url_are_rejected() {
        assert_eq!(validate_text("  "), Err(KnowledgeInputError::EmptyText));
        assert_eq!(validate_url(""), Err(KnowledgeInputError::EmptyUrl));
        assert_eq!(validate_text(" hallo "), Ok("hallo"));
    }
}
