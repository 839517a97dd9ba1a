use std::path::Path;

/// Format of an uploaded document, decided from its declared name only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentFormat {
    Plain,
    Structured,
    Pdf,
    Unsupported,
}

impl DocumentFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentFormat::Plain => "plain",
            DocumentFormat::Structured => "structured",
            DocumentFormat::Pdf => "pdf",
            DocumentFormat::Unsupported => "unsupported",
        }
    }
}

/// Classifies by name suffix, ignoring case. The bytes are never
/// inspected, so a renamed file is only caught later when extraction fails.
pub fn detect_format(filename: &str) -> DocumentFormat {
    let name = filename.trim().to_ascii_lowercase();
    if name.ends_with(".txt") {
        DocumentFormat::Plain
    } else if name.ends_with(".docx") {
        DocumentFormat::Structured
    } else if name.ends_with(".pdf") {
        DocumentFormat::Pdf
    } else {
        DocumentFormat::Unsupported
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    filename: String,
    bytes: Vec<u8>,
}

impl Document {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }

    pub fn load(path: &Path) -> anyhow::Result<Self> {
        use anyhow::Context;

        let bytes = std::fs::read(path)
            .with_context(|| format!("failed to read data file: {}", path.display()))?;
        let filename = path
            .file_name()
            .and_then(|value| value.to_str())
            .unwrap_or_default()
            .to_string();
        Ok(Self::new(filename, bytes))
    }

    pub fn filename(&self) -> &str {
        &self.filename
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn format(&self) -> DocumentFormat {
        detect_format(&self.filename)
    }
}
