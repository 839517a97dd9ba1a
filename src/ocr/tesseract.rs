use anyhow::{anyhow, Context, Result};
use image::{DynamicImage, ImageFormat};
use std::io::Write;
use std::path::Path;
use std::process::Command;
use tracing::{debug, warn};

use super::{OcrEngine, OcrFuture};

pub(crate) const DEFAULT_LANGUAGES: &str = "eng";

/// OCR through the `tesseract` command line tool.
#[derive(Debug, Clone)]
pub struct Tesseract {
    languages: String,
    dpi: Option<u32>,
}

impl Tesseract {
    pub fn new(languages: impl Into<String>) -> Self {
        let languages = languages.into();
        Self {
            languages: if languages.trim().is_empty() {
                DEFAULT_LANGUAGES.to_string()
            } else {
                languages
            },
            dpi: None,
        }
    }

    pub fn with_dpi(mut self, dpi: u32) -> Self {
        if dpi > 0 {
            self.dpi = Some(dpi);
        }
        self
    }
}

impl Default for Tesseract {
    fn default() -> Self {
        Self::new(DEFAULT_LANGUAGES)
    }
}

impl OcrEngine for Tesseract {
    fn recognize<'a>(&'a self, image_png: &'a [u8]) -> OcrFuture<'a> {
        let image = image_png.to_vec();
        let engine = self.clone();
        Box::pin(async move {
            tokio::task::spawn_blocking(move || engine.recognize_blocking(&image))
                .await
                .map_err(|err| anyhow!("ocr task failed: {}", err))?
        })
    }
}

impl Tesseract {
    fn recognize_blocking(&self, image_png: &[u8]) -> Result<String> {
        let image = image::load_from_memory(image_png)
            .with_context(|| "failed to decode image for OCR")?;
        let gray = DynamicImage::ImageLuma8(image.to_luma8());

        let mut tmp = tempfile::Builder::new()
            .suffix(".png")
            .tempfile()
            .with_context(|| "failed to create temp file for OCR")?;
        gray.write_to(&mut tmp, ImageFormat::Png)
            .with_context(|| "failed to write temp image for OCR")?;
        tmp.flush().ok();

        let languages = normalize_ocr_languages(&self.languages)?;
        let text = run_tesseract_text(tmp.path(), &languages, self.dpi)?;
        debug!("ocr: recognized {} chars", text.chars().count());
        Ok(text)
    }
}

pub fn list_tesseract_languages() -> Result<Vec<String>> {
    let output = Command::new("tesseract")
        .arg("--list-langs")
        .output()
        .with_context(|| "failed to run tesseract --list-langs")?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract --list-langs failed: {}", stderr.trim()));
    }
    let stdout = String::from_utf8_lossy(&output.stdout);
    Ok(parse_language_list(&stdout))
}

fn parse_language_list(stdout: &str) -> Vec<String> {
    // first line is a "List of available languages" banner
    stdout
        .lines()
        .skip(1)
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .collect()
}

fn normalize_ocr_languages(requested: &str) -> Result<String> {
    let trimmed = requested.trim();
    if trimmed.is_empty() {
        return Err(anyhow!("ocr languages is empty"));
    }

    let available = match list_tesseract_languages() {
        Ok(list) => list,
        Err(_) => {
            return Ok(trimmed
                .split(['+', ',', ' '])
                .filter(|value| !value.is_empty())
                .collect::<Vec<_>>()
                .join("+"));
        }
    };
    select_languages(trimmed, &available)
}

fn select_languages(requested: &str, available: &[String]) -> Result<String> {
    let mut chosen = Vec::new();
    let mut missing = Vec::new();
    for raw in requested.split(['+', ',', ' ']) {
        let lang = raw.trim();
        if lang.is_empty() {
            continue;
        }
        if available.iter().any(|value| value == lang) {
            chosen.push(lang.to_string());
        } else {
            missing.push(lang.to_string());
        }
    }

    if chosen.is_empty() {
        return Err(anyhow!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        ));
    }
    if !missing.is_empty() {
        warn!(
            "ocr language(s) not available: {} (available: {})",
            missing.join(", "),
            available.join(", ")
        );
    }

    Ok(chosen.join("+"))
}

fn run_tesseract_text(path: &Path, languages: &str, dpi: Option<u32>) -> Result<String> {
    let mut command = Command::new("tesseract");
    command
        .arg(path)
        .arg("stdout")
        .arg("-l")
        .arg(languages)
        .arg("--psm")
        .arg("3");
    if let Some(dpi) = dpi {
        command.arg("--dpi").arg(dpi.to_string());
    }
    let output = command
        .output()
        .with_context(|| "failed to run tesseract (is it installed?)")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("tesseract failed: {}", stderr.trim()));
    }
    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}
