use anyhow::{anyhow, Context, Result};
use lopdf::Document;
use std::env;
use std::fs;
use std::path::Path;
use std::process::Command;
use tempfile::tempdir;
use tracing::warn;

use super::{PdfPage, PdfRenderer};

pub(crate) const DEFAULT_DPI: u32 = 200;

/// Page text through `lopdf`; page bitmaps through MuPDF's `mutool` or,
/// failing that, Poppler's `pdftoppm`.
#[derive(Debug, Clone)]
pub struct LopdfRenderer {
    dpi: u32,
}

impl LopdfRenderer {
    pub fn new(dpi: u32) -> Self {
        Self {
            dpi: if dpi == 0 { DEFAULT_DPI } else { dpi },
        }
    }
}

impl Default for LopdfRenderer {
    fn default() -> Self {
        Self::new(DEFAULT_DPI)
    }
}

impl PdfRenderer for LopdfRenderer {
    fn load(&self, pdf: &[u8]) -> Result<Vec<PdfPage>> {
        let document = Document::load_mem(pdf).with_context(|| "failed to parse pdf")?;
        let pages = document
            .get_pages()
            .into_keys()
            .map(|number| {
                // undecodable text is treated like a scanned page
                let text = document.extract_text(&[number]).unwrap_or_else(|err| {
                    warn!("pdf page {}: text extraction failed: {}", number, err);
                    String::new()
                });
                PdfPage { number, text }
            })
            .collect();
        Ok(pages)
    }

    fn rasterize(&self, pdf: &[u8], page: u32) -> Result<Vec<u8>> {
        let dir = tempdir().with_context(|| "failed to create temp dir for pdf")?;
        let input_path = dir.path().join("input.pdf");
        fs::write(&input_path, pdf).with_context(|| "failed to write temp pdf")?;
        let output_path = dir.path().join("page.png");
        let dpi = self.dpi.to_string();
        let page = page.to_string();

        if command_exists("mutool") {
            let output = Command::new("mutool")
                .arg("draw")
                .arg("-r")
                .arg(&dpi)
                .arg("-o")
                .arg(&output_path)
                .arg(&input_path)
                .arg(&page)
                .output()
                .with_context(|| "failed to run mutool")?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow!("mutool failed: {}", stderr.trim()));
            }
        } else if command_exists("pdftoppm") {
            let output = Command::new("pdftoppm")
                .arg("-png")
                .arg("-singlefile")
                .arg("-r")
                .arg(&dpi)
                .arg("-f")
                .arg(&page)
                .arg("-l")
                .arg(&page)
                .arg(&input_path)
                .arg(dir.path().join("page"))
                .output()
                .with_context(|| "failed to run pdftoppm")?;
            if !output.status.success() {
                let stderr = String::from_utf8_lossy(&output.stderr);
                return Err(anyhow!("pdftoppm failed: {}", stderr.trim()));
            }
        } else {
            return Err(anyhow!(
                "pdf rendering requires mutool or pdftoppm (install mupdf or poppler)"
            ));
        }

        fs::read(&output_path).with_context(|| "failed to read rendered pdf page")
    }
}

fn command_exists(cmd: &str) -> bool {
    let Some(path_var) = env::var_os("PATH") else {
        return false;
    };
    env::split_paths(&path_var).any(|dir| is_executable(&dir.join(cmd)))
}

#[cfg(unix)]
fn is_executable(path: &Path) -> bool {
    use std::os::unix::fs::PermissionsExt;

    fs::metadata(path)
        .map(|meta| meta.is_file() && meta.permissions().mode() & 0o111 != 0)
        .unwrap_or(false)
}

#[cfg(not(unix))]
fn is_executable(path: &Path) -> bool {
    path.is_file() || path.with_extension("exe").is_file()
}
