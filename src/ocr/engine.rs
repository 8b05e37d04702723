//! Tesseract invocation.
//!
//! Runs the external `tesseract` binary over a temp PNG and reads plain
//! text from stdout. The binary is expected on PATH; set TESSERACT_EXE to
//! point at a specific install.

use anyhow::{anyhow, Context, Result};
use image::RgbaImage;
use std::path::PathBuf;
use std::process::Command;
use tempfile::NamedTempFile;

use crate::config::OcrProfile;
use crate::ocr::preprocess::preprocess_for_ocr;

/// Text recognition over a captured region with a given tuning profile.
pub trait TextRecognizer {
    fn recognize(&self, img: &RgbaImage, profile: &OcrProfile) -> Result<String>;
}

/// Recognizer backed by the Tesseract CLI.
pub struct TesseractEngine {
    executable: PathBuf,
}

impl TesseractEngine {
    pub fn new() -> Self {
        let executable = std::env::var_os("TESSERACT_EXE")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("tesseract"));
        Self { executable }
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextRecognizer for TesseractEngine {
    fn recognize(&self, img: &RgbaImage, profile: &OcrProfile) -> Result<String> {
        let preprocessed = preprocess_for_ocr(img, profile);

        let temp_input = NamedTempFile::with_suffix(".png")?;
        preprocessed
            .save(temp_input.path())
            .context("Failed to write OCR input image")?;

        let mut cmd = Command::new(&self.executable);
        cmd.arg(temp_input.path())
            .arg("stdout")
            .arg("-l")
            .arg("eng")
            .arg("--psm")
            .arg(profile.psm.to_string());

        if !profile.char_whitelist.is_empty() {
            cmd.arg("-c")
                .arg(format!("tessedit_char_whitelist={}", profile.char_whitelist));
        }

        let output = cmd
            .output()
            .with_context(|| format!("Failed to run {}", self.executable.display()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(anyhow!("Tesseract failed: {}", stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout)
            .to_uppercase()
            .replace('\r', ""))
    }
}
