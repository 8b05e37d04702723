//! OCR pipeline: preprocessing and Tesseract invocation.
//!
//! Recognition output is untrusted. Everything downstream (classifier, box
//! score parser) is written to survive garbled text.

pub mod engine;
pub mod preprocess;

pub use engine::{TesseractEngine, TextRecognizer};
pub use preprocess::{preprocess_for_ocr, threshold_bright_pixels};
