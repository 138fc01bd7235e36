// src/analysis/mod.rs
//! CV-driven evaluation of stored jobs with a chat model.

pub mod cover_letter;
pub mod cv_reader;
pub mod fit_analyzer;
pub mod llm_client;
mod types;

pub use cover_letter::CoverLetterWriter;
pub use cv_reader::{extract_pdf_text, latest_cv, read_latest_cv};
pub use fit_analyzer::{fit_score, AnalysisSummary, FitAnalyzer};
pub use llm_client::{LlmClient, OpenAiClient};
