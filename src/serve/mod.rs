//! Upload boundary: validates uploaded files, runs the spotter, and turns
//! failures into user-facing outcomes.

use tracing::{error, info, warn};

use crate::config::KwsConfig;
use crate::inference::KeywordSpotter;
use crate::types::{AudioSource, PredictionResult};

pub const REQUIRED_EXTENSION: &str = ".wav";
pub const NO_FILE_MESSAGE: &str = "File not found !!!";
pub const UNSUPPORTED_MESSAGE: &str = "Unsupported file format. Please use only .wav files";
pub const UNAVAILABLE_MESSAGE: &str =
    "Sorry, something went wrong. Cannot predict from the model. Please try again !!!";
pub const NOT_FOUND_STATUS: u16 = 404;

/// An uploaded file as received from the front end.
#[derive(Debug, Clone)]
pub struct Upload {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum TranscribeOutcome {
    Transcribed(PredictionResult),
    /// The upload was refused before any audio processing.
    Rejected { message: &'static str },
    /// The model could not produce a prediction.
    Unavailable {
        status: u16,
        description: &'static str,
    },
}

impl TranscribeOutcome {
    /// Lines shown to the user for this outcome.
    pub fn render(&self) -> Vec<String> {
        match self {
            TranscribeOutcome::Transcribed(prediction) => vec![
                format!("Transcribed keyword: {}", title_case(&prediction.label)),
                format!("Predicted probability: {}", prediction.probability),
            ],
            TranscribeOutcome::Rejected { message } => vec![(*message).to_string()],
            TranscribeOutcome::Unavailable {
                status,
                description,
            } => vec![format!("{status}: {description}")],
        }
    }
}

/// Case-insensitive check that `filename` ends with `extension`.
pub fn check_file_type(filename: &str, extension: &str) -> bool {
    filename.len() > extension.len()
        && filename
            .to_ascii_lowercase()
            .ends_with(&extension.to_ascii_lowercase())
}

/// Serves uploads against a model loaded once at construction.
#[derive(Debug, Clone)]
pub struct TranscribeHandler {
    spotter: Option<KeywordSpotter>,
}

impl TranscribeHandler {
    /// Loads the model named by `config`. A failed load is logged and every
    /// later upload is answered with [`TranscribeOutcome::Unavailable`].
    pub fn new(config: &KwsConfig) -> Self {
        match KeywordSpotter::load(&config.paths.model_artifact_dir, config.feature_params()) {
            Ok(spotter) => {
                info!(labels = ?spotter.labels(), "transcribe handler ready");
                Self::with_spotter(spotter)
            }
            Err(err) => {
                warn!(error = %err, "keyword model unavailable; uploads will be refused");
                Self { spotter: None }
            }
        }
    }

    pub fn with_spotter(spotter: KeywordSpotter) -> Self {
        Self {
            spotter: Some(spotter),
        }
    }

    pub fn is_ready(&self) -> bool {
        self.spotter.is_some()
    }

    pub fn handle(&self, upload: &Upload) -> TranscribeOutcome {
        if upload.filename.is_empty() {
            return TranscribeOutcome::Rejected {
                message: NO_FILE_MESSAGE,
            };
        }
        if !check_file_type(&upload.filename, REQUIRED_EXTENSION) {
            return TranscribeOutcome::Rejected {
                message: UNSUPPORTED_MESSAGE,
            };
        }

        let Some(spotter) = &self.spotter else {
            return unavailable();
        };
        let source = AudioSource::from_bytes(upload.bytes.clone(), &upload.filename);
        match spotter.predict(&source) {
            Ok(prediction) => TranscribeOutcome::Transcribed(prediction),
            Err(err) => {
                error!(filename = %upload.filename, error = %err, "prediction failed");
                unavailable()
            }
        }
    }
}

fn unavailable() -> TranscribeOutcome {
    TranscribeOutcome::Unavailable {
        status: NOT_FOUND_STATUS,
        description: UNAVAILABLE_MESSAGE,
    }
}

/// Upper-cases the first letter after every non-letter and lower-cases the
/// rest; separators are kept as they are.
fn title_case(label: &str) -> String {
    let mut titled = String::with_capacity(label.len());
    let mut after_letter = false;
    for ch in label.chars() {
        if after_letter {
            titled.extend(ch.to_lowercase());
        } else {
            titled.extend(ch.to_uppercase());
        }
        after_letter = ch.is_alphabetic();
    }
    titled
}
