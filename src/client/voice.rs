use std::io::Write;
use std::process::{Command, Stdio};
use thiserror::Error;

use crate::config::VoiceConfig;

#[derive(Debug, Error)]
pub enum VoiceError {
    #[error("Speech capability is not supported here")]
    Unsupported,
    #[error("Speech command failed: {0}")]
    Failed(String),
    #[error("Speech IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// One recognition result; interim segments may still change.
#[derive(Debug, Clone)]
pub struct RecognitionSegment {
    pub transcript: String,
    pub is_final: bool,
}

pub trait SpeechRecognizer: Send {
    fn is_supported(&self) -> bool;
    fn start(&mut self) -> Result<(), VoiceError>;
    fn stop(&mut self);
}

pub trait SpeechSynthesizer: Send + Sync {
    fn is_supported(&self) -> bool;
    fn speak(&self, text: &str) -> Result<(), VoiceError>;
}

pub struct UnsupportedRecognizer;

impl SpeechRecognizer for UnsupportedRecognizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn start(&mut self) -> Result<(), VoiceError> {
        Err(VoiceError::Unsupported)
    }

    fn stop(&mut self) {}
}

pub struct UnsupportedSynthesizer;

impl SpeechSynthesizer for UnsupportedSynthesizer {
    fn is_supported(&self) -> bool {
        false
    }

    fn speak(&self, _text: &str) -> Result<(), VoiceError> {
        Err(VoiceError::Unsupported)
    }
}

/// Pipes text to an external program's stdin, e.g. `espeak --stdin`.
pub struct CommandSynthesizer {
    program: String,
    args: Vec<String>,
}

impl CommandSynthesizer {
    pub fn parse(command: &str) -> Option<Self> {
        let mut parts = command.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

impl SpeechSynthesizer for CommandSynthesizer {
    fn is_supported(&self) -> bool {
        true
    }

    fn speak(&self, text: &str) -> Result<(), VoiceError> {
        let mut child = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::null())
            .spawn()?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(text.as_bytes())?;
        }

        let status = child.wait()?;
        if !status.success() {
            return Err(VoiceError::Failed(format!("{} exited with {}", self.program, status)));
        }
        Ok(())
    }
}

pub fn synthesizer_from_config(config: &VoiceConfig) -> Box<dyn SpeechSynthesizer> {
    match config.tts_command.as_deref().and_then(CommandSynthesizer::parse) {
        Some(cmd) => Box::new(cmd),
        None => Box::new(UnsupportedSynthesizer),
    }
}

/// Toggles a recognizer and feeds finalized speech into the query buffer.
pub struct Dictation<R> {
    recognizer: R,
    listening: bool,
}

impl<R: SpeechRecognizer> Dictation<R> {
    pub fn new(recognizer: R) -> Self {
        Self {
            recognizer,
            listening: false,
        }
    }

    pub fn is_listening(&self) -> bool {
        self.listening
    }

    /// Returns the new listening state.
    pub fn toggle(&mut self) -> Result<bool, VoiceError> {
        if self.listening {
            self.recognizer.stop();
            self.listening = false;
        } else {
            self.recognizer.start()?;
            self.listening = true;
        }
        Ok(self.listening)
    }

    /// Appends final segments to `buffer`; interim ones are ignored.
    pub fn apply(&self, segments: &[RecognitionSegment], buffer: &mut String) {
        for segment in segments.iter().filter(|s| s.is_final) {
            buffer.push_str(&segment.transcript);
        }
    }
}
