//! Speech capture for Aurion.
//!
//! [`CommandRecognizer`] delegates the microphone and the transcription to an
//! external program (a whisper wrapper, a cloud STT script, ...). The program
//! records one utterance and prints the transcript on stdout; anything else
//! (non-zero exit, empty output, timeout) means nothing was recognized.

use std::time::Duration;

use async_trait::async_trait;
use aurion_config::VoiceConfig;
use aurion_core::speech::SpeechRecognizer;
use tokio::process::Command;
use tracing::{debug, warn};

/// Runs a shell command to capture and transcribe one utterance.
pub struct CommandRecognizer {
    command: String,
    timeout: Duration,
}

impl CommandRecognizer {
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    /// Build from config; `None` when no command is configured.
    pub fn from_config(config: &VoiceConfig) -> Option<Self> {
        let command = config.command.as_deref()?.trim();
        if command.is_empty() {
            return None;
        }
        Some(Self::new(command, Duration::from_secs(config.timeout_secs)))
    }

    pub fn command(&self) -> &str {
        &self.command
    }

    fn shell(&self) -> Command {
        let mut cmd = if cfg!(target_os = "windows") {
            let mut c = Command::new("cmd");
            c.args(["/C", self.command.as_str()]);
            c
        } else {
            let mut c = Command::new("sh");
            c.args(["-c", self.command.as_str()]);
            c
        };
        cmd.kill_on_drop(true);
        cmd
    }

    /// The executable the command line starts with.
    fn program(&self) -> &str {
        self.command.split_whitespace().next().unwrap_or("")
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        "command"
    }

    async fn recognize(&self) -> Option<String> {
        debug!(command = %self.command, "Listening for speech");

        let output = match tokio::time::timeout(self.timeout, self.shell().output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                warn!(command = %self.command, error = %e, "Speech command failed to start");
                return None;
            }
            Err(_) => {
                warn!(timeout_secs = self.timeout.as_secs(), "No speech detected within timeout period");
                return None;
            }
        };

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(exit_code = code, stderr = %stderr.trim(), "Speech recognition failed");
            return None;
        }

        let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
        if text.is_empty() {
            debug!("Could not understand audio");
            None
        } else {
            Some(text)
        }
    }

    async fn is_available(&self) -> bool {
        let program = self.program();
        if program.is_empty() {
            return false;
        }
        let probe = if cfg!(target_os = "windows") {
            Command::new("where").arg(program).output().await
        } else {
            Command::new("sh")
                .arg("-c")
                .arg(format!("command -v {program}"))
                .output()
                .await
        };
        probe.map(|o| o.status.success()).unwrap_or(false)
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;

    fn recognizer(cmd: &str) -> CommandRecognizer {
        CommandRecognizer::new(cmd, Duration::from_secs(5))
    }

    #[tokio::test]
    async fn stdout_is_the_transcript() {
        let text = recognizer("echo '  turn on the lights  '").recognize().await;
        assert_eq!(text.as_deref(), Some("turn on the lights"));
    }

    #[tokio::test]
    async fn empty_output_is_unrecognized() {
        assert!(recognizer("true").recognize().await.is_none());
    }

    #[tokio::test]
    async fn failing_command_is_unrecognized() {
        assert!(recognizer("echo partial; exit 3").recognize().await.is_none());
    }

    #[tokio::test]
    async fn slow_command_times_out() {
        let r = CommandRecognizer::new("sleep 5; echo late", Duration::from_millis(100));
        assert!(r.recognize().await.is_none());
    }

    #[tokio::test]
    async fn availability_checks_the_program() {
        assert!(recognizer("sh -c 'echo hi'").is_available().await);
        assert!(!recognizer("definitely-not-a-real-stt-binary --listen").is_available().await);
    }

    #[test]
    fn from_config_requires_a_command() {
        assert!(CommandRecognizer::from_config(&VoiceConfig::default()).is_none());

        let blank = VoiceConfig {
            command: Some("   ".into()),
            timeout_secs: 10,
        };
        assert!(CommandRecognizer::from_config(&blank).is_none());

        let configured = VoiceConfig {
            command: Some("whisper-listen --lang en".into()),
            timeout_secs: 10,
        };
        let r = CommandRecognizer::from_config(&configured).unwrap();
        assert_eq!(r.command(), "whisper-listen --lang en");
        assert_eq!(r.name(), "command");
    }
}
