//! Make WeChat voice messages playable
//!
//! Files that already carry an AMR header are copied as is. SILK encoded
//! files are decoded with the external SILK `decoder` and converted to WAV
//! with `sox`. Everything else gets an AMR header prepended.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::discovery::TreeEntry;
use crate::error::{MirrorError, MirrorResult, TransformError, TransformResult};

use super::{Transform, TransformOutcome};

pub const AMR_HEADER: &[u8] = b"#!AMR\n";
pub const DEFAULT_SILK_DECODER: &str = "/usr/local/bin/decoder";
pub const DEFAULT_SOX: &str = "/usr/bin/sox";

/// Number of leading bytes inspected to identify the format
const HEADER_LEN: usize = 32;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioKind {
    Amr,
    Silk,
    Unknown,
}

/// Identify the audio container from the first bytes of a file
pub fn detect(contents: &[u8]) -> AudioKind {
    let header = &contents[..contents.len().min(HEADER_LEN)];
    if contains(header, b"AMR") {
        AudioKind::Amr
    } else if contains(header, b"SILK") {
        AudioKind::Silk
    } else {
        AudioKind::Unknown
    }
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[derive(Debug, Clone)]
pub struct WechatAudio {
    silk_decoder: PathBuf,
    sox: PathBuf,
}

impl Default for WechatAudio {
    fn default() -> Self {
        Self::new(DEFAULT_SILK_DECODER, DEFAULT_SOX)
    }
}

impl WechatAudio {
    pub fn new(silk_decoder: impl Into<PathBuf>, sox: impl Into<PathBuf>) -> Self {
        Self {
            silk_decoder: silk_decoder.into(),
            sox: sox.into(),
        }
    }

    /// Confirm the external applications exist before any file is touched
    pub fn check_tools(&self) -> MirrorResult<()> {
        for tool in [&self.silk_decoder, &self.sox] {
            if !tool.is_file() {
                return Err(MirrorError::MissingTool { path: tool.clone() });
            }
        }
        Ok(())
    }

    /// Decode SILK audio to WAV through the external tools
    fn decode_silk(&self, contents: &[u8]) -> TransformResult<Vec<u8>> {
        let workdir = tempfile::tempdir()?;
        let silk = workdir.path().join("input.silk");
        let raw = workdir.path().join("decoded.raw");
        let wav = workdir.path().join("decoded.wav");

        std::fs::write(&silk, contents)?;

        run(
            Command::new(&self.silk_decoder)
                .arg(&silk)
                .arg(&raw)
                .arg("-quiet"),
            &self.silk_decoder,
        )?;
        run(
            Command::new(&self.sox)
                .args(["-traw", "-b16", "-esigned-integer", "-r24000"])
                .arg(&raw)
                .arg(&wav),
            &self.sox,
        )?;

        Ok(std::fs::read(&wav)?)
    }
}

fn run(command: &mut Command, program: &Path) -> TransformResult<()> {
    let status = command
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()?;
    if !status.success() {
        return Err(TransformError::Subprocess {
            program: program.display().to_string(),
            status,
        });
    }
    Ok(())
}

impl Transform for WechatAudio {
    fn name(&self) -> &'static str {
        "wechat-audio"
    }

    fn apply(&mut self, entry: &TreeEntry, contents: Vec<u8>) -> TransformResult<TransformOutcome> {
        let source = entry.source.display();
        match detect(&contents) {
            AudioKind::Amr => {
                tracing::debug!("'{}' appears to be an AMR file already. Copying.", source);
                Ok(TransformOutcome::Write(contents))
            }
            AudioKind::Silk => {
                tracing::debug!("'{}' appears to be a SILK file. Converting....", source);
                self.decode_silk(&contents).map(TransformOutcome::Write)
            }
            AudioKind::Unknown => {
                tracing::debug!("'{}' unknown. Adding AMR header....", source);
                let mut out = Vec::with_capacity(AMR_HEADER.len() + contents.len());
                out.extend_from_slice(AMR_HEADER);
                out.extend_from_slice(&contents);
                Ok(TransformOutcome::Write(out))
            }
        }
    }
}
