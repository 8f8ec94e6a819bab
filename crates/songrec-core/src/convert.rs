//! Resampling through an external converter (FFmpeg by default)
//!
//! The converter runs as a blocking subprocess. Only its exit status is
//! looked at; nothing it prints is parsed.

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};

use crate::config::ConverterConfig;
use crate::error::ConvertError;

/// File name prefix of mono outputs
pub const MONO_PREFIX: &str = "mono_";

pub struct Converter {
    program: String,
}

impl Converter {
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
        }
    }

    pub fn from_config(config: &ConverterConfig) -> Self {
        Self::new(config.program.clone())
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Command line for one conversion and the path the output lands at.
    ///
    /// A mono conversion is also forced to 16-bit PCM and written next to
    /// `output` with [`MONO_PREFIX`] in front of the file name.
    pub fn arguments(
        &self,
        input: &Path,
        output: &Path,
        target_sample_rate: u32,
        to_mono: bool,
    ) -> (Vec<OsString>, PathBuf) {
        let mut args: Vec<OsString> = vec![
            "-i".into(),
            input.as_os_str().to_owned(),
            "-ar".into(),
            target_sample_rate.to_string().into(),
            "-y".into(),
        ];

        let output = if to_mono {
            args.extend(["-ac", "1", "-c:a", "pcm_s16le"].map(OsString::from));
            mono_path(output)
        } else {
            output.to_path_buf()
        };

        args.push(output.as_os_str().to_owned());
        (args, output)
    }

    /// Convert `input` and return the path of the written file
    pub fn convert(
        &self,
        input: &Path,
        output: &Path,
        target_sample_rate: u32,
        to_mono: bool,
    ) -> Result<PathBuf, ConvertError> {
        let (args, output) = self.arguments(input, output, target_sample_rate, to_mono);
        log::debug!("Running {} {:?}", self.program, args);

        let status = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .map_err(|source| ConvertError::Spawn {
                program: self.program.clone(),
                source,
            })?;

        if !status.success() {
            return Err(ConvertError::Failed {
                program: self.program.clone(),
                status,
            });
        }

        log::info!("Converted {} -> {}", input.display(), output.display());
        Ok(output)
    }
}

impl Default for Converter {
    fn default() -> Self {
        Self::from_config(&ConverterConfig::default())
    }
}

fn mono_path(output: &Path) -> PathBuf {
    let mut name = OsString::from(MONO_PREFIX);
    name.push(output.file_name().unwrap_or(output.as_os_str()));
    output.with_file_name(name)
}
