//! Reading and writing the INI configuration file.
//!
//! The layout is the one Python's `configparser` produces, which the pipeline
//! executor reads back:
//!
//! ```text
//! [msa]
//! program_name = muscle
//! params = -quiet -maxiters 2
//! command_line = #program_name# #params# #input# #output#
//!
//! ```

use crate::error::{PhyloCfgError, Result};
use crate::options::{OptionKey, StageOptions};
use crate::pipeline::PipelineConfig;
use crate::selection::check_output;
use crate::stages::Stage;
use std::fmt::Write as _;
use std::fs;
use std::io::Write;
use std::path::Path;
use tracing::{debug, info};

impl PipelineConfig {
    /// Renders the configuration as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut out = String::new();
        for (stage, options) in self.iter() {
            let _ = writeln!(out, "[{stage}]");
            for (key, value) in options.iter() {
                if value.is_empty() {
                    let _ = writeln!(out, "{key} =");
                } else {
                    let _ = writeln!(out, "{key} = {value}");
                }
            }
            out.push('\n');
        }
        out
    }

    /// Parses INI text written by [`PipelineConfig::to_ini_string`].
    ///
    /// Blank lines and `#`/`;` comment lines are skipped. Unknown sections or
    /// keys are errors, as is a key outside any section.
    pub fn from_ini_str(text: &str) -> Result<Self> {
        let mut config = PipelineConfig::new();
        let mut current: Option<(Stage, Vec<(OptionKey, String)>)> = None;

        let flush = |config: &mut PipelineConfig,
                     section: Option<(Stage, Vec<(OptionKey, String)>)>|
         -> Result<()> {
            if let Some((stage, pairs)) = section {
                let options = StageOptions::from_pairs(
                    stage.as_str(),
                    pairs.iter().map(|(k, v)| (*k, v.as_str())),
                )?;
                config.insert(stage, options);
            }
            Ok(())
        };

        for (idx, raw) in text.lines().enumerate() {
            let line_no = idx + 1;
            let line = raw.trim();
            if line.is_empty() || line.starts_with(';') || line.starts_with('#') {
                continue;
            }

            if let Some(name) = line.strip_prefix('[').and_then(|l| l.strip_suffix(']')) {
                let stage = Stage::from_name(name.trim()).ok_or_else(|| PhyloCfgError::Parse {
                    line: line_no,
                    message: format!("unknown section [{name}]"),
                })?;
                flush(&mut config, current.take())?;
                current = Some((stage, Vec::new()));
                continue;
            }

            let (key, value) = line.split_once('=').ok_or_else(|| PhyloCfgError::Parse {
                line: line_no,
                message: format!("expected 'key = value', got {line:?}"),
            })?;
            let key = key.trim();
            let option = OptionKey::from_name(key).ok_or_else(|| PhyloCfgError::Parse {
                line: line_no,
                message: format!("unknown option '{key}'"),
            })?;
            let Some((_, pairs)) = current.as_mut() else {
                return Err(PhyloCfgError::Parse {
                    line: line_no,
                    message: format!("option '{key}' outside of any section"),
                });
            };
            pairs.push((option, value.trim().to_string()));
        }
        flush(&mut config, current.take())?;

        Ok(config)
    }
}

/// Writes `config` to `path`.
///
/// The whole text is rendered first and written with a single truncating
/// write. The file gets the process umask and a symlinked `path` writes
/// through to its target.
///
/// # Errors
/// - [`PhyloCfgError::OutputExists`] if `path` is a file and `overwrite` is
///   false
/// - I/O errors creating or writing the file
pub fn emit(config: &PipelineConfig, path: &Path, overwrite: bool) -> Result<()> {
    check_output(path, overwrite)?;

    if path.is_file() {
        info!("Output file \"{}\" will be overwritten", path.display());
    }

    let text = config.to_ini_string();
    let mut file = fs::File::create(path)?;
    file.write_all(text.as_bytes())?;
    file.flush()?;

    debug!("Wrote {} stages to {}", config.len(), path.display());
    Ok(())
}

/// Reads a configuration file written by [`emit`].
pub fn read(path: &Path) -> Result<PipelineConfig> {
    let text = fs::read_to_string(path)?;
    PipelineConfig::from_ini_str(&text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn sample() -> PipelineConfig {
        let mut config = PipelineConfig::new();
        config.insert(
            Stage::Msa,
            StageOptions::builder("msa")
                .program_name("mafft")
                .params("--quiet --anysymbol --auto")
                .environment(&[("TMPDIR", "/local-storage")])
                .positional_input()
                .positional_output()
                .command_template("#program_name# #params# #input# > #output#")
                .build()
                .unwrap(),
        );
        config.insert(
            Stage::Trim,
            StageOptions::builder("trim")
                .program_name("trimal")
                .params("-gappyout")
                .input("-in")
                .output("-out")
                .command_template("#program_name# #params# #input# #output#")
                .build()
                .unwrap(),
        );
        config
    }

    #[test]
    fn test_ini_layout() {
        let expected = "\
[msa]
program_name = mafft
params = --quiet --anysymbol --auto
input =
output =
command_line = #program_name# #params# #input# > #output#
environment = TMPDIR=/local-storage

[trim]
program_name = trimal
params = -gappyout
input = -in
output = -out
command_line = #program_name# #params# #input# #output#

";
        assert_eq!(sample().to_ini_string(), expected);
    }

    #[test]
    fn test_read_back() {
        let config = sample();
        let parsed = PipelineConfig::from_ini_str(&config.to_ini_string()).unwrap();
        assert_eq!(parsed, config);
    }

    #[test]
    fn test_parse_errors_carry_line() {
        let err = PipelineConfig::from_ini_str("[msa]\nprogram_name = muscle\nbogus = 1\n")
            .unwrap_err();
        assert!(matches!(err, PhyloCfgError::Parse { line: 3, .. }));

        let err = PipelineConfig::from_ini_str("program_name = muscle\n").unwrap_err();
        assert!(matches!(err, PhyloCfgError::Parse { line: 1, .. }));

        let err = PipelineConfig::from_ini_str("[aligner]\n").unwrap_err();
        assert!(matches!(err, PhyloCfgError::Parse { line: 1, .. }));
    }

    #[test]
    fn test_emit_respects_overwrite() {
        let dir = tempdir().unwrap();
        let out = dir.path().join("phylo.cfg");
        fs::write(&out, "previous content that is much longer than nothing\n").unwrap();

        assert!(matches!(
            emit(&sample(), &out, false),
            Err(PhyloCfgError::OutputExists(_))
        ));
        assert!(fs::read_to_string(&out).unwrap().starts_with("previous"));

        emit(&sample(), &out, true).unwrap();
        assert_eq!(fs::read_to_string(&out).unwrap(), sample().to_ini_string());
        assert_eq!(read(&out).unwrap(), sample());

        let entries: Vec<_> = fs::read_dir(dir.path()).unwrap().flatten().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_emit_honours_umask() {
        use nix::sys::stat::{umask, Mode};
        use std::os::unix::fs::PermissionsExt;

        let dir = tempdir().unwrap();
        let out = dir.path().join("phylo.cfg");

        let previous = umask(Mode::from_bits_truncate(0o022));
        let result = emit(&sample(), &out, false);
        umask(previous);
        result.unwrap();

        let mode = fs::metadata(&out).unwrap().permissions().mode() & 0o777;
        assert_eq!(mode, 0o644);
    }

    #[test]
    fn test_emit_writes_through_symlink() {
        use std::os::unix::fs::symlink;

        let dir = tempdir().unwrap();
        let target = dir.path().join("real.cfg");
        let link = dir.path().join("link.cfg");
        fs::write(&target, "old").unwrap();
        symlink(&target, &link).unwrap();

        emit(&sample(), &link, true).unwrap();

        assert!(fs::symlink_metadata(&link).unwrap().file_type().is_symlink());
        assert_eq!(fs::read_to_string(&target).unwrap(), sample().to_ini_string());
    }
}
