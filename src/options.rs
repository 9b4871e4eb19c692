//! Per-stage option maps and command-line templates.
//!
//! Each pipeline stage is described by a small set of named options (the flag
//! used for the input file, for the output file, the thread count and so on)
//! plus a command-line template that places those options. The pipeline
//! executor substitutes every `#key#` token of the template with the value of
//! `key` from the same stage. An option with an empty value marks a positional
//! argument: the executor substitutes the bare file name.

use crate::error::{PhyloCfgError, Result};
use indexmap::IndexMap;
use std::fmt;

/// Delimiter wrapped around option names inside a command-line template.
pub const PLACEHOLDER_DELIMITER: char = '#';

/// Input redirection marker allowed verbatim in templates.
pub const REDIRECT_IN: &str = "<";

/// Output redirection marker allowed verbatim in templates.
pub const REDIRECT_OUT: &str = ">";

/// Option names understood by the pipeline executor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum OptionKey {
    /// Name of the executable to use
    ProgramName,
    /// Fixed parameters
    Params,
    /// Flag passing the number of threads
    Threads,
    /// Flag for the input file
    Input,
    /// Flag for the database (or starting tree)
    Database,
    /// Flag for the folder that will contain the output file
    OutputPath,
    /// Flag for the output file
    Output,
    /// Arguments that print the version, used to check the installation
    Version,
    /// Explicit substitution model selection
    Model,
    /// The command-line template itself
    CommandLine,
    /// Environment variables, `VAR1=VALUE1,VAR2=VALUE2`
    Environment,
}

impl OptionKey {
    /// Every key, in the order used when writing a stage.
    pub const ALL: [OptionKey; 11] = [
        OptionKey::ProgramName,
        OptionKey::Params,
        OptionKey::Threads,
        OptionKey::Input,
        OptionKey::Database,
        OptionKey::OutputPath,
        OptionKey::Output,
        OptionKey::Version,
        OptionKey::Model,
        OptionKey::CommandLine,
        OptionKey::Environment,
    ];

    /// Name of the key as written in the configuration file.
    pub fn as_str(&self) -> &'static str {
        match self {
            OptionKey::ProgramName => "program_name",
            OptionKey::Params => "params",
            OptionKey::Threads => "threads",
            OptionKey::Input => "input",
            OptionKey::Database => "database",
            OptionKey::OutputPath => "output_path",
            OptionKey::Output => "output",
            OptionKey::Version => "version",
            OptionKey::Model => "model",
            OptionKey::CommandLine => "command_line",
            OptionKey::Environment => "environment",
        }
    }

    /// Looks a key up by its configuration-file name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.as_str() == name)
    }

    /// The `#key#` token for this option.
    pub fn placeholder(&self) -> String {
        format!("{PLACEHOLDER_DELIMITER}{}{PLACEHOLDER_DELIMITER}", self.as_str())
    }
}

impl fmt::Display for OptionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single token of a command-line template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token<'a> {
    /// `#name#`
    Placeholder(&'a str),
    /// `<` or `>`
    Redirect(&'a str),
    /// Anything else, passed through by the executor
    Literal(&'a str),
}

/// Command-line template with `#key#` placeholders.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandLine(String);

impl CommandLine {
    /// Builds a template from keys, in order.
    ///
    /// ```
    /// use phylocfg::options::{CommandLine, OptionKey};
    ///
    /// let cmd = CommandLine::from_keys(&[OptionKey::ProgramName, OptionKey::Input]);
    /// assert_eq!(cmd.as_str(), "#program_name# #input#");
    /// ```
    pub fn from_keys(keys: &[OptionKey]) -> Self {
        let tokens: Vec<String> = keys.iter().map(OptionKey::placeholder).collect();
        CommandLine(tokens.join(" "))
    }

    /// Wraps an already formatted template.
    pub fn parse(template: impl Into<String>) -> Self {
        CommandLine(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Splits the template into tokens.
    pub fn tokens(&self) -> impl Iterator<Item = Token<'_>> {
        self.0.split_whitespace().map(|tok| {
            if tok == REDIRECT_IN || tok == REDIRECT_OUT {
                Token::Redirect(tok)
            } else if tok.len() > 2
                && tok.starts_with(PLACEHOLDER_DELIMITER)
                && tok.ends_with(PLACEHOLDER_DELIMITER)
            {
                Token::Placeholder(&tok[1..tok.len() - 1])
            } else {
                Token::Literal(tok)
            }
        })
    }

    /// Names referenced by placeholders, in template order.
    pub fn placeholders(&self) -> impl Iterator<Item = &str> {
        self.tokens().filter_map(|tok| match tok {
            Token::Placeholder(name) => Some(name),
            _ => None,
        })
    }
}

impl fmt::Display for CommandLine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Immutable option map of a single pipeline stage.
///
/// Always holds `program_name` and `command_line`, and every placeholder of
/// the command line names an option of the same map.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageOptions {
    values: IndexMap<OptionKey, String>,
}

impl StageOptions {
    /// Creates a new builder for the given stage name.
    ///
    /// # Example
    /// ```
    /// use phylocfg::options::{OptionKey, StageOptions};
    ///
    /// let opts = StageOptions::builder("trim")
    ///     .program_name("trimal")
    ///     .params("-gappyout")
    ///     .input("-in")
    ///     .output("-out")
    ///     .command_line(&[
    ///         OptionKey::ProgramName,
    ///         OptionKey::Params,
    ///         OptionKey::Input,
    ///         OptionKey::Output,
    ///     ])
    ///     .build()
    ///     .unwrap();
    /// assert_eq!(opts.get(OptionKey::Params), Some("-gappyout"));
    /// ```
    pub fn builder(stage: impl Into<String>) -> StageOptionsBuilder {
        StageOptionsBuilder {
            stage: stage.into(),
            values: IndexMap::new(),
            command_line: None,
        }
    }

    pub fn get(&self, key: OptionKey) -> Option<&str> {
        self.values.get(&key).map(String::as_str)
    }

    pub fn contains(&self, key: OptionKey) -> bool {
        self.values.contains_key(&key)
    }

    /// The program name (always present).
    pub fn program_name(&self) -> &str {
        self.get(OptionKey::ProgramName).unwrap_or_default()
    }

    /// The command-line template (always present).
    pub fn command_line(&self) -> CommandLine {
        CommandLine::parse(self.get(OptionKey::CommandLine).unwrap_or_default())
    }

    /// Options in writing order.
    pub fn iter(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        self.values.iter().map(|(k, v)| (*k, v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Rebuilds a stage from raw key/value pairs, as read back from a file.
    pub fn from_pairs<'a, I>(stage: &str, pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (OptionKey, &'a str)>,
    {
        let mut builder = Self::builder(stage);
        for (key, value) in pairs {
            builder = match key {
                OptionKey::CommandLine => {
                    builder.command_line = Some(CommandLine::parse(value));
                    builder
                }
                key => builder.set(key, value),
            };
        }
        builder.build()
    }
}

/// Builder for [`StageOptions`].
#[derive(Debug)]
pub struct StageOptionsBuilder {
    stage: String,
    values: IndexMap<OptionKey, String>,
    command_line: Option<CommandLine>,
}

impl StageOptionsBuilder {
    /// Sets any option. Later calls replace earlier values.
    pub fn set(mut self, key: OptionKey, value: impl Into<String>) -> Self {
        self.values.insert(key, value.into());
        self
    }

    /// Sets an option only when `value` is `Some`.
    pub fn set_opt(self, key: OptionKey, value: Option<impl Into<String>>) -> Self {
        match value {
            Some(value) => self.set(key, value),
            None => self,
        }
    }

    pub fn program_name(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::ProgramName, value)
    }

    pub fn params(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Params, value)
    }

    pub fn threads(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Threads, value)
    }

    pub fn input(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Input, value)
    }

    /// Marks the input as a bare positional argument.
    pub fn positional_input(self) -> Self {
        self.set(OptionKey::Input, "")
    }

    pub fn database(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Database, value)
    }

    pub fn output_path(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::OutputPath, value)
    }

    pub fn output(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Output, value)
    }

    /// Marks the output as a bare positional argument.
    pub fn positional_output(self) -> Self {
        self.set(OptionKey::Output, "")
    }

    pub fn version(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Version, value)
    }

    pub fn model(self, value: impl Into<String>) -> Self {
        self.set(OptionKey::Model, value)
    }

    /// Sets environment variables as `VAR=VALUE` pairs.
    pub fn environment(self, vars: &[(&str, &str)]) -> Self {
        let joined: Vec<String> = vars.iter().map(|(k, v)| format!("{k}={v}")).collect();
        self.set(OptionKey::Environment, joined.join(","))
    }

    /// Sets the command line from a list of placeholders.
    pub fn command_line(mut self, keys: &[OptionKey]) -> Self {
        self.command_line = Some(CommandLine::from_keys(keys));
        self
    }

    /// Sets a free-form template (needed for redirection markers).
    pub fn command_template(mut self, template: impl Into<String>) -> Self {
        self.command_line = Some(CommandLine::parse(template));
        self
    }

    /// Validates and freezes the option map.
    ///
    /// # Errors
    /// - [`PhyloCfgError::MissingOption`] if `program_name` or
    ///   `command_line` was never set
    /// - [`PhyloCfgError::UnresolvedPlaceholder`] if the template names an
    ///   option that is not set
    pub fn build(mut self) -> Result<StageOptions> {
        if !self.values.contains_key(&OptionKey::ProgramName) {
            return Err(self.missing(OptionKey::ProgramName));
        }
        let command_line = self
            .command_line
            .take()
            .ok_or_else(|| self.missing(OptionKey::CommandLine))?;

        for name in command_line.placeholders() {
            let known = OptionKey::from_name(name)
                .map(|key| key != OptionKey::CommandLine && self.values.contains_key(&key))
                .unwrap_or(false);
            if !known {
                return Err(PhyloCfgError::UnresolvedPlaceholder {
                    stage: self.stage.clone(),
                    key: name.to_string(),
                });
            }
        }

        self.values.insert(OptionKey::CommandLine, command_line.0);
        self.values.sort_by(|a, _, b, _| a.cmp(b));
        Ok(StageOptions {
            values: self.values,
        })
    }

    fn missing(&self, key: OptionKey) -> PhyloCfgError {
        PhyloCfgError::MissingOption {
            stage: self.stage.clone(),
            key: key.to_string(),
        }
    }
}
