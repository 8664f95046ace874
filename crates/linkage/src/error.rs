use std::fmt;

#[derive(Debug)]
pub enum LinkageError {
    /// TOML parse / deserialization error.
    ConfigParse(String),
    /// Config validation error (bad threshold, missing name source, etc.).
    ConfigValidation(String),
    /// Combine strategy name not one of weighted/average/max/min.
    UnknownCombineMethod(String),
    /// Scorer name not one of the built-in scorers.
    UnknownScorer(String),
    /// A matcher was configured without any field specs.
    EmptyFieldSpecs,
    /// Two field specs share the same source field.
    DuplicateField(String),
    /// Weight is negative, NaN, or the weights cannot be normalized.
    InvalidWeight { field: String, weight: f64 },
    /// CSV read error.
    Csv(String),
    /// IO error (file read, etc.).
    Io(String),
}

impl fmt::Display for LinkageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ConfigParse(msg) => write!(f, "config parse error: {msg}"),
            Self::ConfigValidation(msg) => write!(f, "config validation error: {msg}"),
            Self::UnknownCombineMethod(name) => write!(
                f,
                "unknown combine method '{name}' (expected weighted, average, max or min)"
            ),
            Self::UnknownScorer(name) => write!(
                f,
                "unknown scorer '{name}' \
                 (expected exact_normalized, token_order, token_set, partial or ratio)"
            ),
            Self::EmptyFieldSpecs => write!(f, "matcher requires at least one field spec"),
            Self::DuplicateField(field) => {
                write!(f, "field '{field}' is matched by more than one field spec")
            }
            Self::InvalidWeight { field, weight } => {
                write!(f, "field '{field}': invalid weight {weight}")
            }
            Self::Csv(msg) => write!(f, "CSV error: {msg}"),
            Self::Io(msg) => write!(f, "IO error: {msg}"),
        }
    }
}

impl std::error::Error for LinkageError {}

impl LinkageError {
    /// True for errors caused by a bad configuration rather than bad input data.
    pub fn is_config(&self) -> bool {
        matches!(
            self,
            Self::ConfigParse(_)
                | Self::ConfigValidation(_)
                | Self::UnknownCombineMethod(_)
                | Self::UnknownScorer(_)
                | Self::EmptyFieldSpecs
                | Self::DuplicateField(_)
                | Self::InvalidWeight { .. }
        )
    }
}
