/// Domain errors surfaced to the user through `anyhow`
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportError {
    /// The workbook opened but contains no worksheets
    NoSheets,
    /// A configuration value cannot be used
    InvalidConfig { field: String, reason: String },
}

impl std::fmt::Display for ImportError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ImportError::NoSheets => write!(f, "Workbook has no sheets"),
            ImportError::InvalidConfig { field, reason } => {
                write!(f, "Invalid configuration value '{}': {}", field, reason)
            }
        }
    }
}

impl std::error::Error for ImportError {}
