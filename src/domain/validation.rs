use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    Empty {
        field: &'static str,
    },
    MissingEnv {
        var: &'static str,
    },
    InvalidEndpoint {
        input: String,
    },
    ConflictingFilters {
        first: &'static str,
        second: &'static str,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty { field } => write!(f, "{field} must not be empty"),
            Self::MissingEnv { var } => write!(f, "environment variable {var} is not set"),
            Self::InvalidEndpoint { input } => write!(f, "invalid endpoint URL: {input}"),
            Self::ConflictingFilters { first, second } => {
                write!(f, "filters {first} and {second} cannot be combined")
            }
        }
    }
}

impl std::error::Error for ValidationError {}
