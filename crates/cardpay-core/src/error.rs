use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    // Identifier errors
    #[error("Invalid identifier: {0}")]
    InvalidIdentifier(String),

    // Reader session errors
    #[error("Unknown reader: {0}")]
    UnknownReader(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidStateTransition { from: String, to: String },
}

pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_invalid_state_transition_message() {
        let error = Error::InvalidStateTransition {
            from: "Idle".to_string(),
            to: "Connected".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid state transition from Idle to Connected"
        );
    }

    #[test]
    fn test_unknown_reader_message() {
        let error = Error::UnknownReader("CHB204909005931".to_string());
        assert_eq!(error.to_string(), "Unknown reader: CHB204909005931");
    }
}
