use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RecorderError {
    #[error("Unexpected call: {call}")]
    UnexpectedCall { call: String },
    #[error("Expected call: {expected}\nActual call: {actual}")]
    CallMismatch { expected: String, actual: String },
    #[error("Missing calls: {}", .calls.join(", "))]
    MissingCalls { calls: Vec<String> },
    #[error("usage error: {0}")]
    Usage(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("config parse error: {0}")]
    ConfigParse(String),
    #[error("invalid config: {0}")]
    InvalidConfig(String),
    #[error("transcript error: {0}")]
    Transcript(String),
}

impl RecorderError {
    /// True for the three outcomes that mean the code under test diverged
    /// from the recorded sequence, as opposed to API misuse or I/O trouble.
    pub fn is_verification_failure(&self) -> bool {
        matches!(
            self,
            Self::UnexpectedCall { .. } | Self::CallMismatch { .. } | Self::MissingCalls { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::RecorderError;

    #[test]
    fn messages_carry_rendered_signatures() {
        let err = RecorderError::CallMismatch {
            expected: "mock(1, 2, 3)".to_string(),
            actual: "mock(2, 3, 4)".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Expected call: mock(1, 2, 3)\nActual call: mock(2, 3, 4)"
        );

        let err = RecorderError::MissingCalls {
            calls: vec!["mock(1)".to_string(), "mock.db(2)".to_string()],
        };
        assert_eq!(err.to_string(), "Missing calls: mock(1), mock.db(2)");
    }

    #[test]
    fn usage_errors_are_not_verification_failures() {
        assert!(!RecorderError::Usage("x".to_string()).is_verification_failure());
        assert!(RecorderError::UnexpectedCall {
            call: "mock()".to_string()
        }
        .is_verification_failure());
    }
}
