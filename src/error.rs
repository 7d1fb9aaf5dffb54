use thiserror::Error;

/// Failures surfaced to the user by planner operations and backend calls.
///
/// None of these are fatal: callers render the `Display` text and let the
/// user retry.
#[derive(Debug, Error)]
pub enum PlannerError {
    /// Host unreachable, timeout, connection reset.
    #[error("Unable to reach the planning service. Check your connection and try again. ({0})")]
    Connectivity(String),

    /// Non-2xx response. `detail` carries the server-supplied message, if any.
    #[error("{}", status_message(.status, .detail))]
    Status { status: u16, detail: Option<String> },

    /// Body could not be decoded at all.
    #[error("Unexpected response from the planning service: {0}")]
    Decode(String),

    #[error("{0}")]
    InvalidInput(String),

    #[error("Select at least one goal or add a custom goal before continuing")]
    EmptySelection,

    #[error("Unsupported statement file '{0}': expected .pdf, .csv, .xlsx or .xls")]
    UnsupportedFile(String),

    #[error("Failed to read statement: {0}")]
    Io(#[from] std::io::Error),
}

fn status_message(status: &u16, detail: &Option<String>) -> String {
    match detail.as_deref() {
        Some(d) if !d.trim().is_empty() => d.to_string(),
        _ => format!("Server responded with status: {status}"),
    }
}

impl PlannerError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl From<reqwest::Error> for PlannerError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            PlannerError::Status { status: status.as_u16(), detail: None }
        } else if err.is_decode() {
            PlannerError::Decode(err.to_string())
        } else if err.is_builder() {
            PlannerError::InvalidInput(err.to_string())
        } else {
            PlannerError::Connectivity(err.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn status_prefers_server_detail() {
        let err = PlannerError::Status { status: 400, detail: Some("bad goal".into()) };
        assert_eq!(err.to_string(), "bad goal");

        let err = PlannerError::Status { status: 502, detail: None };
        assert_eq!(err.to_string(), "Server responded with status: 502");

        let err = PlannerError::Status { status: 500, detail: Some("  ".into()) };
        assert_eq!(err.to_string(), "Server responded with status: 500");
    }
}
