use serde::Deserialize;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellRequest {
    pub request_id: u64,
    pub command: String,
}

impl ShellRequest {
    pub fn new(request_id: u64, command: impl Into<String>) -> Self {
        Self {
            request_id,
            command: command.into(),
        }
    }
}

/// Outcome of one host command. `Err` carries the text shown to the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShellCompletion {
    pub request_id: u64,
    pub result: Result<String, String>,
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn completion_serializes_result_tag() {
        let done = ShellCompletion {
            request_id: 4,
            result: Err("denied".to_string()),
        };
        let value = serde_json::to_value(&done).unwrap();
        assert_eq!(
            value,
            serde_json::json!({"request_id": 4, "result": {"Err": "denied"}})
        );
    }
}
