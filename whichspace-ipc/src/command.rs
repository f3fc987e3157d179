use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Command {
    // Queries
    GetSpace,

    // Re-run the resolution pipeline now
    Refresh,

    // Control
    Quit,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Response {
    Ok,
    Error { message: String },
    Space { space: SpaceInfo },
}

/// The state currently shown in the menu bar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpaceInfo {
    /// 1-based space number, absent when the active space is unknown
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub number: Option<u32>,
    /// Text handed to the status item ("3", or the placeholder)
    pub label: String,
}

impl SpaceInfo {
    pub fn is_known(&self) -> bool {
        self.number.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_command_wire_format() {
        let json = serde_json::to_string(&Command::GetSpace).unwrap();
        assert_eq!(json, r#"{"type":"get_space"}"#);

        let cmd: Command = serde_json::from_str(r#"{"type":"refresh"}"#).unwrap();
        assert_eq!(cmd, Command::Refresh);
    }

    #[test]
    fn test_unknown_space_omits_number() {
        let response = Response::Space {
            space: SpaceInfo {
                number: None,
                label: "?".to_string(),
            },
        };
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(json, r#"{"type":"space","space":{"label":"?"}}"#);
    }

    #[test]
    fn test_space_response_parses() {
        let response: Response =
            serde_json::from_str(r#"{"type":"space","space":{"number":3,"label":"3"}}"#).unwrap();
        match response {
            Response::Space { space } => {
                assert!(space.is_known());
                assert_eq!(space.number, Some(3));
            }
            other => panic!("unexpected response: {:?}", other),
        }
    }

    #[test]
    fn test_error_response_parses() {
        let response: Response =
            serde_json::from_str(r#"{"type":"error","message":"boom"}"#).unwrap();
        assert_eq!(
            response,
            Response::Error {
                message: "boom".to_string()
            }
        );
    }
}
