//! Request frames the agent accepts (§4.J).

use serde::{Deserialize, Serialize};

use crate::wire::WireDeltaScript;

/// One request frame, tagged by its `cmd` field (§4.J, §6).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(tag = "cmd", rename_all = "snake_case")]
pub enum Request {
    /// Liveness check; always answered with `{"pong":true}`.
    Ping,
    /// Saves `data` (base64-encoded) as the next version of `path`.
    SaveVersion {
        /// Logical path being saved, relative to the backup root.
        path: String,
        /// Base64-encoded plaintext bytes.
        data: String,
    },
    /// Archives a final version of `path` and removes its shadow.
    DeleteFile {
        /// Logical path being deleted.
        path: String,
    },
    /// Requests the block signature of `path`'s latest version, the
    /// baseline for a subsequent `save_delta`.
    GetSignature {
        /// Logical path to compute a signature for.
        path: String,
    },
    /// Reconstructs `path`'s new content from `delta` against its
    /// current baseline, then saves it.
    SaveDelta {
        /// Logical path being saved.
        path: String,
        /// The delta script to apply against the current baseline.
        delta: WireDeltaScript,
    },
    /// Requests whole-catalog statistics.
    GetStats,
    /// Applies Grandfather-Father-Son retention, to one path if given,
    /// or every path otherwise.
    Prune {
        /// Logical path to prune, or every path if omitted.
        #[serde(skip_serializing_if = "Option::is_none", default)]
        path: Option<String>,
    },
    /// Runs one garbage collection pass.
    Gc,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ping_has_no_extra_fields() {
        let json = serde_json::to_string(&Request::Ping).unwrap();
        assert_eq!(json, r#"{"cmd":"ping"}"#);
    }

    #[test]
    fn save_version_round_trips() {
        let request = Request::SaveVersion {
            path: "docs/a.txt".to_string(),
            data: "aGVsbG8=".to_string(),
        };
        let json = serde_json::to_string(&request).unwrap();
        let parsed: Request = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, request);
    }

    #[test]
    fn prune_without_path_omits_the_field() {
        let json = serde_json::to_string(&Request::Prune { path: None }).unwrap();
        assert_eq!(json, r#"{"cmd":"prune"}"#);
    }

    #[test]
    fn prune_without_path_deserializes_from_bare_cmd() {
        let parsed: Request = serde_json::from_str(r#"{"cmd":"prune"}"#).unwrap();
        assert_eq!(parsed, Request::Prune { path: None });
    }

    #[test]
    fn unknown_cmd_fails_to_parse() {
        let result: Result<Request, _> = serde_json::from_str(r#"{"cmd":"reticulate_splines"}"#);
        assert!(result.is_err());
    }
}
