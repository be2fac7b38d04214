//! Response frames the agent emits (§4.J).

use serde::{Deserialize, Serialize};

use crate::wire::{WireSignature, WireStats};
use core::ErrorKind;

/// The handshake frame emitted once, immediately after a connection is
/// accepted (§4.J).
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct Handshake {
    /// Always `"ready"`.
    pub status: String,
    /// Protocol version, currently `"2.0"`.
    pub version: String,
}

impl Default for Handshake {
    fn default() -> Self {
        Self {
            status: "ready".to_string(),
            version: "2.0".to_string(),
        }
    }
}

/// One response frame (§4.J, §6). Distinct variants rather than a single
/// flexible struct, because each command's success shape carries
/// different optional fields and unknown-command/protocol failures are
/// reported through a bare `error` key rather than `status`.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum Response {
    /// `{"pong":true}`, answering `ping`.
    Pong {
        /// Always `true`.
        pong: bool,
    },
    /// `{"status":"ok", ...}`, answering any command that completed
    /// successfully with no further payload, or one of the typed
    /// `Ok*` variants below when it does carry one.
    Ok {
        /// Always `"ok"`.
        status: String,
    },
    /// `{"status":"ok","path":...}`, answering `save_version`,
    /// `save_delta`, and `delete_file`.
    OkPath {
        /// Always `"ok"`.
        status: String,
        /// The logical path that was saved or deleted.
        path: String,
    },
    /// `{"status":"ok","signature":...}`, answering `get_signature`.
    OkSignature {
        /// Always `"ok"`.
        status: String,
        /// The requested path's block signature.
        signature: WireSignature,
    },
    /// `{"status":"not_found"}`, answering `get_signature` for a path
    /// with no saved version.
    NotFound {
        /// Always `"not_found"`.
        status: String,
    },
    /// `{"status":"ok","stats":...}`, answering `get_stats`.
    OkStats {
        /// Always `"ok"`.
        status: String,
        /// Whole-catalog statistics.
        stats: WireStats,
    },
    /// `{"status":"ok","pruned":N}`, answering `prune`.
    OkPruned {
        /// Always `"ok"`.
        status: String,
        /// Number of versions retired.
        pruned: u64,
    },
    /// `{"status":"ok","message":...}`, answering `gc`.
    OkMessage {
        /// Always `"ok"`.
        status: String,
        /// Human-readable summary of what the command did.
        message: String,
    },
    /// `{"status":"error","message":...,"error_kind":...}`, answering a
    /// known command that failed (§7). The connection stays open.
    Error {
        /// Always `"error"`.
        status: String,
        /// Human-readable description of the failure.
        message: String,
        /// The stable taxonomy tag of the underlying [`core::Error`].
        error_kind: String,
    },
    /// `{"error":...}`, answering a request whose `cmd` was not
    /// recognized, or whose frame could not be parsed at all (§4.J).
    UnknownCommand {
        /// Description of the malformed or unrecognized request.
        error: String,
    },
}

impl Response {
    /// `{"pong":true}`.
    #[must_use]
    pub const fn pong() -> Self {
        Self::Pong { pong: true }
    }

    /// `{"status":"ok"}`.
    #[must_use]
    pub fn ok() -> Self {
        Self::Ok {
            status: "ok".to_string(),
        }
    }

    /// `{"status":"ok","path":path}`.
    #[must_use]
    pub fn ok_path(path: impl Into<String>) -> Self {
        Self::OkPath {
            status: "ok".to_string(),
            path: path.into(),
        }
    }

    /// `{"status":"ok","signature":signature}`.
    #[must_use]
    pub fn ok_signature(signature: WireSignature) -> Self {
        Self::OkSignature {
            status: "ok".to_string(),
            signature,
        }
    }

    /// `{"status":"not_found"}`.
    #[must_use]
    pub fn not_found() -> Self {
        Self::NotFound {
            status: "not_found".to_string(),
        }
    }

    /// `{"status":"ok","stats":stats}`.
    #[must_use]
    pub fn ok_stats(stats: WireStats) -> Self {
        Self::OkStats {
            status: "ok".to_string(),
            stats,
        }
    }

    /// `{"status":"ok","pruned":pruned}`.
    #[must_use]
    pub fn ok_pruned(pruned: u64) -> Self {
        Self::OkPruned {
            status: "ok".to_string(),
            pruned,
        }
    }

    /// `{"status":"ok","message":message}`.
    #[must_use]
    pub fn ok_message(message: impl Into<String>) -> Self {
        Self::OkMessage {
            status: "ok".to_string(),
            message: message.into(),
        }
    }

    /// `{"status":"error","message":...,"error_kind":...}`, built from a
    /// core error's taxonomy tag (§7).
    #[must_use]
    pub fn error(message: impl Into<String>, kind: ErrorKind) -> Self {
        Self::Error {
            status: "error".to_string(),
            message: message.into(),
            error_kind: kind.to_string(),
        }
    }

    /// `{"error":...}`, for unknown commands or malformed frames.
    #[must_use]
    pub fn unknown_command(description: impl Into<String>) -> Self {
        Self::UnknownCommand {
            error: description.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pong_serializes_without_status() {
        let json = serde_json::to_string(&Response::pong()).unwrap();
        assert_eq!(json, r#"{"pong":true}"#);
    }

    #[test]
    fn ok_path_carries_status_and_path() {
        let json = serde_json::to_string(&Response::ok_path("docs/a.txt")).unwrap();
        assert_eq!(json, r#"{"status":"ok","path":"docs/a.txt"}"#);
    }

    #[test]
    fn unknown_command_uses_bare_error_key() {
        let json =
            serde_json::to_string(&Response::unknown_command("Unknown command: bogus")).unwrap();
        assert_eq!(json, r#"{"error":"Unknown command: bogus"}"#);
    }

    #[test]
    fn error_response_carries_taxonomy_tag() {
        let response = Response::error("incorrect password", ErrorKind::BadPassword);
        let json = serde_json::to_string(&response).unwrap();
        assert_eq!(
            json,
            r#"{"status":"error","message":"incorrect password","error_kind":"bad_password"}"#
        );
    }

    #[test]
    fn handshake_matches_the_documented_shape() {
        let json = serde_json::to_string(&Handshake::default()).unwrap();
        assert_eq!(json, r#"{"status":"ready","version":"2.0"}"#);
    }
}
