//! Logical message types.
//!
//! The logical type is declared by the payload itself and selects the
//! processor on the receiving side. It is independent of the envelope's
//! [`FrameType`](crate::FrameType), which only distinguishes request,
//! response and heartbeat framing.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Application-level message type tag.
///
/// Codes not known to this build decode as [`MessageType::Other`] so that
/// newer peers can introduce types without breaking older clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "u16", into = "u16")]
pub enum MessageType {
    GlobalBegin,
    GlobalBeginResult,
    BranchCommit,
    BranchCommitResult,
    BranchRollback,
    BranchRollbackResult,
    GlobalCommit,
    GlobalCommitResult,
    GlobalRollback,
    GlobalRollbackResult,
    BranchRegister,
    BranchRegisterResult,
    BranchStatusReport,
    BranchStatusReportResult,
    GlobalStatus,
    GlobalStatusResult,
    GlobalReport,
    GlobalReportResult,
    GlobalLockQuery,
    GlobalLockQueryResult,
    SeataMerge,
    SeataMergeResult,
    /// Transaction manager registration
    RegClt,
    /// Transaction manager registration result
    RegCltResult,
    /// Resource manager registration
    RegRm,
    /// Resource manager registration result
    RegRmResult,
    RmDeleteUndolog,
    HeartbeatMsg,
    BatchResultMsg,
    /// A code this build does not know
    Other(u16),
}

impl MessageType {
    /// Returns the numeric wire code.
    pub const fn code(self) -> u16 {
        match self {
            Self::GlobalBegin => 1,
            Self::GlobalBeginResult => 2,
            Self::BranchCommit => 3,
            Self::BranchCommitResult => 4,
            Self::BranchRollback => 5,
            Self::BranchRollbackResult => 6,
            Self::GlobalCommit => 7,
            Self::GlobalCommitResult => 8,
            Self::GlobalRollback => 9,
            Self::GlobalRollbackResult => 10,
            Self::BranchRegister => 11,
            Self::BranchRegisterResult => 12,
            Self::BranchStatusReport => 13,
            Self::BranchStatusReportResult => 14,
            Self::GlobalStatus => 15,
            Self::GlobalStatusResult => 16,
            Self::GlobalReport => 17,
            Self::GlobalReportResult => 18,
            Self::GlobalLockQuery => 21,
            Self::GlobalLockQueryResult => 22,
            Self::SeataMerge => 59,
            Self::SeataMergeResult => 60,
            Self::RegClt => 101,
            Self::RegCltResult => 102,
            Self::RegRm => 103,
            Self::RegRmResult => 104,
            Self::RmDeleteUndolog => 111,
            Self::HeartbeatMsg => 120,
            Self::BatchResultMsg => 121,
            Self::Other(code) => code,
        }
    }

    /// Returns true if this type is not known to this build.
    pub fn is_unknown(self) -> bool {
        matches!(self, Self::Other(_))
    }
}

impl From<u16> for MessageType {
    fn from(code: u16) -> Self {
        match code {
            1 => Self::GlobalBegin,
            2 => Self::GlobalBeginResult,
            3 => Self::BranchCommit,
            4 => Self::BranchCommitResult,
            5 => Self::BranchRollback,
            6 => Self::BranchRollbackResult,
            7 => Self::GlobalCommit,
            8 => Self::GlobalCommitResult,
            9 => Self::GlobalRollback,
            10 => Self::GlobalRollbackResult,
            11 => Self::BranchRegister,
            12 => Self::BranchRegisterResult,
            13 => Self::BranchStatusReport,
            14 => Self::BranchStatusReportResult,
            15 => Self::GlobalStatus,
            16 => Self::GlobalStatusResult,
            17 => Self::GlobalReport,
            18 => Self::GlobalReportResult,
            21 => Self::GlobalLockQuery,
            22 => Self::GlobalLockQueryResult,
            59 => Self::SeataMerge,
            60 => Self::SeataMergeResult,
            101 => Self::RegClt,
            102 => Self::RegCltResult,
            103 => Self::RegRm,
            104 => Self::RegRmResult,
            111 => Self::RmDeleteUndolog,
            120 => Self::HeartbeatMsg,
            121 => Self::BatchResultMsg,
            other => Self::Other(other),
        }
    }
}

impl From<MessageType> for u16 {
    fn from(t: MessageType) -> Self {
        t.code()
    }
}

impl fmt::Display for MessageType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Other(code) => write!(f, "unknown({code})"),
            known => write!(f, "{known:?}({})", known.code()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_codes_map_back() {
        for code in [1u16, 3, 5, 22, 60, 101, 102, 111, 120, 121] {
            let t = MessageType::from(code);
            assert!(!t.is_unknown(), "code {code} should be known");
            assert_eq!(t.code(), code);
        }
    }

    #[test]
    fn test_unknown_code_preserved() {
        let t = MessageType::from(999);
        assert_eq!(t, MessageType::Other(999));
        assert_eq!(u16::from(t), 999);
    }

    #[test]
    fn test_serializes_as_number() {
        let json = serde_json::to_string(&MessageType::HeartbeatMsg).unwrap();
        assert_eq!(json, "120");
        let parsed: MessageType = serde_json::from_str("2").unwrap();
        assert_eq!(parsed, MessageType::GlobalBeginResult);
    }

    #[test]
    fn test_display() {
        assert_eq!(MessageType::RegClt.to_string(), "RegClt(101)");
        assert_eq!(MessageType::Other(7).to_string(), "unknown(7)");
    }
}
