pub mod messages;

/// Close code sent when the handshake query is missing `roomCode` or
/// `sessionId`. Distinct from an authentication failure so clients can
/// tell a malformed URL apart from a bad token.
pub const CLOSE_MISSING_PARAMS: u16 = 4000;

/// Policy-violation close code sent when the session token is unknown or
/// does not belong to the claimed room.
pub const CLOSE_INVALID_SESSION: u16 = 1008;

/// Maximum inbound frame size in bytes. Larger frames are dropped.
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024; // 64 KiB
