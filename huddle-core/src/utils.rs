pub const DEFAULT_STUN_ADDR: &str = "stun:stun.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_2: &str = "stun:stun1.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_3: &str = "stun:stun2.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_4: &str = "stun:stun3.l.google.com:19302";
pub const DEFAULT_STUN_ADDR_5: &str = "stun:stun4.l.google.com:19302";

pub const DEFAULT_STUN_ADDRS: [&str; 5] = [
    DEFAULT_STUN_ADDR,
    DEFAULT_STUN_ADDR_2,
    DEFAULT_STUN_ADDR_3,
    DEFAULT_STUN_ADDR_4,
    DEFAULT_STUN_ADDR_5,
];

/// Path of the signaling WebSocket endpoint.
pub const SIGNALING_PATH: &str = "/ws/signaling";

/// Prefix of the caption WebSocket endpoint; the room id follows it.
pub const CAPTIONS_PATH_PREFIX: &str = "/ws/captions/";
