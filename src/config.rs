//! Stack-wide tunables.

/// Largest payload carried by a single TCP segment.
pub const MAX_PAYLOAD_SIZE: usize = 1000;

/// Initial retransmission timeout, in milliseconds.
pub const DEFAULT_RTO_MS: u64 = 1000;

/// Default capacity for application byte streams.
pub const DEFAULT_CAPACITY: usize = 64_000;

/// Largest window a receiver will advertise.
pub const MAX_WINDOW: usize = 65_535;

/// How long a learned ARP mapping stays usable.
pub const ARP_ENTRY_TTL_MS: u64 = 30_000;

/// How long an unanswered ARP request suppresses re-broadcasts.
pub const ARP_REQUEST_TTL_MS: u64 = 5_000;

/// TTL for datagrams originated by this host.
pub const DEFAULT_TTL: u8 = 64;
