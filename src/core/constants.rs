/// Length of a round in seconds
pub const ROUND_DURATION_SECONDS: u64 = 60;

/// Pause between a round's result and the next round
pub const COOLDOWN_SECONDS: u64 = 5;

/// Interval of the periodic board broadcast
pub const TICK_INTERVAL_MILLIS: u64 = 1000;

/// Outbound messages buffered per connection before it is considered lagging
pub const OUTBOUND_QUEUE_CAPACITY: usize = 256;

/// Largest inbound text frame accepted from a client
pub const MAX_MESSAGE_BYTES: usize = 1024;

/// Avatar used when the identity provider supplies no picture
pub const DEFAULT_AVATAR: &str = "/img/avatar.webp";

/// Wire marker for the elected cell
pub const WINNER_MARKER: &str = "winner";
