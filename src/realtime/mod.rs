//! Sharing rolls with a group over a pub/sub channel.
//!
//! - `protocol` - Throw payloads and channel naming
//! - `channel` - Channel trait and the in-process loopback hub
//! - `supabase` - Supabase Realtime websocket and REST client
//! - `relay` - Bevy systems connecting the channel to the roll session

pub mod channel;
pub mod protocol;
pub mod relay;
pub mod supabase;

pub use channel::*;
pub use protocol::*;
pub use relay::*;
pub use supabase::{broadcast_rest, SupabaseChannel};
