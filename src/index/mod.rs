//! Channel index and derived statistics
//!
//! ```text
//! ChannelTree ──DFS──► ChannelIndex { address → ChannelRecord }
//!                              │
//!                              └──► ChannelStatistics
//! ```

mod channel_index;
pub mod stats;

pub use channel_index::ChannelIndex;
