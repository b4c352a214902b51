//! Channel Finder - Hierarchical Addressing Engine
//!
//! Resolves signal addresses in a multi-level naming hierarchy where some
//! levels are optional. A signal may sit directly under a device while its
//! siblings are grouped into subdevices; the engine decides per sibling
//! whether a child is a further group or a terminal signal.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │  Consumers: agent tools, channel-finder CLI, tests              │
//! └─────────────────────────────────────────────────────────────────┘
//!                               │
//!                               ▼
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      ChannelFinder                               │
//! │   list_children · inspect · build_addresses · validate · get    │
//! └─────────────────────────────────────────────────────────────────┘
//!          │                    │                     │
//!          ▼                    ▼                     ▼
//! ┌────────────────┐  ┌──────────────────┐  ┌──────────────────────┐
//! │   Navigator    │  │  AddressBuilder  │  │    ChannelIndex      │
//! │ (options_at)   │  │ (build, filters) │  │ (address → record)   │
//! └────────────────┘  └──────────────────┘  └──────────────────────┘
//!          │                    │                     ▲
//!          └─────────► ChannelTree + HierarchySchema ─┘ (one DFS at load)
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use channel_finder::{ChannelFinder, Selections};
//!
//! let finder = ChannelFinder::from_path("data/optional_levels.json")?;
//!
//! let selections = Selections::from([
//!     ("system", "CTRL"),
//!     ("subsystem", "MAIN"),
//!     ("device", "MC-01"),
//! ]);
//! let subdevices = finder.list_children("subdevice", &selections)?;
//!
//! let addresses = finder.build_addresses(&selections.with("signal", "Mode"), None, None)?;
//! assert!(addresses.iter().all(|a| finder.validate(a)));
//! ```

pub mod address;
pub mod config;
pub mod engine;
pub mod error;
pub mod index;
pub mod navigator;
pub mod preview;
pub mod schema;
pub mod tree;

pub use channel_types::{
    ChannelRecord, ChannelStatistics, ChildOption, HierarchyLevel, InspectedChild, LevelCount,
    LevelValue, NodeKind, Selections, WILDCARD,
};

pub use address::{AddressBuilder, FilterSet};
pub use config::ChannelFinderConfig;
pub use engine::ChannelFinder;
pub use error::{ConfigError, EngineError, NavigationError, SchemaError};
pub use index::ChannelIndex;
pub use navigator::Navigator;
pub use preview::{PreviewOptions, PreviewSection};
pub use schema::HierarchySchema;
pub use tree::{ChannelTree, NodeId};
