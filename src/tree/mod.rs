//! Tree store
//!
//! In-memory tree of named entities, built once from a definition and
//! immutable afterwards. Nodes live in a flat arena and are addressed by
//! `NodeId`; every node is either a `Group` or a `Terminal`.
//!
//! ```text
//! CTRL ─ MAIN ─ MC-01 ─┬─ Heartbeat      (terminal, skips subdevice)
//!                      ├─ Mode [RB, SP]  (terminal with suffixes)
//!                      └─ PSU ─┬─ Voltage
//!                              └─ Current
//! ```

mod builder;
mod instances;
mod node;

pub use builder::TreeBuilder;
pub use instances::{format_instance, InstanceSpec};
pub use node::{ChannelTree, GroupNode, Node, NodeId, TerminalNode, TreeNode};
