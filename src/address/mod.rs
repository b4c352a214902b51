//! Address construction from selections

mod builder;
pub mod filter;

pub use builder::{AddressBuilder, SUFFIX_SELECTION};
pub use filter::{numeric_token, FilterSet};
