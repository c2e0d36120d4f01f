//! segmentctl-core: domain logic for segment membership
//!
//! - [`reconcile`]: pure set algebra turning add/remove requests into a plan
//! - [`names`]: validated segment names and user fields
//! - [`config`]: TOML + environment configuration shared by server and CLI

pub mod config;
pub mod error;
pub mod names;
pub mod reconcile;

pub use config::{DatabaseConfig, SegmentctlConfig, ServerSection};
pub use error::{ConfigError, ValidationError};
pub use names::{SegmentName, UserFields};
pub use reconcile::{reconcile, MembershipPlan, MembershipRequest};
