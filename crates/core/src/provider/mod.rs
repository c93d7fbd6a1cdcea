//! Collaborators the orchestrator delegates provisioning work to.
//!
//! The orchestrator only sees the traits. Production uses the command-backed
//! implementations; tests use the mocks in [`crate::testing`].

mod command;
mod config;
mod error;
mod resource;
mod traits;

pub use command::{
    parse_result_code, CommandAccount, CommandFeatureResources, CommandProviderFactory, Operation,
};
pub use config::CommandConfig;
pub use error::ProviderError;
pub use resource::{parse_stack_resources, StackResource};
pub use traits::{AccountProvider, FeatureResourcesProvider, ProviderFactory};
