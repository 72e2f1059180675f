// Dispatch orchestration

pub mod coordinator;
pub mod selector;

pub use coordinator::{FanOutCoordinator, InvocationResult};
pub use selector::{CredentialSelector, FixedSelector, RandomSelector};
