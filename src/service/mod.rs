pub mod coordinator;
pub mod health_evaluator;
pub mod provisioning;

pub use coordinator::{classify_response, CrossChainCoordinator};
pub use health_evaluator::{HealthEvaluator, HEALTH_QUERY};
pub use provisioning::{
    ExternalToolRedirect, ProvisioningHook, ProvisioningOutcome, ProvisioningRequest,
};
