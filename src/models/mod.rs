pub mod capabilities;
pub mod engine;
pub mod loaders;
pub mod matrix_plan;
pub mod report;
pub mod variant;

pub use capabilities::{CapabilitiesDescriptor, CloudExtension, BASELINE_STABILITY_ARGS};
pub use engine::BrowserEngine;
pub use loaders::{load_all_matrix_plans, load_matrix_plan};
pub use matrix_plan::MatrixPlan;
pub use report::{ExecutionResult, VariantOutcome};
pub use variant::{
    all_of_category, default_variant, resolve, try_resolve, BrowserVariant, VariantCategory,
    CATALOG,
};
