pub mod toml_loader;

pub use toml_loader::{load_all_matrix_plans, load_matrix_plan};
