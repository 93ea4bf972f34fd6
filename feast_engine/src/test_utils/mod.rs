//! Helpers for setting up throwaway test databases. Also used by the server crate's endpoint tests.

pub mod prepare_env;

pub use prepare_env::{create_database, prepare_test_env, random_db_path, run_migrations};
