pub mod competence;
pub mod engine;
pub mod types;
