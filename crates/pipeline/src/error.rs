use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Identity provider error: {0}")]
    Identity(String),
}
