use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CoreError {
    #[error("Invalid schedule identifier '{0}': expected schedule-<seq>-<BASE>-<QUOTE>-<kind>")]
    InvalidSchedule(String),

    #[error("Invalid input for {0}: {1}")]
    InvalidInput(String, String),
}
