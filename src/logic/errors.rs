use std::result;
use thiserror::Error;

#[derive(Clone, Copy, Error, Debug, PartialEq, Eq)]
pub enum LogicError {
    #[error("Tribool value is not determinate")]
    ValueNotDeterminate,
}

pub type LogicResult<T> = result::Result<T, LogicError>;
