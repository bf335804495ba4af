// [libs/core/domain-generator/src/errors.rs]
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GeneratorError {
    #[error("pattern character_set must not be empty")]
    EmptyCharacterSet,

    #[error("offset range [{start}, {end}) exceeds pattern space of size {total}")]
    RangeExceedsSpace { start: u64, end: u64, total: u128 },
}
