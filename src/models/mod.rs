use std::str::FromStr;

pub mod finance;
pub mod inventory;
pub mod order;
pub mod product;
pub mod user;

/// Parse an enum stored as text, reporting unknown values as a diesel
/// deserialization error.
pub(crate) fn parse_column<T>(value: &str) -> Result<T, diesel::result::Error>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    value
        .parse::<T>()
        .map_err(|err| diesel::result::Error::DeserializationError(Box::new(err)))
}
