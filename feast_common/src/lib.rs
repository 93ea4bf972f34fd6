mod money;

pub mod op;
mod secret;

pub use money::{Money, MoneyConversionError, CURRENCY_CODE, CURRENCY_SYMBOL};
pub use secret::Secret;
