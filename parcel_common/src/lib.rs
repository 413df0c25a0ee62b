mod amount;
mod helpers;
mod secret;

pub use amount::{Amount, AmountConversionError, AMOUNT_SCALE};
pub use helpers::parse_boolean_flag;
pub use secret::Secret;
