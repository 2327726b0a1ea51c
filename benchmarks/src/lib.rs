#[cfg(feature = "signing")]
pub mod signing;
