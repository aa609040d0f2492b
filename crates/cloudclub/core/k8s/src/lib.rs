#[cfg(feature = "manager")]
pub mod manager;
