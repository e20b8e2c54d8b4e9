pub mod lookup;
pub mod setup;
