pub mod me;
pub mod system;
