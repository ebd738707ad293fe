pub mod intake;
pub mod legal;
