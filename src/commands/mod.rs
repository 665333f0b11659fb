pub mod highlights;
pub mod number;
pub mod split;
