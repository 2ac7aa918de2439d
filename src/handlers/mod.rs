pub mod shares;
pub mod tags;
