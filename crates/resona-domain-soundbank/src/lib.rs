pub mod codec;
pub mod connection;
pub mod generator;
pub mod region;

pub use codec::*;
pub use connection::*;
pub use generator::*;
pub use region::*;
