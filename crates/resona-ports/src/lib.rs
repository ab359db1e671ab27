pub mod message;
pub mod midi;
pub mod preferences;
pub mod provider;
pub mod sampled;
pub mod sequence;
pub mod types;

pub use message::*;
pub use midi::*;
pub use preferences::*;
pub use provider::*;
pub use sampled::*;
pub use sequence::*;
pub use types::*;
