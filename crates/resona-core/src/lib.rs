mod cascade;
pub mod conversion;
pub mod diagnostics;
pub mod error;
pub mod midi_resolver;
pub mod mixer_resolver;
pub mod preference;
pub mod readers;
pub mod registry;
pub mod system;

pub use conversion::*;
pub use diagnostics::*;
pub use error::*;
pub use midi_resolver::*;
pub use mixer_resolver::*;
pub use preference::*;
pub use readers::*;
pub use registry::*;
pub use system::*;
