pub mod codec;
pub mod options;
pub mod session;
pub mod values;

pub use options::*;
pub use session::*;
pub use values::*;
