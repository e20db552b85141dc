pub mod apply;
pub mod baseline;
pub mod history;
pub mod preview;
pub mod validate;

pub use apply::*;
pub use baseline::*;
pub use history::*;
pub use preview::*;
pub use validate::*;
