pub mod conversation;
pub mod document;
pub mod enums;
pub mod hospital;
pub mod patient;
pub mod prediction;
pub mod treatment;

pub use conversation::*;
pub use document::*;
pub use enums::*;
pub use hospital::*;
pub use patient::*;
pub use prediction::*;
pub use treatment::*;
