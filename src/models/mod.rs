pub mod language;
pub mod lexicon;
pub mod proceeding;

pub use language::*;
pub use lexicon::*;
pub use proceeding::*;
