pub mod followup;
pub mod history;
pub mod keywords;

pub use followup::*;
pub use history::*;
