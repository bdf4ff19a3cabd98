mod budget;
mod category;
mod goal;
mod ledger;
mod money;
mod owner;
mod period;
mod summary;
mod tip;
mod transaction;
pub mod validation;

pub use budget::*;
pub use category::*;
pub use goal::*;
pub use ledger::*;
pub use money::*;
pub use owner::*;
pub use period::*;
pub use summary::*;
pub use tip::*;
pub use transaction::*;
pub use validation::ValidationError;
