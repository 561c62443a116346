mod bank;
mod expense;
mod goal;
mod investment;
mod ledger;
mod lesson;
mod money;
mod profile;
mod projection;
mod transaction;

pub use bank::*;
pub use expense::*;
pub use goal::*;
pub use investment::*;
pub use ledger::*;
pub use lesson::*;
pub use money::*;
pub use profile::*;
pub use projection::*;
pub use transaction::*;
