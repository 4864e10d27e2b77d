mod common;
mod meal;
mod weekly_memo;

pub use common::*;
pub use meal::*;
pub use weekly_memo::*;
