//! The six versioned record types
mod balance;
mod cashback;
mod expense;
mod goal;
mod income;
mod income_expected;

pub use balance::Balance;
pub use cashback::Cashback;
pub use expense::Expense;
pub use goal::Goal;
pub use income::Income;
pub use income_expected::ExpectedIncome;
