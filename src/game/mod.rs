//! Economy model and idle accrual
//!
//! Everything in here is pure and platform-free:
//! - No DOM, storage, or audio dependencies
//! - Time enters only as values passed into `AccrualClock::poll`
//! - All transitions are total functions (invalid purchases are no-ops)

pub mod accrual;
pub mod state;

pub use accrual::AccrualClock;
pub use state::GameState;
