//! Core utilities shared by the back-office dashboard: the confirmation
//! gate, currency formatting, and typed UI event hooks.
pub mod confirm;
pub mod currency;
pub mod event;

pub use confirm::{
    ActionType, ConfirmError, ConfirmationCoordinator, ConfirmationDialog, ConfirmationRequest,
    Decision, DismissReason, PendingConfirmation,
};
pub use currency::{AmountError, AmountInput, CurrencyAmount, CurrencyFormatter, TypedAmount};
pub use event::{ChartPoint, EventHook};
