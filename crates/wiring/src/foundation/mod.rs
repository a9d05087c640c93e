//! Capabilities the engine consumes
//!
//! - **Traits**: `Trigger`, `TriggerListener`, `DataProvider`, `Rule`,
//!   `ResultHandler`, `Disposable`, `Aggregator`
//! - **Identity**: `Handle`, an address-keyed `Arc`
//! - **Errors**: `WiringError`

pub mod error;
pub mod handle;
pub mod traits;

pub use error::{WiringError, WiringResult};
pub use handle::{Handle, address_of};
pub use traits::{
    Aggregator, AggregatorRef, DataProvider, DataProviderRef, Disposable, ResultHandler,
    ResultHandlerRef, Rule, RuleRef, Trigger, TriggerEvent, TriggerListener, TriggerRef,
};
