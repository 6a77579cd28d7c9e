//! Call bounded context - manages the lifecycle of notification calls

pub mod aggregate;
pub mod entity;
pub mod event;
pub mod platform;
pub mod registry;
pub mod service;
pub mod value_object;

pub use aggregate::{CallSession, CallSummary, RingTimer};
pub use entity::CalleeInfo;
pub use event::{CallLifecycleEvent, PlaybackOperationEvent, ProgressEvent};
pub use platform::CallPlatform;
pub use registry::{CallRegistry, SessionHandle};
pub use service::{CallDomainService, PickupClass};
pub use value_object::{
    CallTarget, MenuSelection, OperationOutcome, ReportedCallState, SessionState, ToneDigit,
};
