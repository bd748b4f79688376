//! Application services for notification fan-out.

mod dispatcher;
mod resolver;
mod scan;
mod templates;
mod trigger;

pub use dispatcher::{
    DeliveryFailure, DeliveryPartialFailure, DispatchReport, NotificationDispatcher,
};
pub use resolver::{
    RecipientGroup, RecipientResolutionPartialFailure, RecipientResolver, Resolution,
};
pub use scan::{DueSoonScan, IntervalScheduler};
pub use templates::{Audience, TemplateContext, TemplateError, render_payload};
pub use trigger::{EventOutcome, LifecycleEventTrigger};
