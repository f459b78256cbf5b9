//! Domain events and their wire shapes.
//!
//! Incoming events are deserialized from the change-data-capture envelope and
//! validated once; outgoing (derived) events are constructed fresh at emission
//! time and carry their own storage key.

pub mod envelope;
pub mod event;
pub mod incoming;
pub mod keys;
pub mod outgoing;
pub mod record;

pub use envelope::ChangeRecord;
pub use event::Event;
pub use incoming::{IncomingEvent, OrderCreated, PaymentAccepted, PaymentRejected, RestockPlaced};
pub use outgoing::{OutgoingEvent, StockAllocated, StockDepleted, StockRestocked};
pub use record::EventRecord;
