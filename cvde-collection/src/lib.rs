pub mod messages;
pub mod tracking;

pub use messages::{
    build_driver_request_message, build_reminder_message, validate_driver_phone, whatsapp_link,
    CollectionError,
};
pub use tracking::{
    collection_deadline, track_collection, CollectionStatus, CollectionTracking,
    COLLECTION_SLA_MINUTES,
};
