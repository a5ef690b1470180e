mod participant_id;
mod request_id;

pub use participant_id::ParticipantId;
pub use request_id::{RequestId, RequestIdGenerator};
