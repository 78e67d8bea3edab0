//! Domain event envelopes published to the event stream.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Published after an account row has been durably created.
///
/// Delivery is best-effort from the producer's side; subscribers see
/// at-least-once semantics through the durable stream.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationEvent {
    pub email: String,
    pub id: Uuid,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registration_event_round_trips() {
        let event = RegistrationEvent {
            email: "a@b.com".to_string(),
            id: Uuid::new_v4(),
        };
        let bytes = serde_json::to_vec(&event).unwrap();
        let decoded: RegistrationEvent = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(decoded, event);
    }
}
