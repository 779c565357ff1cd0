use axum::body::Bytes;

/// A webhook delivery waiting to be handled.
#[derive(Debug, Clone)]
pub struct Delivery {
    pub event_type: String,
    pub delivery_id: String,
    pub payload: Bytes,
}

impl Delivery {
    pub fn description(&self) -> String {
        format!("{} delivery {}", self.event_type, self.delivery_id)
    }
}
