// Identity & Clock Ports (injected so tests stay deterministic)

/// Source of unique task IDs
pub trait IdProvider: Send + Sync {
    fn generate_id(&self) -> String;
}

/// Source of "now" in epoch milliseconds
pub trait TimeProvider: Send + Sync {
    fn now_millis(&self) -> i64;
}

/// UUID v4 ids
pub struct UuidProvider;

impl IdProvider for UuidProvider {
    fn generate_id(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Wall clock (UTC)
pub struct SystemTimeProvider;

impl TimeProvider for SystemTimeProvider {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}
