pub mod storage;
pub mod telemetry;

pub use storage::ObservedStore;
pub use telemetry::init_telemetry;
