use std::time::Duration;

/// What `Renderer::render` does when a render is already being built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum InFlightPolicy {
    /// Discard the in-flight work tree and start over against the current
    /// tree. Handles created for the discarded tree stay detached.
    #[default]
    Restart,
    /// Park the request (latest wins) and start it once the in-flight render
    /// has committed or failed.
    Queue,
}

#[derive(Clone, Debug)]
pub struct EngineConfig {
    /// The work loop yields once the host reports less than this much time
    /// left in the current slice.
    pub yield_threshold: Duration,
    pub in_flight: InFlightPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            yield_threshold: Duration::from_millis(1),
            in_flight: InFlightPolicy::Restart,
        }
    }
}
