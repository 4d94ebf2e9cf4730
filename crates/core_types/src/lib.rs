pub type RequestId = u64;

/// Identifies one render target (a container element) owned by the runtime.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContainerId(pub u64);

/// Monotonic counter of commits applied to one container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RenderVersion(pub u64);

impl RenderVersion {
    pub const INITIAL: RenderVersion = RenderVersion(0);

    pub fn next(self) -> Self {
        RenderVersion(self.0.saturating_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::RenderVersion;

    #[test]
    fn version_advances_monotonically() {
        let v = RenderVersion::INITIAL.next().next();
        assert_eq!(v, RenderVersion(2));
        assert!(v > RenderVersion::INITIAL);
        assert_eq!(RenderVersion(u64::MAX).next(), RenderVersion(u64::MAX));
    }
}
