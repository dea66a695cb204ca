//! Engine configuration.

/// Number of independent peer rounds in a standard audit. Small and fixed
/// so peer concurrency is bounded by design, not by a runtime limiter.
pub const DEFAULT_PEER_ROUNDS: usize = 5;

/// Tunables for one round-table audit.
#[derive(Debug, Clone)]
pub struct AuditConfig {
    /// How many independent peer rounds to fan out.
    pub peers: usize,
    /// Explicit financial ceiling, overriding the co-payment total
    /// declared by the payment program.
    pub ceiling_override: Option<i64>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            peers: DEFAULT_PEER_ROUNDS,
            ceiling_override: None,
        }
    }
}

impl AuditConfig {
    /// Set the peer fan-out (at least 1).
    pub fn with_peers(mut self, peers: usize) -> Self {
        self.peers = peers.max(1);
        self
    }

    /// Override the derived ceiling.
    pub fn with_ceiling(mut self, ceiling: i64) -> Self {
        self.ceiling_override = Some(ceiling);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_five_peers_and_no_override() {
        let config = AuditConfig::default();
        assert_eq!(config.peers, 5);
        assert!(config.ceiling_override.is_none());
    }

    #[test]
    fn builder_overrides_apply() {
        let config = AuditConfig::default().with_peers(3).with_ceiling(50_000);
        assert_eq!(config.peers, 3);
        assert_eq!(config.ceiling_override, Some(50_000));
    }

    #[test]
    fn peer_count_never_drops_below_one() {
        let config = AuditConfig::default().with_peers(0);
        assert_eq!(config.peers, 1);
    }
}
