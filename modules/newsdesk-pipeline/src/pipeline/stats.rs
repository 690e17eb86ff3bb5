use serde::Serialize;

/// Counters from one batch run.
#[derive(Debug, Default, Clone, PartialEq, Eq, Serialize)]
pub struct BatchStats {
    pub received: u32,
    pub admitted: u32,
    pub duplicates: u32,
    pub approved: u32,
    pub held: u32,
    pub rejected: u32,
    pub verified: u32,
    pub insufficient: u32,
    /// Topics whose source discovery errored. Retryable.
    pub failed: u32,
    /// Items dropped by an unexpected error, isolated from their siblings.
    pub errors: u32,
}

impl BatchStats {
    /// Share of evaluated candidates that were approved, in [0, 1].
    pub fn approval_rate(&self) -> f64 {
        let evaluated = self.evaluated();
        if evaluated == 0 {
            0.0
        } else {
            self.approved as f64 / evaluated as f64
        }
    }

    pub fn evaluated(&self) -> u32 {
        self.approved + self.held + self.rejected
    }
}

impl std::fmt::Display for BatchStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "\n=== Batch Complete ===")?;
        writeln!(f, "Received:     {}", self.received)?;
        writeln!(f, "Admitted:     {}", self.admitted)?;
        writeln!(f, "Duplicates:   {}", self.duplicates)?;
        writeln!(f, "\nDecisions:")?;
        writeln!(
            f,
            "  Approved: {} ({:.0}%)",
            self.approved,
            self.approval_rate() * 100.0
        )?;
        writeln!(f, "  Held:     {}", self.held)?;
        writeln!(f, "  Rejected: {}", self.rejected)?;
        writeln!(f, "\nVerification:")?;
        writeln!(f, "  Verified:     {}", self.verified)?;
        writeln!(f, "  Insufficient: {}", self.insufficient)?;
        writeln!(f, "  Failed:       {}", self.failed)?;
        if self.errors > 0 {
            writeln!(f, "\nErrors:       {}", self.errors)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn approval_rate_over_evaluated_only() {
        let stats = BatchStats {
            received: 12,
            duplicates: 2,
            approved: 1,
            held: 3,
            rejected: 6,
            ..Default::default()
        };
        assert_eq!(stats.evaluated(), 10);
        assert!((stats.approval_rate() - 0.1).abs() < 1e-9);
        assert_eq!(BatchStats::default().approval_rate(), 0.0);
    }

    #[test]
    fn display_reports_rate() {
        let stats = BatchStats {
            approved: 1,
            rejected: 4,
            ..Default::default()
        };
        assert!(stats.to_string().contains("Approved: 1 (20%)"));
    }
}
