//! Token-budget configuration shared by the context and pressure
//! layers.

/// Derived token budgets for one session.
///
/// `msgs_fraction + working_ctx_fraction` must not exceed `1.0`; the
/// remainder is implicitly reserved for model output.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Budgets {
    /// Total tokens the model can consume per turn.
    pub context_size: u32,
    /// Fraction of `context_size` reserved for the message queue.
    pub msgs_fraction: f64,
    /// Fraction of `context_size` reserved for the working context.
    pub working_ctx_fraction: f64,
    /// Fraction of a budget that counts as "under pressure".
    pub pressure_threshold: f64,
}

impl Default for Budgets {
    fn default() -> Self {
        Self {
            context_size: 4096,
            msgs_fraction: 0.7,
            working_ctx_fraction: 0.3,
            pressure_threshold: 0.9,
        }
    }
}

impl Budgets {
    /// Build budgets, rejecting fractions that would overcommit the
    /// context window.
    pub fn try_new(
        context_size: u32,
        msgs_fraction: f64,
        working_ctx_fraction: f64,
        pressure_threshold: f64,
    ) -> Result<Self, String> {
        if msgs_fraction + working_ctx_fraction > 1.0 {
            return Err(format!(
                "msgs_fraction ({msgs_fraction}) + working_ctx_fraction ({working_ctx_fraction}) exceeds 1.0"
            ));
        }
        Ok(Self {
            context_size,
            msgs_fraction,
            working_ctx_fraction,
            pressure_threshold,
        })
    }

    /// Token budget for the message queue.
    pub fn msgs_budget(&self) -> f64 {
        self.context_size as f64 * self.msgs_fraction
    }

    /// Token budget for the working-context scratchpad.
    pub fn working_ctx_budget(&self) -> f64 {
        self.context_size as f64 * self.working_ctx_fraction
    }

    /// Pressure fires at `pressure_threshold * budget`, inclusive.
    pub fn msgs_pressure_point(&self) -> f64 {
        self.pressure_threshold * self.msgs_budget()
    }

    /// Pressure fires at `pressure_threshold * budget`, inclusive.
    pub fn working_ctx_pressure_point(&self) -> f64 {
        self.pressure_threshold * self.working_ctx_budget()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_budgets_match_spec_defaults() {
        let b = Budgets::default();
        assert_eq!(b.context_size, 4096);
        assert_eq!(b.msgs_fraction, 0.7);
        assert_eq!(b.working_ctx_fraction, 0.3);
        assert_eq!(b.pressure_threshold, 0.9);
    }

    #[test]
    fn rejects_overcommitted_fractions() {
        let result = Budgets::try_new(4096, 0.8, 0.3, 0.9);
        assert!(result.is_err());
    }

    #[test]
    fn msgs_budget_is_fraction_of_context_size() {
        let b = Budgets::default();
        assert_eq!(b.msgs_budget(), 4096.0 * 0.7);
    }
}
