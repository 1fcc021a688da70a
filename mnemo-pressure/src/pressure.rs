//! Budget inspection and primer maintenance. Stateless given a
//! [`MemoryContext`] reference — everything here is a pure function
//! of the context's current token counts.

use std::collections::HashMap;

use mnemo_context::MemoryContext;
use mnemo_core::{Message, Role};

use crate::templates::Instructions;

/// Token-budget accounting and warning synthesis.
pub struct PressureMonitor {
    instructions: Instructions,
}

impl PressureMonitor {
    /// Build a monitor over the given instruction templates.
    pub fn new(instructions: Instructions) -> Self {
        Self { instructions }
    }

    /// Render `key` against `vars`. See [`Instructions::render`].
    pub fn render(&self, key: &str, vars: &HashMap<&str, String>) -> Result<String, mnemo_core::MemoryError> {
        self.instructions.render(key, vars)
    }

    /// Zero, one, or two system warnings: `pressure:workingContext`
    /// when working-context tokens are at or above 90% of its
    /// budget, `pressure:messages` when message-queue tokens are at
    /// or above 90% of its budget. Both thresholds are inclusive and
    /// independent — both may fire from the same inspection.
    ///
    /// A template failure is logged and that warning is dropped; it
    /// never aborts the turn, per the template-error policy.
    pub fn inspect(&self, ctx: &MemoryContext) -> Vec<Message> {
        let budgets = ctx.budgets();
        let mut warnings = Vec::new();

        let wc_size = ctx.token_size_working_context();
        if wc_size as f64 >= budgets.working_ctx_pressure_point() {
            let mut vars = HashMap::new();
            vars.insert("workingContextSize", wc_size.to_string());
            match self.instructions.render("pressure:workingContext", &vars) {
                Ok(text) => warnings.push(Message::text(Role::System, text)),
                Err(e) => tracing::warn!(error = %e, "dropping workingContext pressure warning"),
            }
        }

        let msgs_size = ctx.token_size_messages();
        if msgs_size as f64 >= budgets.msgs_pressure_point() {
            let mut vars = HashMap::new();
            vars.insert("messagesSize", msgs_size.to_string());
            match self.instructions.render("pressure:messages", &vars) {
                Ok(text) => warnings.push(Message::text(Role::System, text)),
                Err(e) => tracing::warn!(error = %e, "dropping messages pressure warning"),
            }
        }

        warnings
    }

    /// Ensure `Messages[0]` is a freshly rendered `primer:assistant`
    /// system message carrying the current time and working context,
    /// overwriting the previous primer if present, otherwise
    /// prepending. Then append `msg`.
    ///
    /// If the primer fails to render, the failure is logged and the
    /// previous primer (if any) is left in place; `msg` is still
    /// appended so the turn is not stuck.
    pub fn append_message(&self, ctx: &mut MemoryContext, msg: Message) {
        let mut vars = HashMap::new();
        vars.insert("time", chrono::Utc::now().to_rfc3339());
        vars.insert("workingContext", ctx.working_context().to_string());

        match self.instructions.render("primer:assistant", &vars) {
            Ok(text) => {
                let primer = Message::text(Role::System, text);
                let is_primer = |m: &Message| m.role == Role::System;
                if ctx.messages().first().is_some_and(is_primer) {
                    ctx.messages_mut()[0] = primer;
                } else {
                    ctx.messages_mut().insert(0, primer);
                }
            }
            Err(e) => tracing::warn!(error = %e, "dropping primer refresh"),
        }

        ctx.messages_mut().push(msg);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mnemo_context::{Budgets, WhitespaceTokenizer};
    use mnemo_storage::MemoryStorage;
    use std::sync::Arc;

    fn ctx() -> MemoryContext {
        MemoryContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(WhitespaceTokenizer),
            Budgets::default(),
        )
    }

    #[test]
    fn append_message_installs_primer_at_head() {
        let monitor = PressureMonitor::new(Instructions::default());
        let mut c = ctx();
        monitor.append_message(&mut c, Message::text(Role::Human, "hello"));
        assert_eq!(c.messages().len(), 2);
        assert_eq!(c.messages()[0].role, Role::System);
        assert_eq!(c.messages()[1].role, Role::Human);
    }

    #[test]
    fn append_message_overwrites_existing_primer_not_prepend() {
        let monitor = PressureMonitor::new(Instructions::default());
        let mut c = ctx();
        monitor.append_message(&mut c, Message::text(Role::Human, "first"));
        monitor.append_message(&mut c, Message::text(Role::Human, "second"));
        assert_eq!(c.messages().len(), 3);
        assert_eq!(c.messages()[0].role, Role::System);
        assert_eq!(c.messages()[1].role, Role::Human);
        assert_eq!(c.messages()[2].role, Role::Human);
    }

    #[test]
    fn inspect_fires_messages_warning_at_threshold() {
        let monitor = PressureMonitor::new(Instructions::default());
        let budgets = mnemo_context::Budgets::try_new(100, 0.7, 0.3, 0.9).unwrap();
        let mut c = MemoryContext::new(
            Arc::new(MemoryStorage::new()),
            Arc::new(WhitespaceTokenizer),
            budgets,
        );
        // msgs_budget = 70, pressure point = 63 tokens.
        for i in 0..20 {
            c.messages_mut()
                .push(Message::text(Role::Human, format!("word{i} word{i}")));
        }
        let warnings = monitor.inspect(&c);
        assert!(warnings.iter().any(|w| w.text_content().contains("message history")));
    }

    #[test]
    fn inspect_is_silent_under_budget() {
        let monitor = PressureMonitor::new(Instructions::default());
        let c = ctx();
        assert!(monitor.inspect(&c).is_empty());
    }
}
