//! The three instruction templates and a minimal `{{var}}`
//! substitution renderer. Any template language with variable
//! substitution satisfies the contract; this hand-rolled one keeps
//! the core dependency-free.

use std::collections::HashMap;

use mnemo_core::MemoryError;

/// Read-only mapping from instruction key to template string.
#[derive(Debug, Clone)]
pub struct Instructions {
    templates: HashMap<String, String>,
}

impl Instructions {
    /// Build a custom instruction set. Callers that only need to
    /// override one template should start from [`Instructions::default`]
    /// and call [`Instructions::with_template`].
    pub fn new(templates: HashMap<String, String>) -> Self {
        Self { templates }
    }

    /// Override or add a template.
    pub fn with_template(mut self, key: impl Into<String>, template: impl Into<String>) -> Self {
        self.templates.insert(key.into(), template.into());
        self
    }

    /// Render `key` against `vars`. Fails if the key is unregistered
    /// or the template references a variable not present in `vars`.
    pub fn render(&self, key: &str, vars: &HashMap<&str, String>) -> Result<String, MemoryError> {
        let template = self
            .templates
            .get(key)
            .ok_or_else(|| MemoryError::Template(format!("no template registered for {key}")))?;
        render_template(template, vars)
            .map_err(|missing| MemoryError::Template(format!("unresolved variable {{{{{missing}}}}} in {key}")))
    }
}

impl Default for Instructions {
    fn default() -> Self {
        let mut templates = HashMap::new();
        templates.insert(
            "primer:assistant".to_string(),
            "The current time is {{time}}. Your working context (a compressed summary of \
             what you've evicted plus salient facts) is:\n{{workingContext}}"
                .to_string(),
        );
        templates.insert(
            "pressure:workingContext".to_string(),
            "[system] Your working context is at {{workingContextSize}} tokens and is \
             approaching its budget. Call Reflect to rewrite it more compactly."
                .to_string(),
        );
        templates.insert(
            "pressure:messages".to_string(),
            "[system] Your message history is at {{messagesSize}} tokens and is \
             approaching its budget. Call Memorize to archive older messages."
                .to_string(),
        );
        Self { templates }
    }
}

/// Replace every `{{key}}` occurrence with `vars[key]`. Returns the
/// name of the first unresolved variable on failure.
fn render_template(template: &str, vars: &HashMap<&str, String>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            rest = "";
            break;
        };
        let key = after[..end].trim();
        match vars.get(key) {
            Some(value) => out.push_str(value),
            None => return Err(key.to_string()),
        }
        rest = &after[end + 2..];
    }
    out.push_str(rest);
    Ok(out)
}
