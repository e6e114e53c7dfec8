//! The interpolator
//!
//! Resolves reference tokens in arbitrary text against a variable
//! snapshot, a request context, and an optional scoped-variable overlay.
//! Interpolation is read-only: it never touches the store and never
//! triggers resolution.

use templar_domain::{ExecutionContext, ResolvedVariable, ScopedVars};

use super::builtins;
use super::format;
use super::parser::{VariableToken, parse_tokens};
use crate::engine::VariableSnapshot;

/// Token-substitution engine. Stateless; all inputs are passed per call.
pub struct Interpolator;

impl Interpolator {
    /// Substitutes every resolvable token in `text`.
    ///
    /// Unknown names are left verbatim.
    #[must_use]
    pub fn interpolate(text: &str, snapshot: &VariableSnapshot, ctx: &ExecutionContext) -> String {
        let scoped = ScopedVars::new();
        Self::interpolate_scoped(text, snapshot, ctx, &scoped)
    }

    /// Substitutes tokens with a request-local overlay taking precedence
    /// over the snapshot for this call only.
    #[must_use]
    pub fn interpolate_scoped(
        text: &str,
        snapshot: &VariableSnapshot,
        ctx: &ExecutionContext,
        scoped: &ScopedVars,
    ) -> String {
        let tokens = parse_tokens(text);
        if tokens.is_empty() {
            return text.to_string();
        }

        let mut out = String::with_capacity(text.len());
        let mut last_end = 0;
        for token in &tokens {
            out.push_str(&text[last_end..token.span.start]);
            match Self::resolve_token(token, snapshot, ctx, scoped) {
                Some(rendered) => out.push_str(&rendered),
                // Unresolvable reference: keep the original token.
                None => out.push_str(&text[token.span.clone()]),
            }
            last_end = token.span.end;
        }
        out.push_str(&text[last_end..]);
        out
    }

    fn resolve_token(
        token: &VariableToken,
        snapshot: &VariableSnapshot,
        ctx: &ExecutionContext,
        scoped: &ScopedVars,
    ) -> Option<String> {
        let spec = token.format.as_deref();

        if let Some(overlay) = scoped.get(&token.name) {
            return Some(format::render(
                spec,
                &token.name,
                &overlay.value.to_vec(),
                &overlay.text.to_vec(),
            ));
        }

        if let Some(var) = snapshot.get(&token.name) {
            return Self::render_variable(var, spec, &token.name);
        }

        if builtins::consumes_format(&token.name) {
            return builtins::resolve(&token.name, spec, ctx);
        }
        builtins::resolve(&token.name, None, ctx).map(|value| {
            let values = vec![value];
            format::render(spec, &token.name, &values, &values)
        })
    }

    fn render_variable(
        var: &ResolvedVariable,
        spec: Option<&str>,
        name: &str,
    ) -> Option<String> {
        let current = var.current.as_ref()?;

        if current.is_all() {
            // A custom all-value substitutes as a literal; the default
            // "All" expands to every real option value.
            if let Some(all_value) = &var.definition.all_value {
                let values = vec![all_value.clone()];
                return Some(format::render(spec, name, &values, &values));
            }
            let values = var.real_option_values();
            let texts: Vec<String> = var
                .options
                .iter()
                .filter(|o| !o.is_all())
                .map(|o| o.text.to_string())
                .collect();
            return Some(format::render(spec, name, &values, &texts));
        }

        Some(format::render(
            spec,
            name,
            &current.value.to_vec(),
            &current.text.to_vec(),
        ))
    }
}
