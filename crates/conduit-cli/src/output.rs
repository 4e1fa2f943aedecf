//! Output formatting for CLI responses.

use serde_json::Value;

use conduit_types::{ConduitError, DiagnosticError};

/// Prints pretty JSON to stdout.
pub fn print_json(value: &Value) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Prints a layer error as a classified diagnostic on stderr and
/// returns it for `main` to exit with.
pub fn report<E>(error: E, context: &str) -> anyhow::Error
where
    E: DiagnosticError + Into<ConduitError>,
{
    let hint = error.hint();
    let fix = error.fix();
    let error = error.into().with_context(context);
    eprint!("{}", render_diagnostic(&error, hint.as_deref(), fix.as_deref()));
    anyhow::Error::new(error)
}

/// Formats an error with its hint and fix, if any.
pub fn render_diagnostic(error: &ConduitError, hint: Option<&str>, fix: Option<&str>) -> String {
    let mut out = format!("[ERROR] {error}\n");
    if let Some(hint) = hint {
        out.push_str(&format!("  hint: {hint}\n"));
    }
    if let Some(fix) = fix {
        out.push_str(&format!("  fix:  {fix}\n"));
    }
    out
}
