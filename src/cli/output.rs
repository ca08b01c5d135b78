//! Handles all user-facing output for the CLI.
//!
//! This module is responsible for colorizing output and generating JSON. By
//! centralizing output logic here, every command renders entries the same way.

use std::io::{self, IsTerminal, Write};

use termcolor::{Color, ColorChoice, ColorSpec, StandardStream, WriteColor};

use crate::case::CaseDescriptor;
use crate::combinator::CombinedParameterSet;

/// Colors only when stdout is a terminal.
fn color_choice() -> ColorChoice {
    if io::stdout().is_terminal() {
        ColorChoice::Auto
    } else {
        ColorChoice::Never
    }
}

// ============================================================================
// CORE OUTPUT FUNCTIONS: User-facing CLI output utilities
// ============================================================================

/// Prints one line per combined entry: its id, then its marks.
pub fn print_ids(params: &CombinedParameterSet) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());
    for entry in params.entries() {
        write!(stdout, "{}", entry.id)?;
        if entry.is_marked() {
            stdout.set_color(ColorSpec::new().set_fg(Some(Color::Yellow)))?;
            let marks: Vec<String> = entry.marks.iter().map(ToString::to_string).collect();
            write!(stdout, " [{}]", marks.join(", "))?;
            stdout.reset()?;
        }
        writeln!(stdout)?;
    }
    Ok(())
}

/// JSON document describing a combined parameter set.
pub fn ids_json(provider: &str, params: &CombinedParameterSet) -> serde_json::Value {
    let entries: Vec<serde_json::Value> = params
        .entries()
        .iter()
        .map(|entry| {
            serde_json::json!({
                "id": entry.id,
                "marks": entry.marks.iter().map(ToString::to_string).collect::<Vec<_>>(),
                "value": entry.value.to_json(),
            })
        })
        .collect();
    serde_json::json!({
        "provider": provider,
        "axes": params.axes(),
        "entries": entries,
    })
}

/// Prints the cases discovered in one module under a colored header.
pub fn print_cases(module: &str, cases: &[CaseDescriptor]) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Cyan)).set_bold(true))?;
    writeln!(stdout, "{} ({} cases)", module, cases.len())?;
    stdout.reset()?;
    for case in cases {
        writeln!(stdout, "  {}", case.display())?;
    }
    Ok(())
}

pub fn print_success(message: &str) -> io::Result<()> {
    let mut stdout = StandardStream::stdout(color_choice());
    stdout.set_color(ColorSpec::new().set_fg(Some(Color::Green)).set_bold(true))?;
    write!(stdout, "ok")?;
    stdout.reset()?;
    writeln!(stdout, " {}", message)
}
