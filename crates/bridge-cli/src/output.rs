//! Output formatting for CLI responses.

use std::fmt::Display;

use bridge_types::DiagnosticError;

/// Prints a success message.
pub fn print_success(message: &str) {
    println!("[OK] {message}");
}

/// Prints an error message.
pub fn print_error(message: &str) {
    eprintln!("[ERROR] {message}");
}

/// Prints an error followed by its cause and fix, when known.
pub fn print_diagnostic<E: DiagnosticError + Display>(error: &E) {
    print_error(&error.to_string());
    print_remedy(error);
}

/// Prints only the cause and fix lines of a diagnostic error.
pub fn print_remedy<E: DiagnosticError>(error: &E) {
    if let Some(hint) = error.hint() {
        eprintln!("\n  Cause: {hint}");
    }
    if let Some(fix) = error.fix() {
        eprintln!("  Fix:   {fix}\n");
    }
}
