//! Redact command - show exactly what would be sent.

use veil_ai::Redactor;

use super::read_input;

pub(crate) fn run(text: Option<&str>, report: bool) -> miette::Result<()> {
    let input = read_input(text)?;
    let (redacted, counts) = Redactor::new().redact_with_report(&input);

    print!("{}", redacted);
    if !redacted.ends_with('\n') {
        println!();
    }

    if report {
        let json = serde_json::to_string(&counts)
            .map_err(|e| miette::miette!("Failed to encode report: {}", e))?;
        eprintln!("{}", json);
    }

    Ok(())
}
