// catalog.rs — List the probe catalog without executing anything.

use sbcheck_verdict::{builtin_catalog, Expectation, Invocation, Probe};

pub fn execute(json: bool) -> anyhow::Result<()> {
    let catalog = builtin_catalog();

    if json {
        println!("{}", serde_json::to_string_pretty(&catalog)?);
        return Ok(());
    }

    for section in &catalog {
        println!("{}:", section.title);
        for probe in &section.probes {
            println!("  {} [{}]", probe.description, describe(probe));
        }
        println!();
    }
    Ok(())
}

/// Short shape + expectation tag for the text listing.
fn describe(probe: &Probe) -> String {
    let shape = match &probe.invocation {
        Invocation::Shell { .. } => "shell",
        Invocation::Argv { .. } => "direct",
        Invocation::Query { .. } => "query",
    };
    let expect = match &probe.expectation {
        Expectation::Allowed => "expect allowed".to_string(),
        Expectation::Denied => "expect denied".to_string(),
        Expectation::FileReadable => "expect readable".to_string(),
        Expectation::Decision { expected } => format!("expect {}", expected),
    };
    format!("{shape}, {expect}")
}
