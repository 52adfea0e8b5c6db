//! CLI handler for the `rules` command.

use anyhow::Result;

use super::args::RulesCliArgs;
use crate::rules::RuleTable;

pub fn handle_rules_command(rules: &RuleTable, args: RulesCliArgs) -> Result<bool> {
    let classification = rules.classification();

    println!("Phrase rules:      {}", rules.phrases().len());
    println!("Name rules:        {}", rules.names().len());
    println!("Categories:        {}", rules.categories().len());
    for category in rules.categories() {
        println!("  {:<20} {}", category.name, category.pattern.as_str());
    }
    println!("Allow patterns:    {}", classification.allow.len());
    println!("Block patterns:    {}", classification.block.len());
    println!("Max tokens:        {}", classification.max_tokens);

    if !args.audit {
        return Ok(true);
    }

    let findings = rules.audit();
    if findings.is_empty() {
        println!("\nAudit: every rule output is stable under a second pass.");
        return Ok(true);
    }

    println!("\nAudit: {} rule output(s) are rewritten again:", findings.len());
    for finding in &findings {
        if finding.input == finding.output {
            println!(
                "  {}: {:?} -> {:?}",
                finding.source, finding.output, finding.rewritten
            );
        } else {
            println!(
                "  {}: {:?} -> {:?} -> {:?}",
                finding.source, finding.input, finding.output, finding.rewritten
            );
        }
    }
    Ok(false)
}
