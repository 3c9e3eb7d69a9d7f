use retentive_analysis::CriticalityAnalyzer;
use retentive_core::Message;

/// Run the criticality analyzer over a JSON array of messages and print a
/// tiered report
pub fn run(file: &str) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let messages: Vec<Message> = serde_json::from_str(&text)?;

    let report = CriticalityAnalyzer::default().analyze(&messages);
    println!(
        "{} tool calls analyzed across {} messages",
        report.total_analyzed,
        messages.len()
    );

    if !report.essential.is_empty() {
        println!("\nESSENTIAL ({})", report.essential.len());
        for call in &report.essential {
            println!(
                "  [{}] {} -> {} ({}, {:.2})",
                call.message_index,
                call.name,
                call.path.as_deref().unwrap_or("-"),
                call.classification.reason,
                call.classification.confidence
            );
        }
    }
    if !report.important.is_empty() {
        println!("\nIMPORTANT ({})", report.important.len());
        for call in &report.important {
            if let Some(summary) = call.summary.as_deref() {
                println!("  [{}] {}", call.message_index, summary);
            }
        }
    }
    if !report.routine.is_empty() {
        println!("\nROUTINE ({})", report.routine.len());
        for call in &report.routine {
            println!(
                "  [{}] {} -> {}",
                call.message_index,
                call.name,
                call.path.as_deref().unwrap_or("-")
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use retentive_core::ToolCallRecord;
    use tempfile::TempDir;

    #[test]
    fn test_analyze_command_reads_message_file() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("messages.json");
        let messages = vec![
            Message::assistant("writing").with_tool_calls(vec![ToolCallRecord::new("write")
                .path(".env")
                .content("SECRET=1")]),
            Message::human("thanks"),
        ];
        std::fs::write(&file, serde_json::to_string(&messages).unwrap()).unwrap();
        assert!(run(file.to_str().unwrap()).is_ok());
    }

    #[test]
    fn test_analyze_rejects_non_message_json() {
        let temp = TempDir::new().unwrap();
        let file = temp.path().join("bad.json");
        std::fs::write(&file, "{\"not\": \"messages\"}").unwrap();
        assert!(run(file.to_str().unwrap()).is_err());
    }
}
