use retentive_truncate::{truncate, ContentType};

pub fn run(file: &str, max_bytes: usize, content_type: Option<&str>) -> anyhow::Result<()> {
    let text = std::fs::read_to_string(file)?;
    let hint = match content_type {
        Some(name) => Some(parse_content_type(name)?),
        None => None,
    };

    let outcome = truncate(&text, max_bytes, hint)?;
    eprintln!(
        "{} -> {} bytes | method: {} | syntax valid: {}",
        outcome.original_size, outcome.final_size, outcome.method, outcome.syntax_valid
    );
    println!("{}", outcome.content);
    Ok(())
}

fn parse_content_type(name: &str) -> anyhow::Result<ContentType> {
    match name {
        "json" => Ok(ContentType::Json),
        "code" => Ok(ContentType::Code),
        "tree" => Ok(ContentType::Tree),
        "html" | "xml" => Ok(ContentType::Markup),
        "text" => Ok(ContentType::Text),
        other => anyhow::bail!("unknown content type: {other}"),
    }
}
