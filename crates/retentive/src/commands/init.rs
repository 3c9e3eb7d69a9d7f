use retentive_core::MemoryConfig;

pub fn run(force: bool) -> anyhow::Result<()> {
    let path = super::config_path();
    if path.exists() && !force {
        anyhow::bail!(
            "{} already exists; pass --force to overwrite",
            path.display()
        );
    }
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let config = MemoryConfig::default();
    let json = serde_json::to_string_pretty(&config)?;
    std::fs::write(&path, json)?;

    println!("wrote default configuration to {}", path.display());
    Ok(())
}
