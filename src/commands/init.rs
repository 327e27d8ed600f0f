use anyhow::Result;
use std::path::PathBuf;

pub fn init_config(force: bool) -> Result<()> {
    let config_path = PathBuf::from(".declump.toml");

    if config_path.exists() && !force {
        anyhow::bail!("Configuration file already exists. Use --force to overwrite.");
    }

    let default_config = r#"# Declump Configuration

[detection]
min_fields_count = 3
min_parameters_count = 3
include_methods_in_same_class = true
check_fields_hierarchy = false
check_parameters_hierarchy = false

[output]
default_format = "terminal"
"#;

    std::fs::write(&config_path, default_config)?;
    println!("Created .declump.toml configuration file");

    Ok(())
}
