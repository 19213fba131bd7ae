//! The `quizlingo init` command.

use anyhow::Result;

pub fn execute() -> Result<()> {
    if std::path::Path::new("quizlingo.toml").exists() {
        println!("quizlingo.toml already exists, skipping.");
    } else {
        std::fs::write("quizlingo.toml", SAMPLE_CONFIG)?;
        println!("Created quizlingo.toml");
    }

    std::fs::create_dir_all("drafts")?;
    let example_path = std::path::Path::new("drafts/kitchen.toml");
    if example_path.exists() {
        println!("drafts/kitchen.toml already exists, skipping.");
    } else {
        std::fs::write(example_path, EXAMPLE_DRAFT)?;
        println!("Created drafts/kitchen.toml");
    }

    println!("\nNext steps:");
    println!("  1. Run: quizlingo validate --quiz drafts/kitchen.toml");
    println!("  2. Run: quizlingo publish --quiz drafts/kitchen.toml");
    println!("  3. Run: quizlingo take --id 0");

    Ok(())
}

const SAMPLE_CONFIG: &str = r#"# quizlingo configuration

date_format = "%d.%m.%Y"
max_retries = 3
retry_delay_ms = 500

[backend]
type = "local"
data_dir = "./quizlingo-data"
username = "guest"

# To use a quiz server instead:
# [backend]
# type = "http"
# base_url = "https://127.0.0.1:8000"
# access_token = "${QUIZLINGO_ACCESS_TOKEN}"
"#;

const EXAMPLE_DRAFT: &str = r#"[quiz]
title = "Which kitchen utensil are you?"
results = ["Spoon", "Fork", "Knife"]

[[questions]]
text = "Pick a dinner"
answers = ["Soup", "Pasta", "Steak"]

[[questions]]
text = "Pick a hobby"
answers = ["Stirring things up", "Getting to the point", "Cutting to the chase"]

[[questions]]
text = "Pick a weekend"
answers = ["Cozy at home", "Out with friends", "Fixing the shed"]
"#;
