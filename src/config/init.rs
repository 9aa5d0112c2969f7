use anyhow::{bail, Context, Result};
use std::io::{BufRead, Write};
use std::path::PathBuf;

use crate::config::{get_config_path, save_config, Config};
use crate::scoring::{validate_weights, NormalizationConfig, WeightsConfig, DEFAULT_INTENSITY_CEILING};
use crate::storage::{StorageBackend, StorageConfig};

/// Prompt user with a message and return their trimmed input.
fn prompt(message: &str) -> Result<String> {
    print!("{}", message);
    std::io::stdout()
        .flush()
        .context("Failed to flush stdout")?;
    let mut input = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut input)
        .context("Failed to read input")?;
    Ok(input.trim().to_string())
}

/// Prompt user with a message and a default value. Returns default if input is empty.
fn prompt_with_default(message: &str, default: &str) -> Result<String> {
    let input = prompt(&format!("{} [{}]: ", message, default))?;
    if input.is_empty() {
        Ok(default.to_string())
    } else {
        Ok(input)
    }
}

/// Prompt user with a yes/no question. Returns bool based on input and default.
fn prompt_yes_no(message: &str, default_yes: bool) -> Result<bool> {
    let hint = if default_yes { "Y/n" } else { "y/N" };
    let input = prompt(&format!("{} [{}]: ", message, hint))?;
    let input = input.to_lowercase();
    if input.is_empty() {
        Ok(default_yes)
    } else {
        Ok(input == "y" || input == "yes")
    }
}

/// Print text with a typewriter effect, one character at a time.
fn typewriter(text: &str) {
    use std::thread;
    use std::time::Duration;
    for c in text.chars() {
        print!("{}", c);
        std::io::stdout().flush().ok();
        thread::sleep(Duration::from_millis(18));
    }
    println!();
}

/// Parse a percentage between 0 and 100.
fn parse_percent(input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .trim_end_matches('%')
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", input))?;
    if !(0.0..=100.0).contains(&value) {
        bail!("must be between 0 and 100");
    }
    Ok(value)
}

fn parse_ceiling(input: &str) -> Result<f64> {
    let value: f64 = input
        .trim()
        .parse()
        .with_context(|| format!("'{}' is not a number", input))?;
    if !value.is_finite() || value <= 0.0 {
        bail!("must be a positive number");
    }
    Ok(value)
}

fn parse_backend(input: &str) -> Result<StorageBackend> {
    match input.trim().to_lowercase().as_str() {
        "local" => Ok(StorageBackend::Local),
        "cache" => Ok(StorageBackend::Cache),
        "memory" => Ok(StorageBackend::Memory),
        other => bail!("unknown backend '{}' (expected local, cache or memory)", other),
    }
}

/// Ask for each weight until the six add up to 100.
fn prompt_weights() -> Result<WeightsConfig> {
    let defaults = WeightsConfig::default();
    loop {
        let mut values = [0.0; 6];
        for (slot, (name, default)) in values.iter_mut().zip(defaults.entries()) {
            *slot = loop {
                let input = prompt_with_default(&format!("  {} weight (%)", name), &default.to_string())?;
                match parse_percent(&input) {
                    Ok(v) => break v,
                    Err(e) => println!("  Invalid: {}. Try again.", e),
                }
            };
        }

        let [esg, scope1, scope2, scope3, certs, policy] = values;
        let weights = WeightsConfig {
            esg: Some(esg),
            scope1: Some(scope1),
            scope2: Some(scope2),
            scope3: Some(scope3),
            certs: Some(certs),
            policy: Some(policy),
        };

        match validate_weights(&weights) {
            Ok(()) => return Ok(weights),
            Err(errors) => {
                for error in errors {
                    println!("  {}", error);
                }
                println!("  Let's try again.");
                println!();
            }
        }
    }
}

/// Run the interactive init wizard to create a config file.
///
/// If `default_path` is Some, uses that as the config file path.
/// Otherwise, prompts the user with the default config path.
pub fn run_init_wizard(default_path: Option<PathBuf>) -> Result<()> {
    println!();
    typewriter("Supplier Rank Configuration Wizard");
    println!("==================================");
    println!();

    // 1. Weights
    typewriter("Each supplier's score is a weighted sum of six factors: ESG rating, scope 1, 2 and 3 emission intensity, certifications and decarbonization policy.");
    typewriter("Weights are percentages and must add up to 100.");
    let configure_weights = prompt_yes_no("Configure weights? (n accepts 30/20/15/15/10/10)", false)?;
    let weights = if configure_weights {
        println!();
        Some(prompt_weights()?)
    } else {
        None
    };

    // 2. Normalization
    println!();
    typewriter("Emission intensity is tCO2e per $M of revenue. A supplier at or above the ceiling gets no credit for that scope.");
    let ceiling = loop {
        let input = prompt_with_default("Intensity ceiling", &DEFAULT_INTENSITY_CEILING.to_string())?;
        match parse_ceiling(&input) {
            Ok(v) => break v,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };
    let normalization = if ceiling == DEFAULT_INTENSITY_CEILING {
        None
    } else {
        Some(NormalizationConfig {
            intensity_ceiling: Some(ceiling),
        })
    };

    // 3. Storage
    println!();
    typewriter("Uploaded files and processed batches are kept in a storage backend:");
    typewriter("  local   -- plain files in a data directory");
    typewriter("  cache   -- content-addressed cache directory");
    typewriter("  memory  -- nothing is kept after the command exits");
    let backend = loop {
        let input = prompt_with_default("Storage backend", "local")?;
        match parse_backend(&input) {
            Ok(b) => break b,
            Err(e) => println!("  Invalid: {}. Try again.", e),
        }
    };
    let path = if backend == StorageBackend::Memory {
        None
    } else {
        let default_root = StorageConfig {
            backend: Some(backend),
            path: None,
        }
        .root();
        let input = prompt_with_default("Storage directory", &default_root.display().to_string())?;
        (PathBuf::from(&input) != default_root).then_some(input)
    };
    let storage = StorageConfig {
        backend: Some(backend),
        path,
    };

    // 4. Config path
    let default_config_path = default_path.unwrap_or_else(get_config_path);
    println!();
    let path_str = prompt_with_default(
        "Where should the config be saved?",
        &default_config_path.display().to_string(),
    )?;
    let config_path = PathBuf::from(&path_str);

    // Check if file already exists
    if config_path.exists() {
        let overwrite = prompt_yes_no(
            &format!(
                "Config already exists at {}. Overwrite?",
                config_path.display()
            ),
            false,
        )?;
        if !overwrite {
            println!("Aborted.");
            return Ok(());
        }
    }

    // 5. Write config
    let config = Config {
        weights,
        normalization,
        storage: Some(storage),
    };
    save_config(&config, &config_path)?;

    println!();
    println!("Config written to {}", config_path.display());
    println!("Run `supplier-rank ingest <file.csv>` to get started.");

    Ok(())
}
