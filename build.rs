use std::env;
use std::fs;
use std::path::Path;

/// Keys the crate reads through `option_env!` (see `src/config.rs`).
const CONFIG_KEYS: &[&str] = &[
    "API_BASE_URL",
    "CHECKOUT_BASE_URL",
    "ENVIRONMENT",
    "ENABLE_LOGGING",
    "NETWORK_TIMEOUT_SECONDS",
    "IDLE_TIMEOUT_MINUTES",
    "CLOCK_SKEW_SECONDS",
    "CRYPTO_POLL_INTERVAL_SECONDS",
    "REDIRECT_DELAY_MS",
];

fn main() {
    // Load KEY=VALUE pairs from .env when the file exists
    let env_file = Path::new(".env");

    if env_file.exists() {
        println!("cargo:rerun-if-changed=.env");

        if let Ok(contents) = fs::read_to_string(env_file) {
            for line in contents.lines() {
                let line = line.trim();
                if line.is_empty() || line.starts_with('#') {
                    continue;
                }

                if let Some((key, value)) = line.split_once('=') {
                    let key = key.trim();
                    let value = value.trim().trim_matches('"');

                    if !CONFIG_KEYS.contains(&key) {
                        println!("cargo:warning=Ignoring unknown .env key {}", key);
                        continue;
                    }

                    // Variables already set in the build environment win over .env
                    if env::var(key).is_err() {
                        println!("cargo:rustc-env={}={}", key, value);
                    }
                }
            }
        }
    } else {
        println!("cargo:warning=No .env file found. Using default values. Copy .env.example to .env to point the app at a backend.");
    }

    for key in CONFIG_KEYS {
        println!("cargo:rerun-if-env-changed={}", key);
    }
    println!("cargo:rerun-if-changed=build.rs");
    println!("cargo:rerun-if-changed=.env.example");
}
