// i18n-middleware - Task Runner
// Unified developer commands using the cargo xtask pattern

use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use serde_json::Value;
use xshell::{Shell, cmd};

fn main() -> Result<()> {
    let sh = Shell::new()?;
    let args: Vec<_> = std::env::args().skip(1).collect();

    match args.first().map(|s| s.as_str()) {
        Some("test") => test(&sh),
        Some("format") => {
            let check = args.contains(&"--check".to_string());
            format(&sh, check)
        },
        Some("clippy") => clippy(&sh),
        Some("run") => run(&sh, &args[1..]),
        Some("locales") => {
            let dir = match args.get(1) {
                Some(dir) => PathBuf::from(dir),
                None => project_root().join("i18n-middleware/locales"),
            };
            locales(&dir)
        },
        Some("ci") => ci(&sh),
        _ => {
            print_help();
            Ok(())
        },
    }
}

fn print_help() {
    println!("i18n-middleware - Developer Commands:");
    println!();
    println!("Usage: cargo xtask <COMMAND> [OPTIONS]");
    println!();
    println!("Commands:");
    println!("  test                Run all tests");
    println!("  format [--check]    Format code (check mode doesn't modify)");
    println!("  clippy              Run clippy checks");
    println!("  run [ARGS...]       Run the demo server");
    println!("  locales [DIR]       Check that every locale file is a JSON object");
    println!("  ci                  Run all CI checks (format + clippy + locales + test)");
    println!();
    println!("Examples:");
    println!("  cargo xtask test");
    println!("  cargo xtask format --check");
    println!("  cargo xtask locales i18n-middleware/locales");
}

/// Run all tests
fn test(sh: &Shell) -> Result<()> {
    println!("🧪 Running tests...");
    println!();

    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo test --workspace").run().context("Tests failed")?;

    println!();
    println!("✅ All tests passed!");

    Ok(())
}

/// Format code
fn format(sh: &Shell, check: bool) -> Result<()> {
    println!("🎨 Formatting Rust code...");
    let _dir = sh.push_dir(project_root());

    if check {
        cmd!(sh, "cargo fmt --all -- --check").run().context("Rust code is not formatted")?;
        println!("✅ Rust code is properly formatted");
    } else {
        cmd!(sh, "cargo fmt --all").run().context("Failed to format Rust code")?;
        println!("✅ Rust code formatted");
    }

    Ok(())
}

/// Run clippy checks
fn clippy(sh: &Shell) -> Result<()> {
    let _dir = sh.push_dir(project_root());

    cmd!(sh, "cargo clippy --workspace --all-targets -- --deny warnings --allow clippy::uninlined-format-args")
        .run()
        .context("Clippy checks failed")?;

    Ok(())
}

/// Run the demo server from the crate directory so conf/ and locales/ resolve
fn run(sh: &Shell, args: &[String]) -> Result<()> {
    println!("🚀 Starting i18n-middleware demo...");
    println!();

    let _dir = sh.push_dir(project_root().join("i18n-middleware"));

    let mut cmd = cmd!(sh, "cargo run --bin i18n-middleware --");
    for arg in args {
        cmd = cmd.arg(arg);
    }

    cmd.run().context("Failed to run application")?;

    Ok(())
}

/// Validate locale files
///
/// The middleware silently falls back to empty data for broken files, so
/// this is the place where they get caught.
fn locales(dir: &Path) -> Result<()> {
    println!("🌐 Checking locale files in {}...", dir.display());

    let mut entries: Vec<PathBuf> = std::fs::read_dir(dir)
        .with_context(|| format!("Failed to read {}", dir.display()))?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file())
        .collect();
    entries.sort();

    let mut failures = 0;
    for path in &entries {
        match check_locale_file(path) {
            Ok(keys) => println!("   ✅ {} ({} top-level keys)", path.display(), keys),
            Err(e) => {
                failures += 1;
                println!("   ❌ {}: {:#}", path.display(), e);
            },
        }
    }

    if entries.is_empty() {
        bail!("No locale files found in {}", dir.display());
    }
    if failures > 0 {
        bail!("{} of {} locale files are invalid", failures, entries.len());
    }

    println!("✅ All {} locale files are valid", entries.len());
    Ok(())
}

fn check_locale_file(path: &Path) -> Result<usize> {
    let content = std::fs::read_to_string(path).context("unreadable")?;
    match serde_json::from_str::<Value>(&content).context("not valid JSON")? {
        Value::Object(map) => Ok(map.len()),
        _ => bail!("top level is not a JSON object"),
    }
}

/// Run all CI checks
fn ci(sh: &Shell) -> Result<()> {
    println!("🔄 Running CI checks...");
    println!();

    println!("📋 [1/4] Checking code format...");
    format(sh, true)?;
    println!();

    println!("📋 [2/4] Running clippy...");
    clippy(sh)?;
    println!();

    println!("📋 [3/4] Checking locale files...");
    locales(&project_root().join("i18n-middleware/locales"))?;
    println!();

    println!("📋 [4/4] Running tests...");
    test(sh)?;
    println!();

    println!("✅ All CI checks passed!");
    Ok(())
}

/// Get project root directory
fn project_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}
