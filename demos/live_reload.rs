// SPDX-License-Identifier: MIT OR Apache-2.0

//! Live configuration reload example.
//!
//! This example demonstrates:
//! - Modules registering their own configuration sections with defaults
//! - Loading a YAML file into every registered section at once
//! - Modules reacting to changes of their own section only
//! - Reloading automatically when the file changes
//!
//! To run this example:
//! ```bash
//! cargo run --example live_reload --features yaml,reload
//! ```
//!
//! The example rewrites its own configuration file after a few seconds; you
//! can also edit the printed file by hand while it runs.

#[cfg(all(feature = "reload", feature = "yaml"))]
use modcfg::prelude::*;
#[cfg(all(feature = "reload", feature = "yaml"))]
use serde::{Deserialize, Serialize};
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::sync::Arc;
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::thread;
#[cfg(all(feature = "reload", feature = "yaml"))]
use std::time::Duration;

/// Configuration owned by the database module.
#[cfg(all(feature = "reload", feature = "yaml"))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Database {
    host: String,
    port: u16,
    max_connections: u32,
    #[serde(skip)]
    generation: u32,
}

#[cfg(all(feature = "reload", feature = "yaml"))]
impl Updatable for Database {
    fn changed(&mut self) {
        self.generation += 1;
        println!(
            "  [database] generation {}: {}:{} with {} connections",
            self.generation, self.host, self.port, self.max_connections
        );
    }

    fn absorb(&mut self, loaded: Self) {
        let generation = self.generation;
        *self = loaded;
        self.generation = generation;
    }
}

/// Configuration owned by the HTTP module.
#[cfg(all(feature = "reload", feature = "yaml"))]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Http {
    listen: String,
    workers: u16,
    logging: bool,
}

/// The HTTP module itself, told whenever its section changes.
#[cfg(all(feature = "reload", feature = "yaml"))]
struct HttpServer;

#[cfg(all(feature = "reload", feature = "yaml"))]
impl Reconfigurable<Http> for HttpServer {
    fn reconfigure(&self, config: &Http) {
        println!(
            "  [http] listening on {} with {} workers (logging: {})",
            config.listen, config.workers, config.logging
        );
    }
}

#[cfg(all(feature = "reload", feature = "yaml"))]
fn main() -> Result<()> {
    // Initialize tracing for logging
    tracing_subscriber::fmt::init();

    println!("=== modcfg: Live Reload Example ===\n");

    let initial = r#"
database:
  host: db.internal
  max_connections: 10

http:
  workers: 4
"#;

    let temp_file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
    std::fs::write(temp_file.path(), initial)?;
    println!("Created config file at: {:?}", temp_file.path());

    // Each module registers its own defaults
    let registry = Arc::new(Registry::new(YamlLoader::new(temp_file.path())));
    let database = registry.register_updatable_defaults(
        "database",
        Database {
            host: "localhost".to_string(),
            port: 5432,
            max_connections: 1,
            generation: 0,
        },
    )?;
    registry.register_defaults(
        "http",
        Http {
            listen: "0.0.0.0:8080".to_string(),
            workers: 1,
            logging: true,
        },
    )?;
    registry.reconfigure::<Http, _>("http", Arc::new(HttpServer))?;

    println!("\n=== Initial Load ===");
    registry.load()?;

    let mut watcher = FileWatcher::new(temp_file.path(), Some(Duration::from_millis(500)))?;
    registry.reload_on(&mut watcher)?;

    println!("\n=== Watching for changes ===");
    println!("Only the database section changes below, so only the database module is told.");
    thread::sleep(Duration::from_secs(2));

    let updated = r#"
database:
  host: db.internal
  max_connections: 50

http:
  workers: 4
"#;
    std::fs::write(temp_file.path(), updated)?;

    // Simulate application runtime
    // In a real application, this would be your main application logic
    for _ in 0..5 {
        thread::sleep(Duration::from_secs(1));
        let db = database.read();
        println!(
            "  [app] database generation {} uses {} connections",
            db.generation, db.max_connections
        );
    }

    println!("\n=== Stopping Watcher ===");
    watcher.stop()?;

    println!("Example complete.");
    Ok(())
}

#[cfg(not(all(feature = "reload", feature = "yaml")))]
fn main() {
    eprintln!("Error: This example requires the 'reload' and 'yaml' features.");
    eprintln!("Run with: cargo run --example live_reload --features yaml,reload");
    std::process::exit(1);
}
