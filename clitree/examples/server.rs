//! Demo application: a small server CLI.
//!
//! ```text
//! cargo run --example server -- serve --port 9000 ./public
//! cargo run --example server -- s -p 100 ./public        # validation error
//! cargo run --example server -- config
//! cargo run --example server -- help serve
//! RUST_LOG=clitree=debug cargo run --example server -- status --json
//! ```

use std::time::Duration;

use clitree::args::{exact_args, maximum_n_args};
use clitree::config::{read_or, ChainProvider, EnvProvider, MapProvider};
use clitree::flags::{validators, FlagDefinition, FlagSchema};
use clitree::{help, Command, CommandTree};

fn serve() -> anyhow::Result<Command> {
    let flags = FlagSchema::builder()
        .flag(
            "port",
            FlagDefinition::int()
                .short('p')
                .description("Port to listen on")
                .default_value(8080)
                .validator(validators::range(1024, 65535)),
        )
        .flag(
            "host",
            FlagDefinition::string()
                .description("Interface to bind")
                .default_value("127.0.0.1"),
        )
        .flag(
            "timeout",
            FlagDefinition::duration()
                .description("Request timeout")
                .default_value(Duration::from_secs(30))
                .validator(validators::min_duration(Duration::from_millis(100))),
        )
        .flag(
            "workers",
            FlagDefinition::int()
                .short('w')
                .description("Worker threads")
                .default_value(4)
                .validator(validators::positive()),
        )
        .flag(
            "bind",
            FlagDefinition::string()
                .description("Interface to bind")
                .deprecated("use --host instead")
                .hidden(),
        )
        .build()?;

    Ok(Command::new("serve")
        .alias("s")
        .about("Serve a directory over HTTP")
        .flags(flags)
        .args(exact_args(1))
        .pre_run(|cmd, args| {
            if !std::path::Path::new(&args[0]).exists() {
                anyhow::bail!("directory {} does not exist", args[0]);
            }
            tracing::debug!(command = cmd.name(), "directory checked");
            Ok(())
        })
        .run(|cmd, args| {
            let flags = cmd.flags();
            println!(
                "serving {} on {}:{} ({} workers, timeout {})",
                args[0],
                flags.get_string("host")?,
                flags.get_int("port")?,
                flags.get_int("workers")?,
                clitree::flags::format_duration(flags.get_duration("timeout")?),
            );
            Ok(())
        })
        .post_run(|_, _| {
            println!("shutdown complete");
            Ok(())
        }))
}

fn status() -> anyhow::Result<Command> {
    let flags = FlagSchema::builder()
        .flag("json", FlagDefinition::bool().description("Print as JSON"))
        .build()?;

    Ok(Command::new("status")
        .about("Show the command tree")
        .flags(flags)
        .run(|cmd, _| {
            let tree = cmd.tree();
            let info = tree
                .describe(tree.root())
                .ok_or_else(|| anyhow::anyhow!("root missing"))?;
            if cmd.flags().get_bool("json")? {
                println!("{}", info.to_json()?);
            } else {
                for sub in &info.subcommands {
                    println!("{:<10} {}", sub.name, sub.about.as_deref().unwrap_or(""));
                }
            }
            Ok(())
        }))
}

fn main() {
    if let Err(err) = clitree::init_subscriber() {
        eprintln!("tracing already initialised: {}", err);
    }

    let defaults = MapProvider::new()
        .set("HOST", "localhost")
        .set("PORT", "8080");
    let config = ChainProvider::new()
        .with(EnvProvider::new().with_prefix("APP_"))
        .with(defaults);

    let root = match (serve(), status()) {
        (Ok(serve), Ok(status)) => Command::new("server")
            .about("Demo server CLI")
            .config(config)
            .subcommand(serve)
            .subcommand(status)
            .subcommand(
                Command::new("config")
                    .about("Show configuration values")
                    .run(|cmd, _| {
                        let cfg = cmd.config().ok_or_else(|| anyhow::anyhow!("no config"))?;
                        let host: String = read_or(cfg, "HOST", "localhost".to_string())?;
                        let port: u16 = read_or(cfg, "PORT", 8080)?;
                        let debug: bool = read_or(cfg, "DEBUG", false)?;
                        println!("Configuration:");
                        println!("  Host:  {}", host);
                        println!("  Port:  {}", port);
                        println!("  Debug: {}", debug);
                        Ok(())
                    }),
            )
            .subcommand(
                Command::new("help")
                    .about("Show help for a command")
                    .args(maximum_n_args(8))
                    .run(|cmd, args| {
                        let tree = cmd.tree();
                        let (id, _) = tree.resolve(args);
                        let page = help::render_command(tree, id)
                            .ok_or_else(|| anyhow::anyhow!("unknown command"))?;
                        print!("{}", page);
                        Ok(())
                    }),
            ),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("Error: {:#}", err);
            std::process::exit(101);
        }
    };

    let tree = match CommandTree::new(root) {
        Ok(tree) => tree,
        Err(err) => {
            eprintln!("Error: {}", err);
            std::process::exit(101);
        }
    };

    if let Err(err) = tree.execute_env() {
        eprintln!("Error: {}", err);
        std::process::exit(err.exit_code());
    }
}
