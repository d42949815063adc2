//! Plain-text help rendering.
//!
//! Pure functions over the tree's read-only metadata; nothing here is invoked
//! by the executor. Applications call them from a `help` subcommand or on
//! error.

use std::fmt::Write;

use crate::flags::{FlagDefinition, FlagSchema};
use crate::tree::{CommandId, CommandTree};

const FLAG_COLUMN: usize = 30;

/// `Flags:` section, sorted by name, hidden flags omitted.
///
/// Returns an empty string when there is nothing to show.
pub fn render_flags(schema: &FlagSchema) -> String {
    render_flag_section("Flags:", schema.iter())
}

/// One-line usage, e.g. `Usage: app serve [required flags] [flags] [args...]`.
pub fn render_usage(command_path: &str, schema: Option<&FlagSchema>) -> String {
    let mut usage = format!("Usage: {}", command_path);
    let visible: Vec<&FlagDefinition> = schema
        .map(|s| s.iter().map(|(_, d)| d).filter(|d| !d.is_hidden()).collect())
        .unwrap_or_default();

    if visible.iter().any(|d| d.is_required()) {
        usage.push_str(" [required flags]");
    }
    if visible.iter().any(|d| !d.is_required()) {
        usage.push_str(" [flags]");
    }
    usage.push_str(" [args...]");
    usage
}

/// Full help page for one command: description, usage, subcommands, own
/// flags and the persistent flags inherited from ancestors.
///
/// Returns `None` for an id that does not belong to `tree`.
pub fn render_command(tree: &CommandTree, id: CommandId) -> Option<String> {
    let command = tree.get(id)?;
    let path = tree.command_path(id);
    let mut out = String::new();

    if let Some(text) = command.get_long_about().or(command.get_about()) {
        out.push_str(text);
        out.push_str("\n\n");
    }

    out.push_str(&render_usage(&path, command.get_flags()));
    out.push('\n');
    let children = tree.children(id);
    if !children.is_empty() {
        let _ = writeln!(out, "  {} <command>", path);
    }

    if !children.is_empty() {
        out.push_str("\nAvailable Commands:\n");
        for child in children.iter().filter_map(|c| tree.get(*c)) {
            let mut line = format!("  {:<16}{}", child.get_name(), child.get_about().unwrap_or(""));
            if !child.get_aliases().is_empty() {
                let _ = write!(line, " (aliases: {})", child.get_aliases().join(", "));
            }
            out.push_str(line.trim_end());
            out.push('\n');
        }
    }

    if let Some(schema) = command.get_flags() {
        let flags = render_flags(schema);
        if !flags.is_empty() {
            out.push('\n');
            out.push_str(&flags);
        }
    }

    let global = render_flag_section("Global Flags:", tree.inherited_flags(id).into_iter());
    if !global.is_empty() {
        out.push('\n');
        out.push_str(&global);
    }

    Some(out)
}

fn render_flag_section<'a>(
    title: &str,
    flags: impl Iterator<Item = (&'a str, &'a FlagDefinition)>,
) -> String {
    let mut visible: Vec<(&str, &FlagDefinition)> =
        flags.filter(|(_, def)| !def.is_hidden()).collect();
    if visible.is_empty() {
        return String::new();
    }
    visible.sort_by(|a, b| a.0.cmp(b.0));

    let mut out = format!("{}\n", title);
    for (name, def) in visible {
        out.push_str(&render_flag_line(name, def));
        out.push('\n');
    }
    out
}

fn render_flag_line(name: &str, def: &FlagDefinition) -> String {
    let mut head = String::new();
    if let Some(short) = def.short_alias() {
        let _ = write!(head, "-{}, ", short);
    }
    let _ = write!(head, "--{}", name);
    if def.flag_type() != crate::flags::FlagType::Bool {
        let _ = write!(head, " {}", def.flag_type());
    }

    let mut description = match def.deprecation() {
        Some(message) => format!("[DEPRECATED: {}] {}", message, def.description_text()),
        None => def.description_text().to_string(),
    };
    if def.is_required() {
        description.push_str(" (required)");
    } else if let Some(default) = def.default() {
        let _ = write!(description, " (default: {})", default);
    }

    let line = format!("  {:<width$} {}", head, description, width = FLAG_COLUMN);
    line.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::Command;

    fn schema() -> FlagSchema {
        FlagSchema::builder()
            .flag(
                "port",
                FlagDefinition::int()
                    .short('p')
                    .description("Port to listen on")
                    .default_value(8080),
            )
            .flag(
                "host",
                FlagDefinition::string()
                    .short('h')
                    .description("Host to bind to")
                    .required(),
            )
            .flag(
                "debug",
                FlagDefinition::bool()
                    .description("Enable debug mode")
                    .default_value(false),
            )
            .flag(
                "secret",
                FlagDefinition::string().description("Hidden flag").hidden(),
            )
            .flag(
                "legacy",
                FlagDefinition::string()
                    .description("Old flag")
                    .deprecated("use --host instead"),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_render_flags() {
        let help = render_flags(&schema());
        assert!(help.starts_with("Flags:\n"));
        assert!(help.contains("-p, --port int"));
        assert!(help.contains("Port to listen on (default: 8080)"));
        assert!(help.contains("Host to bind to (required)"));
        assert!(help.contains("[DEPRECATED: use --host instead] Old flag"));
        assert!(!help.contains("secret"));
        assert!(!help.contains("Hidden flag"));
    }

    #[test]
    fn test_render_flags_sorted_by_name() {
        let help = render_flags(&schema());
        let order: Vec<usize> = ["--debug", "--host", "--legacy", "--port"]
            .iter()
            .map(|n| help.find(n).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn test_render_flags_empty() {
        assert_eq!(render_flags(&FlagSchema::new()), "");
    }

    #[test]
    fn test_render_usage() {
        assert_eq!(
            render_usage("mycommand", Some(&schema())),
            "Usage: mycommand [required flags] [flags] [args...]"
        );
        assert_eq!(render_usage("cmd", None), "Usage: cmd [args...]");
    }

    #[test]
    fn test_render_command() {
        let root = Command::new("app")
            .about("Demo application")
            .flags(
                FlagSchema::builder()
                    .flag(
                        "verbose",
                        FlagDefinition::bool()
                            .short('v')
                            .description("Verbose output")
                            .persistent(),
                    )
                    .build()
                    .unwrap(),
            )
            .subcommand(
                Command::new("serve")
                    .about("Start the server")
                    .alias("s")
                    .flags(schema()),
            );
        let tree = CommandTree::new(root).unwrap();

        let page = render_command(&tree, tree.root()).unwrap();
        assert!(page.starts_with("Demo application\n\n"));
        assert!(page.contains("Available Commands:"));
        assert!(page.contains("Start the server (aliases: s)"));
        assert!(!page.contains("Global Flags:"));

        let (serve, _) = tree.resolve(&["serve"]);
        let page = render_command(&tree, serve).unwrap();
        assert!(page.contains("Usage: app serve [required flags] [flags] [args...]"));
        assert!(page.contains("Global Flags:\n  -v, --verbose"));
        assert!(!page.contains("Available Commands:"));
    }
}
