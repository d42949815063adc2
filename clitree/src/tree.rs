//! Command tree: arena storage, resolution and execution.
//!
//! Commands live in a flat arena addressed by [`CommandId`]. Parent links are
//! plain ids and child lists are owned id lists, so a command can only ever be
//! inserted once: insertion takes the `Command` by value.

use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

use crate::command::{Command, CommandContext};
use crate::config::ConfigProvider;
use crate::context::Context;
use crate::flags::{FlagSchema, FlagSet, FlagType, FlagValue};
use crate::lifecycle::Lifecycle;
use crate::CliResult;

/// Stable handle to a command inside one [`CommandTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CommandId(usize);

impl CommandId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Errors raised while building a tree
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("command id {0:?} does not belong to this tree")]
    UnknownCommand(CommandId),

    #[error("command '{parent}' already has a subcommand named '{name}'")]
    DuplicateName { parent: String, name: String },
}

struct Node {
    command: Command,
    parent: Option<CommandId>,
    children: Vec<CommandId>,
}

/// Owner of all commands of one application.
///
/// The tree is assembled before execution and only read afterwards;
/// per-invocation state (parsed flags, context) lives in [`CommandContext`].
pub struct CommandTree {
    nodes: Vec<Node>,
    empty_schema: FlagSchema,
}

impl CommandTree {
    /// Build a tree from a root command, taking over its nested subcommands.
    pub fn new(mut root: Command) -> Result<Self, TreeError> {
        let subcommands = std::mem::take(&mut root.subcommands);
        let mut tree = Self {
            nodes: vec![Node {
                command: root,
                parent: None,
                children: Vec::new(),
            }],
            empty_schema: FlagSchema::new(),
        };
        let root_id = tree.root();
        for sub in subcommands {
            tree.add(root_id, sub)?;
        }
        Ok(tree)
    }

    pub fn root(&self) -> CommandId {
        CommandId(0)
    }

    /// Attach `command` (and its nested subcommands) under `parent`.
    ///
    /// The whole subtree is checked before anything is inserted, so on error
    /// the tree is left unchanged.
    pub fn add(&mut self, parent: CommandId, command: Command) -> Result<CommandId, TreeError> {
        let parent_node = self
            .nodes
            .get(parent.0)
            .ok_or(TreeError::UnknownCommand(parent))?;
        let name = command.get_name();
        if parent_node
            .children
            .iter()
            .any(|c| self.nodes[c.0].command.get_name() == name)
        {
            return Err(TreeError::DuplicateName {
                parent: parent_node.command.get_name().to_string(),
                name: name.to_string(),
            });
        }
        check_siblings(&command)?;
        Ok(self.insert(parent, command))
    }

    fn insert(&mut self, parent: CommandId, mut command: Command) -> CommandId {
        let subcommands = std::mem::take(&mut command.subcommands);
        let id = CommandId(self.nodes.len());
        self.nodes.push(Node {
            command,
            parent: Some(parent),
            children: Vec::new(),
        });
        self.nodes[parent.0].children.push(id);

        for sub in subcommands {
            self.insert(id, sub);
        }
        id
    }

    pub fn get(&self, id: CommandId) -> Option<&Command> {
        self.nodes.get(id.0).map(|n| &n.command)
    }

    pub fn parent(&self, id: CommandId) -> Option<CommandId> {
        self.nodes.get(id.0).and_then(|n| n.parent)
    }

    pub fn children(&self, id: CommandId) -> &[CommandId] {
        self.nodes
            .get(id.0)
            .map(|n| n.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// First child (declaration order) whose name or alias equals `token`.
    pub fn find_child(&self, id: CommandId, token: &str) -> Option<CommandId> {
        self.children(id)
            .iter()
            .copied()
            .find(|c| self.nodes[c.0].command.matches(token))
    }

    /// Ids from the root down to `id`, inclusive.
    pub fn ancestry(&self, id: CommandId) -> Vec<CommandId> {
        let mut path = Vec::new();
        let mut current = self.nodes.get(id.0).map(|_| id);
        while let Some(c) = current {
            path.push(c);
            current = self.nodes[c.0].parent;
        }
        path.reverse();
        path
    }

    /// Space-joined names from the root, e.g. `toolbox remote add`.
    pub fn command_path(&self, id: CommandId) -> String {
        self.ancestry(id)
            .iter()
            .map(|c| self.nodes[c.0].command.get_name())
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Walk `args` down from the root, consuming tokens that name a child.
    ///
    /// Returns the deepest matched command and the unconsumed tail. Tokens
    /// that match nothing are left in place for flag parsing.
    pub fn resolve<'a, S: AsRef<str>>(&self, args: &'a [S]) -> (CommandId, &'a [S]) {
        self.resolve_from(self.root(), args)
    }

    pub fn resolve_from<'a, S: AsRef<str>>(
        &self,
        start: CommandId,
        args: &'a [S],
    ) -> (CommandId, &'a [S]) {
        let mut current = start;
        let mut rest = args;
        while let Some((first, tail)) = rest.split_first() {
            match self.find_child(current, first.as_ref()) {
                Some(child) => {
                    current = child;
                    rest = tail;
                }
                None => break,
            }
        }
        (current, rest)
    }

    /// Configuration provider of `id` or of its nearest ancestor that has one.
    pub fn config(&self, id: CommandId) -> Option<&dyn ConfigProvider> {
        let mut current = self.nodes.get(id.0).map(|_| id);
        while let Some(c) = current {
            let node = &self.nodes[c.0];
            if let Some(provider) = node.command.get_config() {
                return Some(provider.as_ref());
            }
            current = node.parent;
        }
        None
    }

    /// Persistent flags declared by ancestors of `id` (closest ancestor last).
    pub fn inherited_flags(&self, id: CommandId) -> Vec<(&str, &crate::flags::FlagDefinition)> {
        let mut ancestry = self.ancestry(id);
        ancestry.pop();
        ancestry
            .into_iter()
            .filter_map(|c| self.nodes[c.0].command.get_flags())
            .flat_map(|schema| schema.persistent())
            .collect()
    }

    // ------------------------------------------------------------------------
    // Execution
    // ------------------------------------------------------------------------

    /// Run the command selected by `argv` with a background context.
    ///
    /// `argv` is the full process argument vector; its first element (the
    /// program name) is skipped.
    pub fn execute<I, S>(&self, argv: I) -> CliResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.execute_with_context(Context::background(), argv)
    }

    /// Run with the arguments of the current process.
    pub fn execute_env(&self) -> CliResult<()> {
        self.execute(std::env::args())
    }

    pub fn execute_with_context<I, S>(&self, ctx: Context, argv: I) -> CliResult<()>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let argv: Vec<String> = argv.into_iter().map(Into::into).collect();
        let args = argv.get(1..).unwrap_or_default();

        let (target, residual) = self.resolve(args);
        let command = &self.nodes[target.0].command;
        tracing::debug!(
            command = %self.command_path(target),
            residual = residual.len(),
            "resolved command"
        );

        let flags = match command.get_flags() {
            Some(schema) => FlagSet::parse(schema, residual)?,
            None => FlagSet::positional(&self.empty_schema, residual),
        };
        let positional = flags.args().to_vec();

        if let Some(validator) = command.get_args_validator() {
            validator.validate(command, &positional)?;
        }

        let cmd_ctx = CommandContext::new(self, target, command, flags, &ctx);
        Lifecycle::for_command(command).run(&cmd_ctx, &positional)
    }

    // ------------------------------------------------------------------------
    // Metadata
    // ------------------------------------------------------------------------

    /// Serializable snapshot of `id` and its descendants.
    pub fn describe(&self, id: CommandId) -> Option<CommandInfo> {
        let command = self.get(id)?;
        Some(CommandInfo {
            name: command.get_name().to_string(),
            path: self.command_path(id),
            aliases: command.get_aliases().to_vec(),
            about: command.get_about().map(str::to_string),
            long_about: command.get_long_about().map(str::to_string),
            valid_args: command.get_valid_args().to_vec(),
            flags: command
                .get_flags()
                .map(|schema| schema.iter().map(|(n, d)| FlagInfo::new(n, d)).collect())
                .unwrap_or_default(),
            subcommands: self
                .children(id)
                .iter()
                .filter_map(|c| self.describe(*c))
                .collect(),
        })
    }
}

/// Reject a subtree in which two siblings share a name, at any depth.
fn check_siblings(command: &Command) -> Result<(), TreeError> {
    for (i, sub) in command.subcommands.iter().enumerate() {
        if command.subcommands[..i]
            .iter()
            .any(|s| s.get_name() == sub.get_name())
        {
            return Err(TreeError::DuplicateName {
                parent: command.get_name().to_string(),
                name: sub.get_name().to_string(),
            });
        }
        check_siblings(sub)?;
    }
    Ok(())
}

impl std::fmt::Debug for CommandTree {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list()
            .entries((0..self.nodes.len()).map(|i| self.command_path(CommandId(i))))
            .finish()
    }
}

/// Read-only metadata of one command, for help renderers and JSON output.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandInfo {
    pub name: String,
    pub path: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub about: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub long_about: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub valid_args: Vec<String>,
    pub flags: Vec<FlagInfo>,
    pub subcommands: Vec<CommandInfo>,
}

impl CommandInfo {
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlagInfo {
    pub name: String,
    #[serde(rename = "type")]
    pub flag_type: FlagType,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub short: Option<char>,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<FlagValue>,
    pub required: bool,
    pub hidden: bool,
    pub persistent: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub deprecated: Option<String>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub annotations: BTreeMap<String, String>,
}

impl FlagInfo {
    fn new(name: &str, def: &crate::flags::FlagDefinition) -> Self {
        Self {
            name: name.to_string(),
            flag_type: def.flag_type(),
            short: def.short_alias(),
            description: def.description_text().to_string(),
            default: def.default().cloned(),
            required: def.is_required(),
            hidden: def.is_hidden(),
            persistent: def.is_persistent(),
            deprecated: def.deprecation().map(str::to_string),
            annotations: def.annotations().clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapProvider;
    use crate::flags::FlagDefinition;

    fn toolbox() -> CommandTree {
        let root = Command::new("toolbox")
            .subcommand(Command::new("version").aliases(["v", "ver"]))
            .subcommand(
                Command::new("remote")
                    .subcommand(Command::new("add"))
                    .subcommand(Command::new("remove").alias("rm")),
            );
        CommandTree::new(root).unwrap()
    }

    fn name(tree: &CommandTree, id: CommandId) -> &str {
        tree.get(id).unwrap().get_name()
    }

    #[test]
    fn test_resolve_alias() {
        let tree = toolbox();
        let (id, rest) = tree.resolve(&["v"]);
        assert_eq!(name(&tree, id), "version");
        assert!(rest.is_empty());
    }

    #[test]
    fn test_resolve_unmatched_stays_at_root() {
        let tree = toolbox();
        let (id, rest) = tree.resolve(&["bogus"]);
        assert_eq!(id, tree.root());
        assert_eq!(rest, ["bogus"]);
    }

    #[test]
    fn test_resolve_empty_args() {
        let tree = toolbox();
        let (id, rest) = tree.resolve::<&str>(&[]);
        assert_eq!(id, tree.root());
        assert!(rest.is_empty());
    }

    #[test]
    fn test_resolve_nested_with_residual() {
        let tree = toolbox();
        let (id, rest) = tree.resolve(&["remote", "rm", "origin", "--force", "add"]);
        assert_eq!(tree.command_path(id), "toolbox remote remove");
        // "add" after a non-matching token is not a subcommand of remove
        assert_eq!(rest, ["origin", "--force", "add"]);
    }

    #[test]
    fn test_resolve_is_case_sensitive_and_exact() {
        let tree = toolbox();
        assert_eq!(tree.resolve(&["Version"]).0, tree.root());
        assert_eq!(tree.resolve(&["vers"]).0, tree.root());
    }

    #[test]
    fn test_first_match_wins_for_shared_alias() {
        let root = Command::new("app")
            .subcommand(Command::new("start").alias("s"))
            .subcommand(Command::new("stop").alias("s"));
        let tree = CommandTree::new(root).unwrap();
        let (id, _) = tree.resolve(&["s"]);
        assert_eq!(name(&tree, id), "start");
    }

    #[test]
    fn test_duplicate_sibling_name_rejected() {
        let root = Command::new("app")
            .subcommand(Command::new("start"))
            .subcommand(Command::new("start"));
        let err = CommandTree::new(root).err().unwrap();
        assert_eq!(
            err,
            TreeError::DuplicateName {
                parent: "app".into(),
                name: "start".into()
            }
        );
    }

    #[test]
    fn test_failed_add_leaves_tree_unchanged() {
        let mut tree = CommandTree::new(Command::new("app")).unwrap();
        let db = Command::new("db")
            .subcommand(Command::new("migrate"))
            .subcommand(
                Command::new("seed")
                    .subcommand(Command::new("x"))
                    .subcommand(Command::new("x")),
            );
        let err = tree.add(tree.root(), db).unwrap_err();
        assert_eq!(
            err,
            TreeError::DuplicateName {
                parent: "seed".into(),
                name: "x".into()
            }
        );
        assert_eq!(tree.len(), 1);
        assert!(tree.children(tree.root()).is_empty());
        assert_eq!(tree.resolve(&["db", "migrate"]).0, tree.root());

        // the same name can be added once the subtree is valid
        let db = Command::new("db").subcommand(Command::new("migrate"));
        let id = tree.add(tree.root(), db).unwrap();
        let (migrate, _) = tree.resolve(&["db", "migrate"]);
        assert_eq!(tree.command_path(migrate), "app db migrate");
        assert_eq!(tree.children(id).len(), 1);
    }

    #[test]
    fn test_add_under_foreign_id_rejected() {
        let mut tree = toolbox();
        let bogus = CommandId(99);
        assert_eq!(
            tree.add(bogus, Command::new("x")).unwrap_err(),
            TreeError::UnknownCommand(bogus)
        );
    }

    #[test]
    fn test_parent_links() {
        let mut tree = toolbox();
        let (remote, _) = tree.resolve(&["remote"]);
        let id = tree.add(remote, Command::new("rename")).unwrap();
        assert_eq!(tree.parent(id), Some(remote));
        assert_eq!(tree.parent(tree.root()), None);
        assert_eq!(tree.children(remote).len(), 3);
        assert_eq!(tree.len(), 6);
    }

    #[test]
    fn test_config_inherited_from_nearest_ancestor() {
        let root = Command::new("app")
            .config(MapProvider::new().set("HOST", "root"))
            .subcommand(
                Command::new("db")
                    .subcommand(Command::new("migrate"))
                    .subcommand(
                        Command::new("seed").config(MapProvider::new().set("HOST", "seed")),
                    ),
            );
        let tree = CommandTree::new(root).unwrap();

        let (migrate, _) = tree.resolve(&["db", "migrate"]);
        assert_eq!(tree.config(migrate).unwrap().read("HOST").unwrap(), "root");

        let (seed, _) = tree.resolve(&["db", "seed"]);
        assert_eq!(tree.config(seed).unwrap().read("HOST").unwrap(), "seed");
    }

    #[test]
    fn test_config_absent() {
        let tree = toolbox();
        assert!(tree.config(tree.root()).is_none());
    }

    #[test]
    fn test_inherited_persistent_flags() {
        let root = Command::new("app")
            .flags(
                FlagSchema::builder()
                    .flag("config", FlagDefinition::string().persistent())
                    .flag("local", FlagDefinition::bool())
                    .build()
                    .unwrap(),
            )
            .subcommand(Command::new("run"));
        let tree = CommandTree::new(root).unwrap();
        let (run, _) = tree.resolve(&["run"]);
        let names: Vec<&str> = tree.inherited_flags(run).iter().map(|(n, _)| *n).collect();
        assert_eq!(names, vec!["config"]);
        assert!(tree.inherited_flags(tree.root()).is_empty());
    }

    #[test]
    fn test_describe_to_json() {
        let root = Command::new("server")
            .about("HTTP server")
            .flags(
                FlagSchema::builder()
                    .flag(
                        "port",
                        FlagDefinition::int()
                            .short('p')
                            .default_value(8080)
                            .annotation("group", "network"),
                    )
                    .build()
                    .unwrap(),
            )
            .subcommand(Command::new("status").alias("st"));
        let tree = CommandTree::new(root).unwrap();
        let info = tree.describe(tree.root()).unwrap();
        assert_eq!(info.subcommands[0].path, "server status");

        let json: serde_json::Value = serde_json::from_str(&info.to_json().unwrap()).unwrap();
        assert_eq!(json["name"], "server");
        assert_eq!(json["flags"][0]["type"], "int");
        assert_eq!(json["flags"][0]["short"], "p");
        assert_eq!(json["flags"][0]["default"], 8080);
        assert_eq!(json["flags"][0]["annotations"]["group"], "network");
        assert_eq!(json["subcommands"][0]["aliases"][0], "st");
    }
}
