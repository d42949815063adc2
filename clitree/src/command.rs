//! Command definitions and the view hooks receive at run time.

use std::fmt;
use std::sync::Arc;

use crate::args::ArgsValidator;
use crate::config::ConfigProvider;
use crate::context::Context;
use crate::flags::{FlagSchema, FlagSet};
use crate::tree::{CommandId, CommandTree};

/// A lifecycle hook (PreRun, Run or PostRun).
///
/// Closures with the matching signature implement it; structured hooks can
/// implement it directly and be attached with the `*_hook` builder methods.
pub trait Hook {
    fn invoke(&self, cmd: &CommandContext<'_>, args: &[String]) -> anyhow::Result<()>;
}

impl<F> Hook for F
where
    F: Fn(&CommandContext<'_>, &[String]) -> anyhow::Result<()>,
{
    fn invoke(&self, cmd: &CommandContext<'_>, args: &[String]) -> anyhow::Result<()> {
        self(cmd, args)
    }
}

/// One named CLI action.
///
/// Commands are built with chained setters and then handed to a
/// [`CommandTree`], which takes ownership of them and their subcommands:
///
/// ```
/// use clitree::{Command, CommandTree};
///
/// let root = Command::new("toolbox").subcommand(
///     Command::new("version")
///         .aliases(["v", "ver"])
///         .about("Print the version")
///         .run(|_cmd, _args| {
///             println!("toolbox 1.0");
///             Ok(())
///         }),
/// );
/// let tree = CommandTree::new(root).unwrap();
/// tree.execute(["toolbox", "v"]).unwrap();
/// ```
pub struct Command {
    name: String,
    aliases: Vec<String>,
    about: Option<String>,
    long_about: Option<String>,
    pre_run: Option<Box<dyn Hook>>,
    run: Option<Box<dyn Hook>>,
    post_run: Option<Box<dyn Hook>>,
    args_validator: Option<Box<dyn ArgsValidator>>,
    valid_args: Vec<String>,
    flags: Option<FlagSchema>,
    config: Option<Arc<dyn ConfigProvider>>,
    pub(crate) subcommands: Vec<Command>,
}

impl Command {
    /// Create a command with no hooks, flags or subcommands
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            aliases: Vec::new(),
            about: None,
            long_about: None,
            pre_run: None,
            run: None,
            post_run: None,
            args_validator: None,
            valid_args: Vec::new(),
            flags: None,
            config: None,
            subcommands: Vec::new(),
        }
    }

    /// Add an alias
    pub fn alias(mut self, alias: impl Into<String>) -> Self {
        self.aliases.push(alias.into());
        self
    }

    /// Add several aliases
    pub fn aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.aliases.extend(aliases.into_iter().map(Into::into));
        self
    }

    /// One-line description.
    pub fn about(mut self, about: impl Into<String>) -> Self {
        self.about = Some(about.into());
        self
    }

    /// Set the long description shown on the command's help page
    pub fn long_about(mut self, long_about: impl Into<String>) -> Self {
        self.long_about = Some(long_about.into());
        self
    }

    /// Set the PreRun hook
    pub fn pre_run<F>(self, hook: F) -> Self
    where
        F: Fn(&CommandContext<'_>, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.pre_run_hook(hook)
    }

    /// Set the Run hook
    pub fn run<F>(self, hook: F) -> Self
    where
        F: Fn(&CommandContext<'_>, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.run_hook(hook)
    }

    /// Set the PostRun hook
    pub fn post_run<F>(self, hook: F) -> Self
    where
        F: Fn(&CommandContext<'_>, &[String]) -> anyhow::Result<()> + 'static,
    {
        self.post_run_hook(hook)
    }

    /// Set the PreRun hook from a [`Hook`] implementation
    pub fn pre_run_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.pre_run = Some(Box::new(hook));
        self
    }

    /// Set the Run hook from a [`Hook`] implementation
    pub fn run_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.run = Some(Box::new(hook));
        self
    }

    /// Set the PostRun hook from a [`Hook`] implementation
    pub fn post_run_hook(mut self, hook: impl Hook + 'static) -> Self {
        self.post_run = Some(Box::new(hook));
        self
    }

    /// Positional-argument validator, run after flag parsing.
    pub fn args(mut self, validator: impl ArgsValidator + 'static) -> Self {
        self.args_validator = Some(Box::new(validator));
        self
    }

    /// Allowed positional values, consulted by [`OnlyValidArgs`](crate::args::OnlyValidArgs).
    pub fn valid_args<I, S>(mut self, valid_args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.valid_args = valid_args.into_iter().map(Into::into).collect();
        self
    }

    /// Flag schema. Without one, every residual token is positional.
    pub fn flags(mut self, schema: FlagSchema) -> Self {
        self.flags = Some(schema);
        self
    }

    /// Set the configuration provider, inherited by descendants without one
    pub fn config(mut self, provider: impl ConfigProvider + 'static) -> Self {
        self.config = Some(Arc::new(provider));
        self
    }

    /// Set a shared configuration provider
    pub fn config_arc(mut self, provider: Arc<dyn ConfigProvider>) -> Self {
        self.config = Some(provider);
        self
    }

    /// Add a subcommand
    pub fn subcommand(mut self, command: Command) -> Self {
        self.subcommands.push(command);
        self
    }

    /// Command name
    pub fn get_name(&self) -> &str {
        &self.name
    }

    /// Aliases, in declaration order
    pub fn get_aliases(&self) -> &[String] {
        &self.aliases
    }

    /// Whether `token` is this command's name or one of its aliases.
    pub fn matches(&self, token: &str) -> bool {
        self.name == token || self.aliases.iter().any(|a| a == token)
    }

    /// Short description
    pub fn get_about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    /// Long description
    pub fn get_long_about(&self) -> Option<&str> {
        self.long_about.as_deref()
    }

    /// Allowed positional values
    pub fn get_valid_args(&self) -> &[String] {
        &self.valid_args
    }

    /// Flag schema, if any
    pub fn get_flags(&self) -> Option<&FlagSchema> {
        self.flags.as_ref()
    }

    pub(crate) fn get_config(&self) -> Option<&Arc<dyn ConfigProvider>> {
        self.config.as_ref()
    }

    pub(crate) fn get_args_validator(&self) -> Option<&dyn ArgsValidator> {
        self.args_validator.as_deref()
    }

    pub(crate) fn hooks(&self) -> [Option<&dyn Hook>; 3] {
        [
            self.pre_run.as_deref(),
            self.run.as_deref(),
            self.post_run.as_deref(),
        ]
    }
}

impl fmt::Debug for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .field("aliases", &self.aliases)
            .field("about", &self.about)
            .field("valid_args", &self.valid_args)
            .field("flags", &self.flags)
            .field("has_config", &self.config.is_some())
            .field("subcommands", &self.subcommands)
            .finish()
    }
}

// ============================================================================
// CommandContext
// ============================================================================

/// What a hook sees of the command being executed.
pub struct CommandContext<'a> {
    tree: &'a CommandTree,
    id: CommandId,
    command: &'a Command,
    flags: FlagSet<'a>,
    context: &'a Context,
}

impl<'a> CommandContext<'a> {
    pub(crate) fn new(
        tree: &'a CommandTree,
        id: CommandId,
        command: &'a Command,
        flags: FlagSet<'a>,
        context: &'a Context,
    ) -> Self {
        Self {
            tree,
            id,
            command,
            flags,
            context,
        }
    }

    /// Handle of the executing command
    pub fn id(&self) -> CommandId {
        self.id
    }

    /// The executing command
    pub fn command(&self) -> &'a Command {
        self.command
    }

    /// Name of the executing command
    pub fn name(&self) -> &'a str {
        self.command.get_name()
    }

    /// The tree the command belongs to
    pub fn tree(&self) -> &'a CommandTree {
        self.tree
    }

    /// Parsed flags for this invocation. Empty when the command has no schema.
    pub fn flags(&self) -> &FlagSet<'a> {
        &self.flags
    }

    /// Nearest configuration provider on the path to the root.
    pub fn config(&self) -> Option<&'a dyn ConfigProvider> {
        self.tree.config(self.id)
    }

    /// Context passed to `execute_with_context`
    pub fn context(&self) -> &'a Context {
        self.context
    }
}

impl fmt::Debug for CommandContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandContext")
            .field("id", &self.id)
            .field("name", &self.name())
            .field("flags", &self.flags)
            .field("context", &self.context)
            .finish()
    }
}
