//! Binding parse results onto user command objects.
//!
//! A [`CommandDef`] pairs a command's name, description and arguments with a
//! plain constructor. [`Cli`] builds the parser tree for a definition once,
//! and binds every [`ParsedArguments`] chain into an [`Invocation`]: one
//! instance per matched level, root first, each knowing its parent.

use std::{any::Any, fmt, sync::Arc};

use tracing::debug;

use crate::{
    argument::Argument,
    error::{binding_err, Error, Result},
    parser::{ParsedArguments, ParserNode},
};

pub trait AsAny: Any {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Behaviour of a command once it has been selected as the leaf.
pub trait Command: AsAny {
    fn call(&mut self, lineage: &Lineage<'_>) -> anyhow::Result<()>;
}

impl<'a> dyn Command + 'a {
    pub fn downcast_ref<T: Command>(&self) -> Option<&T> {
        self.as_any().downcast_ref()
    }

    pub fn downcast_mut<T: Command>(&mut self) -> Option<&mut T> {
        self.as_any_mut().downcast_mut()
    }

    pub fn is<T: Command>(&self) -> bool {
        self.as_any().is::<T>()
    }
}

type Constructor = Arc<dyn Fn(&ParsedArguments) -> Result<Box<dyn Command>> + Send + Sync>;

/// Declarative description of a command and its subcommands.
#[derive(Clone)]
pub struct CommandDef {
    name: String,
    description: String,
    arguments: Vec<(String, Argument)>,
    subcommands: Vec<CommandDef>,
    constructor: Constructor,
}

impl CommandDef {
    /// `constructor` receives the arguments parsed for this level.
    pub fn new<C, F>(name: &str, constructor: F) -> CommandDef
    where
        C: Command,
        F: Fn(&ParsedArguments) -> Result<C> + Send + Sync + 'static,
    {
        CommandDef {
            name: name.to_string(),
            description: String::new(),
            arguments: Vec::new(),
            subcommands: Vec::new(),
            constructor: Arc::new(move |parsed: &ParsedArguments| -> Result<Box<dyn Command>> {
                Ok(Box::new(constructor(parsed)?))
            }),
        }
    }

    pub fn description(mut self, description: &str) -> CommandDef {
        self.description = description.to_string();
        self
    }

    pub fn argument(mut self, dest: &str, argument: Argument) -> CommandDef {
        self.arguments.push((dest.to_string(), argument));
        self
    }

    pub fn subcommand(mut self, subcommand: CommandDef) -> CommandDef {
        self.subcommands.push(subcommand);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn get_description(&self) -> &str {
        &self.description
    }

    pub fn subcommands(&self) -> impl Iterator<Item = &CommandDef> + '_ {
        self.subcommands.iter()
    }

    pub fn find_subcommand(&self, name: &str) -> Option<&CommandDef> {
        self.subcommands.iter().find(|it| it.name == name)
    }

    fn fill(&self, node: &mut ParserNode) -> Result<()> {
        for (dest, argument) in &self.arguments {
            node.add_argument(dest, argument.clone())?;
        }
        for sub in &self.subcommands {
            let child = node.add_subparser(&sub.name, &sub.description)?;
            sub.fill(child)?;
        }
        Ok(())
    }
}

impl fmt::Debug for CommandDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CommandDef")
            .field("name", &self.name)
            .field("description", &self.description)
            .field("arguments", &self.arguments)
            .field("subcommands", &self.subcommands)
            .finish_non_exhaustive()
    }
}

/// A command tree together with its parser.
pub struct Cli {
    def: CommandDef,
    parser: ParserNode,
}

impl Cli {
    /// Builds the parser tree, failing on inconsistent registrations.
    pub fn new(def: CommandDef) -> Result<Cli> {
        let mut parser = ParserNode::new(&def.name).with_short_info(&def.description);
        def.fill(&mut parser)?;
        Ok(Cli { def, parser })
    }

    pub fn def(&self) -> &CommandDef {
        &self.def
    }

    pub fn parser(&self) -> &ParserNode {
        &self.parser
    }

    pub fn help(&self) -> String {
        self.parser.help()
    }

    pub fn parse<I, S>(&self, args: I) -> Result<ParsedArguments>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.parser.parse(args)
    }

    /// Instantiates the command of every level in `parsed`, root first.
    pub fn bind(&self, parsed: &ParsedArguments) -> Result<Invocation> {
        let mut invocation = Invocation { bound: Vec::new() };
        let mut def = &self.def;
        let mut curr = parsed;
        if curr.name != def.name {
            return Err(binding_err!("expected arguments of `{}`, got `{}`", def.name, curr.name));
        }
        loop {
            let instance = (def.constructor)(curr)?;
            let parent = invocation.bound.len().checked_sub(1);
            invocation.bound.push(Bound { name: def.name.clone(), parent, instance });

            let (Some(sub_name), Some(sub)) = (&curr.sub_name, &curr.sub) else { break };
            def = def.find_subcommand(sub_name).ok_or_else(|| {
                binding_err!("`{}` has no subcommand `{sub_name}`", def.name)
            })?;
            debug!(parent = %curr.name, command = %sub_name, "bound subcommand");
            curr = &**sub;
        }
        Ok(invocation)
    }

    /// Parses, binds and invokes the leaf.
    pub fn run<I, S>(&self, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let parsed = self.parse(args)?;
        let mut invocation = self.bind(&parsed)?;
        invocation.run()?;
        Ok(invocation)
    }

    /// Like [`Cli::run`], but help goes to stdout with exit code 0 and bad
    /// input or a failed command to stderr with exit code 2. Configuration and
    /// binding errors are returned.
    pub fn run_or_exit<I, S>(&self, args: I) -> Result<Invocation>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        match self.run(args) {
            Err(err) if err.is_user_facing() => err.exit(),
            res => res,
        }
    }

    /// [`Cli::run_or_exit`] with the process arguments.
    pub fn run_from_env(&self) -> Result<Invocation> {
        self.run_or_exit(std::env::args().skip(1))
    }
}

struct Bound {
    name: String,
    /// Index of the parent in the owning invocation.
    parent: Option<usize>,
    instance: Box<dyn Command>,
}

/// The bound command instances of one parse, owned root first.
pub struct Invocation {
    bound: Vec<Bound>,
}

impl Invocation {
    pub fn len(&self) -> usize {
        self.bound.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bound.is_empty()
    }

    /// Command names from the root to the leaf.
    pub fn names(&self) -> Vec<&str> {
        self.bound.iter().map(|it| it.name.as_str()).collect()
    }

    pub fn root(&self) -> &dyn Command {
        &*self.bound[0].instance
    }

    pub fn leaf(&self) -> &dyn Command {
        &*self.bound[self.bound.len() - 1].instance
    }

    /// Invokes the leaf and returns the invocation chain, leaf first.
    pub fn run(&mut self) -> Result<Vec<&dyn Command>> {
        let Some((leaf, ancestors)) = self.bound.split_last_mut() else {
            return Ok(Vec::new());
        };
        debug!(command = %leaf.name, "invoking");
        let lineage = Lineage { ancestors, parent: leaf.parent };
        leaf.instance.call(&lineage).map_err(Error::Command)?;
        Ok(self.chain())
    }

    /// The instances from the leaf up to the root, following parent links.
    pub fn chain(&self) -> Vec<&dyn Command> {
        let mut res = Vec::new();
        let mut curr = self.bound.len().checked_sub(1);
        while let Some(idx) = curr {
            res.push(&*self.bound[idx].instance);
            curr = self.bound[idx].parent;
        }
        res
    }
}

/// Read access to the ancestors of the invoked command.
pub struct Lineage<'a> {
    ancestors: &'a [Bound],
    parent: Option<usize>,
}

impl<'a> Lineage<'a> {
    pub fn parent(&self) -> Option<&'a dyn Command> {
        self.parent.map(|idx| &*self.ancestors[idx].instance)
    }

    /// The closest ancestor of type `T`.
    pub fn find<T: Command>(&self) -> Option<&'a T> {
        let mut curr = self.parent;
        while let Some(idx) = curr {
            if let Some(it) = self.ancestors[idx].instance.downcast_ref::<T>() {
                return Some(it);
            }
            curr = self.ancestors[idx].parent;
        }
        None
    }

    /// Ancestor names, root first.
    pub fn names(&self) -> Vec<&'a str> {
        self.ancestors.iter().map(|it| it.name.as_str()).collect()
    }
}
