use std::any::TypeId;
use std::collections::{HashMap, HashSet};

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use indexmap::IndexMap;
use tracing::{debug, trace};

use crate::docstring::Docstring;
use crate::epilog;
use crate::error::{Error, Result};
use crate::interpret::interpret;
use crate::registry::{
    Action, ArgOption, ArgOptions, Descriptor, Nargs, OptionKey, Registry, ValueType,
    default_long, default_short,
};
use crate::settings::ParserSettings;
use crate::signature::{Function, FunctionEntry, Param};
use crate::value::{Namespace, Value};

/// Options of [`Parser::setup_args_with`].
#[derive(Debug, Clone, Default)]
pub struct SetupOptions {
    /// Store the function name under this key of the namespace and prefer the
    /// function when dispatching.
    pub setup_as: Option<String>,
    /// Position in the list of set up functions, appended when `None`.
    pub insert_at: Option<usize>,
    /// Overrides [`ParserSettings::interpret`] for this call.
    pub interpret: Option<bool>,
    /// Drop the arguments, description and epilog of previous setups first.
    pub overwrite: bool,
}

impl SetupOptions {
    pub fn setup_as(mut self, key: impl Into<String>) -> Self {
        self.setup_as = Some(key.into());
        self
    }

    pub fn insert_at(mut self, index: usize) -> Self {
        self.insert_at = Some(index);
        self
    }

    pub fn interpret(mut self, interpret: bool) -> Self {
        self.interpret = Some(interpret);
        self
    }

    pub fn overwrite(mut self, overwrite: bool) -> Self {
        self.overwrite = overwrite;
        self
    }
}

/// A finalized argument: the options it was built from and its clap form.
#[derive(Debug, Clone)]
pub(crate) struct BuiltArg {
    pub name: String,
    pub options: ArgOptions,
    pub arg: Arg,
}

/// Subcommands of one parser.
#[derive(Debug, Default)]
pub struct Subparsers {
    pub(crate) chain: bool,
    pub(crate) parsers: IndexMap<String, Parser>,
}

impl Subparsers {
    pub fn is_chained(&self) -> bool {
        self.chain
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.parsers.keys().map(String::as_str)
    }

    pub fn get(&self, name: &str) -> Option<&Parser> {
        self.parsers.get(name)
    }
}

/// A command line parser whose arguments come from documented functions.
///
/// Arguments are collected in a [`Registry`] by [`Parser::setup_args`], can be
/// edited, and are turned into clap arguments once by
/// [`Parser::create_arguments`].
#[derive(Debug)]
pub struct Parser {
    pub(crate) name: String,
    settings: ParserSettings,
    about: Option<String>,
    description: Option<String>,
    epilog: String,
    registry: Registry,
    pub(crate) arguments: Vec<BuiltArg>,
    finalized: bool,
    pub(crate) subparsers: Option<Subparsers>,
    functions: Vec<FunctionEntry>,
    setup_as: Option<(String, FunctionEntry)>,
}

impl Parser {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_settings(name, ParserSettings::default())
    }

    pub fn with_settings(name: impl Into<String>, settings: ParserSettings) -> Self {
        Parser {
            name: name.into(),
            settings,
            about: None,
            description: None,
            epilog: String::new(),
            registry: Registry::new(),
            arguments: Vec::new(),
            finalized: false,
            subparsers: None,
            functions: Vec::new(),
            setup_as: None,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn settings(&self) -> &ParserSettings {
        &self.settings
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn set_description(&mut self, description: impl Into<String>) -> &mut Self {
        self.description = Some(description.into());
        self
    }

    /// Short help shown next to this parser in its parent's command list.
    pub fn about(&self) -> Option<&str> {
        self.about.as_deref()
    }

    pub fn set_about(&mut self, about: impl Into<String>) -> &mut Self {
        self.about = Some(about.into());
        self
    }

    pub fn epilog(&self) -> &str {
        &self.epilog
    }

    pub fn set_epilog(&mut self, epilog: impl Into<String>) -> &mut Self {
        self.epilog = epilog.into();
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }

    pub fn is_finalized(&self) -> bool {
        self.finalized
    }

    /// Clap arguments created by the last finalization.
    pub fn arguments(&self) -> impl Iterator<Item = &Arg> {
        self.arguments.iter().map(|built| &built.arg)
    }

    /// Register the parameters of `F`.
    pub fn setup_args<F: Function>(&mut self) -> Result<&mut Self> {
        self.setup_args_with::<F>(SetupOptions::default())
    }

    pub fn setup_args_with<F: Function>(&mut self, options: SetupOptions) -> Result<&mut Self> {
        self.setup(F::doc(), &F::signature(), options, Some(FunctionEntry::of::<F>()))
    }

    /// Register parameters reflected by hand, documented by `doc`.
    pub fn setup_params(
        &mut self,
        doc: &str,
        params: &[Param],
        options: SetupOptions,
    ) -> Result<&mut Self> {
        self.setup(doc, params, options, None)
    }

    fn setup(
        &mut self,
        doc: &str,
        params: &[Param],
        options: SetupOptions,
        function: Option<FunctionEntry>,
    ) -> Result<&mut Self> {
        let doc = Docstring::parse(doc)?;
        let mut seen = HashSet::with_capacity(params.len());
        for param in params {
            let registered = !options.overwrite && self.registry.contains(&param.name);
            if registered || !seen.insert(param.name.as_str()) {
                return Err(Error::Duplicate(param.name.clone()));
            }
        }
        if options.overwrite {
            self.registry.clear();
            self.epilog.clear();
            self.description = None;
            self.functions.clear();
            self.setup_as = None;
        }

        let interpret_types = options.interpret.unwrap_or(self.settings.interpret);
        let mut descriptors = Vec::with_capacity(params.len());
        for param in params {
            let param_doc = doc.param(&param.name);
            let mut arg_options = interpret(
                param.default.as_ref(),
                param_doc.and_then(|d| d.dtype.as_deref()),
                interpret_types,
            );
            arg_options.short = default_short(&param.name);
            arg_options.long = Some(default_long(&param.name));
            arg_options.help = param_doc
                .map(|d| d.description.clone())
                .filter(|help| !help.is_empty());
            descriptors.push(Descriptor::new(param.name.clone(), arg_options));
        }
        for descriptor in descriptors {
            self.registry.register(descriptor)?;
        }

        if self.description.is_none() {
            let description = doc.description();
            if !description.is_empty() {
                self.description = Some(description);
            }
        }
        let epilog = epilog::assemble(
            &doc,
            &self.settings.epilog_sections,
            &self.settings.epilog_formatter,
        );
        if !epilog.is_empty() {
            if !self.epilog.is_empty() {
                self.epilog.push_str("\n\n");
            }
            self.epilog.push_str(&epilog);
        }

        if let Some(entry) = function {
            match options.insert_at {
                Some(index) => self.functions.insert(index.min(self.functions.len()), entry),
                None => self.functions.push(entry),
            }
            if let Some(key) = options.setup_as {
                self.setup_as = Some((key, entry));
            }
            debug!(
                "set up function '{}' on parser '{}' with {} arguments",
                entry.name,
                self.name,
                params.len()
            );
        }
        Ok(self)
    }

    /// Register an argument that does not come from a function parameter.
    pub fn add_argument(&mut self, name: impl Into<String>, options: ArgOptions) -> Result<&mut Self> {
        self.registry.register(Descriptor::new(name, options))?;
        Ok(self)
    }

    pub fn update_arg(&mut self, name: &str, option: ArgOption) -> Result<&mut Self> {
        self.registry.update_arg(name, option)?;
        Ok(self)
    }

    pub fn update_short(&mut self, name: &str, short: char) -> Result<&mut Self> {
        self.registry.update_short(name, short)?;
        Ok(self)
    }

    pub fn update_long(&mut self, name: &str, long: impl Into<String>) -> Result<&mut Self> {
        self.registry.update_long(name, long)?;
        Ok(self)
    }

    pub fn append_help(&mut self, name: &str, text: &str) -> Result<&mut Self> {
        self.registry.append_help(name, text)?;
        Ok(self)
    }

    pub fn pop_arg(&mut self, name: &str) -> Result<&mut Self> {
        self.registry.pop_arg(name)?;
        Ok(self)
    }

    pub fn pop_key(&mut self, name: &str, key: OptionKey) -> Result<&mut Self> {
        self.registry.pop_key(name, key)?;
        Ok(self)
    }

    /// Apply `apply` to this parser and every subparser set up with `F`.
    pub fn configure<F: Function>(
        &mut self,
        mut apply: impl FnMut(&mut Parser) -> Result<()>,
    ) -> Result<&mut Self> {
        if self.visit_function(TypeId::of::<F>(), &mut apply)? == 0 {
            return Err(Error::FunctionNotFound(F::NAME));
        }
        Ok(self)
    }

    fn visit_function(
        &mut self,
        id: TypeId,
        apply: &mut dyn FnMut(&mut Parser) -> Result<()>,
    ) -> Result<usize> {
        let mut found = 0;
        if self.functions.iter().any(|entry| entry.id == id) {
            apply(self)?;
            found += 1;
        }
        if let Some(subparsers) = &mut self.subparsers {
            for parser in subparsers.parsers.values_mut() {
                found += parser.visit_function(id, apply)?;
            }
        }
        Ok(found)
    }

    pub fn add_subparsers(&mut self, chain: bool) -> &mut Subparsers {
        let subparsers = self.subparsers.get_or_insert_with(Subparsers::default);
        subparsers.chain |= chain;
        subparsers
    }

    pub fn subparsers(&self) -> Option<&Subparsers> {
        self.subparsers.as_ref()
    }

    /// Register an empty subparser named `name`.
    pub fn add_parser(&mut self, name: impl Into<String>) -> Result<&mut Parser> {
        let name = name.into();
        let settings = self.settings.clone();
        let parent = self.name.clone();
        let subparsers = self
            .subparsers
            .as_mut()
            .ok_or_else(|| Error::NoSubparsers(parent.clone()))?;
        if subparsers.parsers.contains_key(&name) {
            return Err(Error::DuplicateSubparser { parser: parent, name });
        }
        debug!("adding subparser '{name}' to '{parent}'");
        let entry = subparsers.parsers.entry(name.clone());
        Ok(entry.or_insert_with(|| Parser::with_settings(name, settings)))
    }

    /// Create a subparser named after `F` (underscores become hyphens) and
    /// set it up with `F`.
    pub fn setup_subparser<F: Function>(&mut self) -> Result<&mut Parser> {
        self.setup_subparser_with::<F>(None, SetupOptions::default())
    }

    pub fn setup_subparser_with<F: Function>(
        &mut self,
        name: Option<&str>,
        options: SetupOptions,
    ) -> Result<&mut Parser> {
        let name = name.map_or_else(|| F::NAME.replace('_', "-"), String::from);
        let summary = Docstring::parse(F::doc())?.summary;
        let parser = self.add_parser(name)?;
        if !summary.is_empty() {
            parser.about = Some(summary);
        }
        parser.setup_args_with::<F>(options)?;
        Ok(parser)
    }

    pub(crate) fn subparser(&self, name: &str) -> Option<&Parser> {
        self.subparsers.as_ref().and_then(|s| s.parsers.get(name))
    }

    pub fn get_subparser(&self, name: &str) -> Result<&Parser> {
        let subparsers = self
            .subparsers
            .as_ref()
            .ok_or_else(|| Error::NoSubparsers(self.name.clone()))?;
        subparsers
            .parsers
            .get(name)
            .ok_or_else(|| Error::UnknownSubparser {
                parser: self.name.clone(),
                name: name.to_string(),
            })
    }

    pub fn get_subparser_mut(&mut self, name: &str) -> Result<&mut Parser> {
        let parent = self.name.clone();
        let subparsers = self
            .subparsers
            .as_mut()
            .ok_or_else(|| Error::NoSubparsers(parent.clone()))?;
        subparsers
            .parsers
            .get_mut(name)
            .ok_or_else(|| Error::UnknownSubparser {
                parser: parent,
                name: name.to_string(),
            })
    }

    /// Turn the registry into clap arguments. Later registry edits are not
    /// reflected. Fails when called twice; see [`Parser::recreate_arguments`].
    pub fn create_arguments(&mut self, subparsers: bool) -> Result<()> {
        if self.finalized {
            return Err(Error::AlreadyFinalized(self.name.clone()));
        }
        self.finalize()?;
        if subparsers && let Some(subs) = &mut self.subparsers {
            for parser in subs.parsers.values_mut() {
                parser.create_arguments(true)?;
            }
        }
        Ok(())
    }

    /// Discard previously created arguments and build them again.
    pub fn recreate_arguments(&mut self, subparsers: bool) -> Result<()> {
        self.arguments.clear();
        self.finalized = false;
        self.finalize()?;
        if subparsers && let Some(subs) = &mut self.subparsers {
            for parser in subs.parsers.values_mut() {
                parser.recreate_arguments(true)?;
            }
        }
        Ok(())
    }

    fn finalize(&mut self) -> Result<()> {
        let mut shorts: HashMap<char, &str> = HashMap::new();
        let mut longs: HashMap<&str, &str> = HashMap::new();
        for descriptor in self.registry.iter() {
            let options = &descriptor.options;
            if options.is_positional() {
                continue;
            }
            if let Some(short) = options.short
                && let Some(first) = shorts.insert(short, &descriptor.name)
            {
                return Err(Error::Conflict {
                    flag: format!("-{short}"),
                    first: first.to_string(),
                    second: descriptor.name.clone(),
                });
            }
            if let Some(long) = options.long.as_deref()
                && let Some(first) = longs.insert(long, &descriptor.name)
            {
                return Err(Error::Conflict {
                    flag: format!("--{long}"),
                    first: first.to_string(),
                    second: descriptor.name.clone(),
                });
            }
        }

        let arguments = self
            .registry
            .iter()
            .map(|descriptor| {
                Ok(BuiltArg {
                    name: descriptor.name.clone(),
                    options: descriptor.options.clone(),
                    arg: build_arg(descriptor)?,
                })
            })
            .collect::<Result<Vec<_>>>()?;
        debug!(
            "finalized parser '{}' with {} arguments",
            self.name,
            arguments.len()
        );
        self.arguments = arguments;
        self.finalized = true;
        Ok(())
    }

    /// The clap command of this parser alone, without subcommands.
    pub(crate) fn own_command(&self) -> Command {
        let mut command = Command::new(self.name.clone())
            .disable_help_subcommand(true)
            .args(self.arguments.iter().map(|built| built.arg.clone()));
        if let Some(about) = self.about.as_ref().or(self.description.as_ref()) {
            command = command.about(about.clone());
        }
        if let Some(description) = &self.description {
            command = command.long_about(description.clone());
        }
        if !self.epilog.is_empty() {
            command = command.after_help(self.epilog.clone());
        }
        self.help_flag(command)
    }

    fn help_flag(&self, command: Command) -> Command {
        let claims = |short: Option<char>, long: &str| {
            self.arguments.iter().any(|built| {
                built.name == "help"
                    || (!built.options.is_positional()
                        && ((short.is_some() && built.options.short == short)
                            || built.options.long.as_deref() == Some(long)))
            })
        };
        if claims(None, "help") {
            command.disable_help_flag(true)
        } else if claims(Some('h'), "help") {
            command.disable_help_flag(true).arg(
                Arg::new("help")
                    .long("help")
                    .action(ArgAction::Help)
                    .help("Print help"),
            )
        } else {
            command
        }
    }

    /// The full clap command tree, for help rendering and standard parsing.
    pub fn command(&self) -> Command {
        let mut command = self.own_command();
        if let Some(subparsers) = &self.subparsers {
            command = command.subcommands(
                subparsers
                    .parsers
                    .values()
                    .map(|parser| parser.command()),
            );
        }
        command
    }

    pub(crate) fn is_chained(&self) -> bool {
        self.subparsers.as_ref().is_some_and(|s| s.chain)
    }

    /// The command matching the own tokens of a chained parser. Its chained
    /// subcommands are attached for the help listing only, since grouping
    /// removes their names from the tokens.
    pub(crate) fn chain_command(&self) -> Command {
        let command = self.own_command();
        match &self.subparsers {
            Some(subparsers) => {
                command.subcommands(subparsers.parsers.values().map(Parser::own_command))
            }
            None => command,
        }
    }

    /// The command tree used to parse a parser without chained subparsers.
    /// A chained subparser below it only collects its raw tokens, they are
    /// parsed again by [`Parser::chain_command`] and the grouping.
    pub(crate) fn flat_command(&self) -> Command {
        let command = self.own_command();
        match &self.subparsers {
            Some(subparsers) => command.subcommands(subparsers.parsers.values().map(|parser| {
                if parser.is_chained() {
                    parser.passthrough_command()
                } else {
                    parser.flat_command()
                }
            })),
            None => command,
        }
    }

    fn passthrough_command(&self) -> Command {
        let mut command = Command::new(self.name.clone())
            .disable_help_flag(true)
            .arg(
                Arg::new(PASSTHROUGH)
                    .num_args(0..)
                    .trailing_var_arg(true)
                    .allow_hyphen_values(true)
                    .hide(true),
            );
        if let Some(about) = self.about.as_ref().or(self.description.as_ref()) {
            command = command.about(about.clone());
        }
        command
    }

    pub(crate) fn ensure_finalized(&self, subparsers: bool) -> Result<()> {
        if !self.finalized {
            return Err(Error::NotFinalized(self.name.clone()));
        }
        if subparsers && let Some(subs) = &self.subparsers {
            for parser in subs.parsers.values() {
                parser.ensure_finalized(true)?;
            }
        }
        Ok(())
    }

    /// Read the values of this parser's arguments out of `matches`.
    pub(crate) fn collect(&self, matches: &ArgMatches, namespace: &mut Namespace) -> Result<()> {
        for built in &self.arguments {
            let value = read_value(built, matches)?;
            trace!("{}.{} = {}", self.name, built.name, value);
            namespace.insert(built.name.clone(), value);
        }
        if let Some((key, entry)) = &self.setup_as {
            namespace.insert(key.clone(), entry.name);
        }
        Ok(())
    }

    /// Call the function registered with `setup_as`, or else the one set up
    /// last, with the values of `namespace`.
    pub fn dispatch(&self, namespace: &Namespace) -> Result<Value> {
        let entry = match &self.setup_as {
            Some((_, entry)) => entry,
            None => self
                .functions
                .last()
                .ok_or_else(|| Error::NoFunction(self.name.clone()))?,
        };
        debug!("calling '{}' from parser '{}'", entry.name, self.name);
        (entry.dispatch)(namespace)
    }

    pub(crate) fn has_function(&self) -> bool {
        !self.functions.is_empty()
    }
}

/// Id of the argument holding the raw tokens of a chained subparser.
pub(crate) const PASSTHROUGH: &str = "doclap-passthrough";

fn build_arg(descriptor: &Descriptor) -> Result<Arg> {
    let name = &descriptor.name;
    let options = &descriptor.options;
    let action = options.action();
    let mut arg = Arg::new(name.clone());

    if options.is_positional() {
        if action.is_switch() {
            return Err(Error::InvalidArgument {
                name: name.clone(),
                reason: "a positional argument must take a value",
            });
        }
        arg = arg.required(options.default.is_none());
    } else {
        if options.short.is_none() && options.long.is_none() {
            return Err(Error::MissingFlag(name.clone()));
        }
        if let Some(short) = options.short {
            arg = arg.short(short);
        }
        if let Some(long) = &options.long {
            arg = arg.long(long.clone());
        }
    }
    if let Some(help) = &options.help {
        arg = arg.help(help.clone());
    }
    if let Some(env) = &options.env {
        arg = arg.env(env.clone());
    }
    if options.hidden == Some(true) {
        arg = arg.hide(true);
    }

    arg = match action {
        Action::StoreTrue => arg.action(ArgAction::SetTrue),
        Action::StoreFalse => arg.action(ArgAction::SetFalse),
        Action::Count => arg.action(ArgAction::Count),
        Action::Store => {
            if let Some(metavar) = &options.metavar {
                arg = arg.value_name(metavar.clone());
            }
            arg = match options.value_type {
                Some(ValueType::Int) => arg.value_parser(value_parser!(i64)),
                Some(ValueType::Float) => arg.value_parser(value_parser!(f64)),
                Some(ValueType::Bool) => arg.value_parser(value_parser!(bool)),
                Some(ValueType::Str) | None => arg.value_parser(value_parser!(String)),
            };
            match options.nargs {
                Some(Nargs::OneOrMore) => arg.num_args(1..).action(ArgAction::Append),
                Some(Nargs::ZeroOrMore) => arg.num_args(0..).action(ArgAction::Append),
                Some(Nargs::Exactly(n)) => arg.num_args(n).action(ArgAction::Append),
                None => arg.action(ArgAction::Set),
            }
        }
    };
    Ok(arg)
}

fn read_value(built: &BuiltArg, matches: &ArgMatches) -> Result<Value> {
    let id = built.name.as_str();
    let options = &built.options;
    match matches.value_source(id) {
        Some(ValueSource::CommandLine) | Some(ValueSource::EnvVariable) => {}
        _ => {
            return Ok(match (&options.default, options.action()) {
                (Some(default), _) => default.clone(),
                (None, Action::StoreTrue) => Value::Bool(false),
                (None, Action::StoreFalse) => Value::Bool(true),
                (None, Action::Count) => Value::Int(0),
                (None, Action::Store) => Value::None,
            });
        }
    }
    let value = match options.action() {
        Action::StoreTrue | Action::StoreFalse => Value::Bool(matches.get_flag(id)),
        Action::Count => Value::Int(i64::from(matches.get_count(id))),
        Action::Store => match options.value_type {
            Some(ValueType::Int) => typed_value::<i64>(matches, id, options.nargs.is_some())?,
            Some(ValueType::Float) => typed_value::<f64>(matches, id, options.nargs.is_some())?,
            Some(ValueType::Bool) => typed_value::<bool>(matches, id, options.nargs.is_some())?,
            Some(ValueType::Str) | None => {
                typed_value::<String>(matches, id, options.nargs.is_some())?
            }
        },
    };
    Ok(value)
}

fn typed_value<T>(matches: &ArgMatches, id: &str, many: bool) -> Result<Value>
where
    T: Clone + Send + Sync + Into<Value> + 'static,
{
    let value = if many {
        matches
            .try_get_many::<T>(id)?
            .map(|values| Value::List(values.cloned().map(Into::into).collect()))
    } else {
        matches.try_get_one::<T>(id)?.cloned().map(Into::into)
    };
    Ok(value.unwrap_or_default())
}
