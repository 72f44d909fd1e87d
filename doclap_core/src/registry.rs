//! The editable, ordered set of arguments a parser will be built from.
use indexmap::IndexMap;
use tracing::trace;

use crate::error::{Error, Result};
use crate::value::Value;

/// Converter applied to the raw command line text.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueType {
    Int,
    Float,
    Str,
    Bool,
}

/// How many values one argument accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nargs {
    ZeroOrMore,
    OneOrMore,
    Exactly(usize),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Store,
    StoreTrue,
    StoreFalse,
    Count,
}

impl Action {
    pub fn is_switch(self) -> bool {
        !matches!(self, Action::Store)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionKey {
    Positional,
    Short,
    Long,
    Help,
    Type,
    Nargs,
    Action,
    Metavar,
    Default,
    Env,
    Hidden,
}

/// A single option key together with its value.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgOption {
    Positional(bool),
    Short(char),
    Long(String),
    Help(String),
    Type(ValueType),
    Nargs(Nargs),
    Action(Action),
    Metavar(String),
    Default(Value),
    Env(String),
    Hidden(bool),
}

impl ArgOption {
    pub fn key(&self) -> OptionKey {
        match self {
            ArgOption::Positional(_) => OptionKey::Positional,
            ArgOption::Short(_) => OptionKey::Short,
            ArgOption::Long(_) => OptionKey::Long,
            ArgOption::Help(_) => OptionKey::Help,
            ArgOption::Type(_) => OptionKey::Type,
            ArgOption::Nargs(_) => OptionKey::Nargs,
            ArgOption::Action(_) => OptionKey::Action,
            ArgOption::Metavar(_) => OptionKey::Metavar,
            ArgOption::Default(_) => OptionKey::Default,
            ArgOption::Env(_) => OptionKey::Env,
            ArgOption::Hidden(_) => OptionKey::Hidden,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArgOptions {
    pub positional: Option<bool>,
    pub short: Option<char>,
    pub long: Option<String>,
    pub help: Option<String>,
    pub value_type: Option<ValueType>,
    pub nargs: Option<Nargs>,
    pub action: Option<Action>,
    pub metavar: Option<String>,
    pub default: Option<Value>,
    pub env: Option<String>,
    pub hidden: Option<bool>,
}

impl ArgOptions {
    pub fn is_positional(&self) -> bool {
        self.positional.unwrap_or(false)
    }

    pub fn action(&self) -> Action {
        self.action.unwrap_or(Action::Store)
    }

    /// Set one option, returning the value it replaced.
    pub fn set(&mut self, option: ArgOption) -> Option<ArgOption> {
        let previous = self.get(option.key());
        match option {
            ArgOption::Positional(v) => self.positional = Some(v),
            ArgOption::Short(v) => self.short = Some(v),
            ArgOption::Long(v) => self.long = Some(v),
            ArgOption::Help(v) => self.help = Some(v),
            ArgOption::Type(v) => self.value_type = Some(v),
            ArgOption::Nargs(v) => self.nargs = Some(v),
            ArgOption::Action(v) => self.action = Some(v),
            ArgOption::Metavar(v) => self.metavar = Some(v),
            ArgOption::Default(v) => self.default = Some(v),
            ArgOption::Env(v) => self.env = Some(v),
            ArgOption::Hidden(v) => self.hidden = Some(v),
        }
        previous
    }

    pub fn get(&self, key: OptionKey) -> Option<ArgOption> {
        match key {
            OptionKey::Positional => self.positional.map(ArgOption::Positional),
            OptionKey::Short => self.short.map(ArgOption::Short),
            OptionKey::Long => self.long.clone().map(ArgOption::Long),
            OptionKey::Help => self.help.clone().map(ArgOption::Help),
            OptionKey::Type => self.value_type.map(ArgOption::Type),
            OptionKey::Nargs => self.nargs.map(ArgOption::Nargs),
            OptionKey::Action => self.action.map(ArgOption::Action),
            OptionKey::Metavar => self.metavar.clone().map(ArgOption::Metavar),
            OptionKey::Default => self.default.clone().map(ArgOption::Default),
            OptionKey::Env => self.env.clone().map(ArgOption::Env),
            OptionKey::Hidden => self.hidden.map(ArgOption::Hidden),
        }
    }

    /// Unset one option. Returns `None` when it was never set.
    pub fn remove(&mut self, key: OptionKey) -> Option<ArgOption> {
        match key {
            OptionKey::Positional => self.positional.take().map(ArgOption::Positional),
            OptionKey::Short => self.short.take().map(ArgOption::Short),
            OptionKey::Long => self.long.take().map(ArgOption::Long),
            OptionKey::Help => self.help.take().map(ArgOption::Help),
            OptionKey::Type => self.value_type.take().map(ArgOption::Type),
            OptionKey::Nargs => self.nargs.take().map(ArgOption::Nargs),
            OptionKey::Action => self.action.take().map(ArgOption::Action),
            OptionKey::Metavar => self.metavar.take().map(ArgOption::Metavar),
            OptionKey::Default => self.default.take().map(ArgOption::Default),
            OptionKey::Env => self.env.take().map(ArgOption::Env),
            OptionKey::Hidden => self.hidden.take().map(ArgOption::Hidden),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Descriptor {
    pub name: String,
    pub options: ArgOptions,
}

impl Descriptor {
    pub fn new(name: impl Into<String>, options: ArgOptions) -> Self {
        Descriptor {
            name: name.into(),
            options,
        }
    }
}

/// Default long flag of a parameter.
pub fn default_long(name: &str) -> String {
    name.replace('_', "-")
}

/// Default short flag of a parameter: only single character names get one,
/// and `-h` stays reserved for help.
pub fn default_short(name: &str) -> Option<char> {
    let mut chars = name.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii_alphanumeric() && c != 'h' => Some(c),
        _ => None,
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Registry {
    args: IndexMap<String, Descriptor>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, descriptor: Descriptor) -> Result<&mut Descriptor> {
        if self.args.contains_key(&descriptor.name) {
            return Err(Error::Duplicate(descriptor.name));
        }
        trace!("registering argument '{}'", descriptor.name);
        let entry = self.args.entry(descriptor.name.clone());
        Ok(entry.or_insert(descriptor))
    }

    pub fn get(&self, name: &str) -> Option<&Descriptor> {
        self.args.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Descriptor> {
        self.args
            .get_mut(name)
            .ok_or_else(|| Error::UnknownArgument(name.to_string()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.args.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.args.len()
    }

    pub fn is_empty(&self) -> bool {
        self.args.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.args.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Descriptor> {
        self.args.values()
    }

    pub fn clear(&mut self) {
        self.args.clear();
    }

    pub fn update_arg(&mut self, name: &str, option: ArgOption) -> Result<Option<ArgOption>> {
        Ok(self.get_mut(name)?.options.set(option))
    }

    /// Like [`Registry::update_arg`], but registers a bare argument first when
    /// `name` is not known yet.
    pub fn update_or_insert(&mut self, name: &str, option: ArgOption) -> Option<ArgOption> {
        self.args
            .entry(name.to_string())
            .or_insert_with(|| Descriptor::new(name, ArgOptions::default()))
            .options
            .set(option)
    }

    pub fn update_short(&mut self, name: &str, short: char) -> Result<Option<ArgOption>> {
        self.update_arg(name, ArgOption::Short(short))
    }

    pub fn update_long(&mut self, name: &str, long: impl Into<String>) -> Result<Option<ArgOption>> {
        self.update_arg(name, ArgOption::Long(long.into()))
    }

    pub fn append_help(&mut self, name: &str, text: &str) -> Result<()> {
        let options = &mut self.get_mut(name)?.options;
        options.help.get_or_insert_with(String::new).push_str(text);
        Ok(())
    }

    pub fn pop_arg(&mut self, name: &str) -> Result<Descriptor> {
        self.args
            .shift_remove(name)
            .ok_or_else(|| Error::UnknownArgument(name.to_string()))
    }

    pub fn pop_key(&mut self, name: &str, key: OptionKey) -> Result<Option<ArgOption>> {
        Ok(self.get_mut(name)?.options.remove(key))
    }
}
