//! Parsing entry points and chained subcommand dispatch.
//!
//! With chained subparsers several subcommands may follow each other on one
//! command line, and each one keeps its values in its own namespace:
//!
//! ```text
//! prog -a test sp1 -t sp11 -b okay sp12 -c sp2
//!
//! Namespace(a="test",
//!           sp1=Namespace(a="test", t=false,
//!                         sp11=Namespace(a="test", t=false, b="okay"),
//!                         sp12=Namespace(a="test", t=false, c=true)),
//!           sp2=Namespace(a="test", t=true))
//! ```
use clap::error::{ContextKind, ContextValue, ErrorKind};
use clap::{ArgMatches, Command};
use tracing::{debug, trace};

use crate::error::{Error, Result};
use crate::parser::{PASSTHROUGH, Parser};
use crate::signature::Function;
use crate::value::{Namespace, Value};

/// Command line tokens split between a parser and its chained subcommands.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct Groups {
    pub main: Vec<String>,
    pub commands: Vec<(String, Vec<String>)>,
}

/// Key of a subcommand in the namespace of its parent.
pub fn namespace_key(command: &str) -> String {
    command.replace('-', "_")
}

fn tokens<I, T>(args: I) -> Vec<String>
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    args.into_iter().map(Into::into).collect()
}

impl Parser {
    /// Parse `args` (without the program name).
    pub fn parse_args<I, T>(&self, args: I) -> Result<Namespace>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (namespace, leftovers) = self.parse_level(&tokens(args), &Namespace::new(), false)?;
        if !leftovers.is_empty() {
            return Err(Error::UnrecognizedArguments(leftovers));
        }
        Ok(namespace)
    }

    /// Like [`Parser::parse_args`], but unrecognized tokens are returned
    /// instead of failing the parse.
    pub fn parse_known_args<I, T>(&self, args: I) -> Result<(Namespace, Vec<String>)>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        self.parse_level(&tokens(args), &Namespace::new(), true)
    }

    /// Parse the process arguments, printing usage and exiting on failure.
    pub fn parse_or_exit(&self) -> Namespace {
        match self.parse_args(std::env::args().skip(1)) {
            Ok(namespace) => namespace,
            Err(Error::Clap(err)) => err.exit(),
            Err(err) => {
                eprintln!("error: {err}");
                std::process::exit(2)
            }
        }
    }

    /// Parse `args` and call the function this parser was set up with.
    pub fn parse2func<I, T>(&self, args: I) -> Result<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let namespace = self.parse_args(args)?;
        self.dispatch(&namespace)
    }

    pub fn parse_known2func<I, T>(&self, args: I) -> Result<(Value, Vec<String>)>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (namespace, leftovers) = self.parse_known_args(args)?;
        Ok((self.dispatch(&namespace)?, leftovers))
    }

    /// Parse `args` and call `F` with the result.
    pub fn parse_to<F: Function>(&self, args: impl IntoIterator<Item = impl Into<String>>) -> Result<F::Output> {
        let namespace = self.parse_args(args)?;
        F::call(&namespace)
    }

    /// Parse `args` and call the function of every visited subcommand.
    ///
    /// Returns a namespace mapping each visited subcommand to the value its
    /// function returned, or the return value of this parser's own function
    /// when no subcommand was visited.
    pub fn parse_chained<I, T>(&self, args: I) -> Result<Value>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let namespace = self.parse_args(args)?;
        self.dispatch_chained(&namespace)
    }

    pub fn parse_known_chained<I, T>(&self, args: I) -> Result<(Value, Vec<String>)>
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        let (namespace, leftovers) = self.parse_known_args(args)?;
        Ok((self.dispatch_chained(&namespace)?, leftovers))
    }

    /// Call the functions of the subcommands present in `namespace`, see
    /// [`Parser::parse_chained`].
    pub fn dispatch_chained(&self, namespace: &Namespace) -> Result<Value> {
        let mut results = Namespace::new();
        if let Some(subparsers) = &self.subparsers {
            for (name, parser) in &subparsers.parsers {
                let key = namespace_key(name);
                if let Some(child) = namespace.child(&key) {
                    results.insert(key, parser.dispatch_chained(child)?);
                }
            }
        }
        if !results.is_empty() {
            return Ok(Value::Namespace(results));
        }
        if self.has_function() {
            self.dispatch(namespace)
        } else {
            Ok(Value::None)
        }
    }

    pub(crate) fn parse_level(
        &self,
        tokens: &[String],
        inherited: &Namespace,
        known: bool,
    ) -> Result<(Namespace, Vec<String>)> {
        let Some(subparsers) = self.subparsers.as_ref().filter(|s| s.chain) else {
            self.ensure_finalized(true)?;
            return self.parse_flat(tokens, inherited, known);
        };
        self.ensure_finalized(false)?;

        let groups = self.group_tokens(tokens);
        let (mut namespace, mut leftovers) = self.parse_own(&groups.main, inherited, known)?;
        let parent = namespace.clone();
        for (name, group) in groups.commands {
            let Some(parser) = subparsers.get(&name) else {
                continue;
            };
            debug!("parsing chained command '{name}' of '{}'", self.name);
            let (child, rest) = parser.parse_level(&group, &parent, known)?;
            leftovers.extend(rest);
            let mut scope = Namespace::new();
            scope.insert(namespace_key(&name), child);
            namespace.merge(scope);
        }
        Ok((namespace, leftovers))
    }

    fn parse_own(
        &self,
        tokens: &[String],
        inherited: &Namespace,
        known: bool,
    ) -> Result<(Namespace, Vec<String>)> {
        let (matches, leftovers) = try_matches(self.chain_command(), tokens, known)?;
        let mut namespace = inherited.clone();
        self.collect(&matches, &mut namespace)?;
        Ok((namespace, leftovers))
    }

    /// Parse with clap's subcommand tree, flattening the values of every
    /// matched subcommand. The first chained subparser met takes over the
    /// rest of the tokens.
    fn parse_flat(
        &self,
        tokens: &[String],
        inherited: &Namespace,
        known: bool,
    ) -> Result<(Namespace, Vec<String>)> {
        let (matches, mut leftovers) = try_matches(self.flat_command(), tokens, known)?;
        let mut namespace = inherited.clone();
        let mut parser = self;
        let mut matches = &matches;
        loop {
            parser.collect(matches, &mut namespace)?;
            let Some((name, sub_matches)) = matches.subcommand() else {
                break;
            };
            let Some(child) = parser.subparser(name) else {
                break;
            };
            if child.is_chained() {
                let raw: Vec<String> = sub_matches
                    .try_get_many::<String>(PASSTHROUGH)?
                    .map(|values| values.cloned().collect())
                    .unwrap_or_default();
                debug!("handing {} tokens to chained parser '{name}'", raw.len());
                let (chained, rest) = child.parse_level(&raw, &namespace, known)?;
                leftovers.extend(rest);
                namespace = chained;
                break;
            }
            parser = child;
            matches = sub_matches;
        }
        Ok((namespace, leftovers))
    }

    /// Split `tokens` into this parser's own tokens and one group per chained
    /// subcommand.
    ///
    /// Inside a group, a token naming a subcommand reachable from the group's
    /// active path stays in the group; the deepest parser on that path wins.
    /// Any other token naming one of this parser's subcommands opens a new group.
    pub(crate) fn group_tokens(&self, tokens: &[String]) -> Groups {
        let mut groups = Groups::default();
        let Some(subparsers) = &self.subparsers else {
            groups.main = tokens.to_vec();
            return groups;
        };
        let mut path: Vec<&Parser> = Vec::new();
        for token in tokens {
            let nested = path
                .iter()
                .enumerate()
                .rev()
                .find_map(|(depth, parser)| parser.subparser(token).map(|child| (depth, child)));
            if let Some((depth, child)) = nested {
                path.truncate(depth + 1);
                path.push(child);
                if let Some((_, group)) = groups.commands.last_mut() {
                    group.push(token.clone());
                }
            } else if let Some(parser) = subparsers.get(token) {
                trace!("opening group '{token}' in '{}'", self.name);
                path = vec![parser];
                groups.commands.push((token.clone(), Vec::new()));
            } else if let Some((_, group)) = groups.commands.last_mut() {
                group.push(token.clone());
            } else {
                groups.main.push(token.clone());
            }
        }
        groups
    }
}

fn try_matches(command: Command, tokens: &[String], known: bool) -> Result<(ArgMatches, Vec<String>)> {
    let command = command.no_binary_name(true);
    if known {
        matches_known(command, tokens)
    } else {
        Ok((command.try_get_matches_from(tokens)?, Vec::new()))
    }
}

/// Match `tokens`, moving every token clap does not recognize to the
/// returned leftovers.
fn matches_known(command: Command, tokens: &[String]) -> Result<(ArgMatches, Vec<String>)> {
    let mut tokens = tokens.to_vec();
    let mut leftovers = Vec::new();
    loop {
        let err = match command.clone().try_get_matches_from(&tokens) {
            Ok(matches) => return Ok((matches, leftovers)),
            Err(err) => err,
        };
        let Some(position) = unknown_token(&err, &tokens) else {
            return Err(err.into());
        };
        let token = tokens.remove(position);
        trace!("leaving unknown token '{token}'");
        leftovers.push(token);
    }
}

fn unknown_token(err: &clap::Error, tokens: &[String]) -> Option<usize> {
    let context = match err.kind() {
        ErrorKind::UnknownArgument => ContextKind::InvalidArg,
        ErrorKind::InvalidSubcommand => ContextKind::InvalidSubcommand,
        _ => return None,
    };
    let ContextValue::String(invalid) = err.get(context)? else {
        return None;
    };
    tokens.iter().position(|token| {
        token == invalid
            || token
                .strip_prefix(invalid.as_str())
                .is_some_and(|rest| rest.starts_with('='))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{Action, ArgOptions};

    fn flag(long: Option<&str>, short: Option<char>, action: Option<Action>) -> ArgOptions {
        ArgOptions {
            positional: Some(false),
            short,
            long: long.map(String::from),
            action,
            ..Default::default()
        }
    }

    fn option(short: char) -> ArgOptions {
        flag(None, Some(short), None)
    }

    fn switch(short: char, action: Action) -> ArgOptions {
        flag(None, Some(short), Some(action))
    }

    /// prog -a; sp1 -t (sp11 -b, sp12 -c); sp2 -t
    fn tree(nested_chain: bool, root_sp11: bool) -> Parser {
        let mut parser = Parser::new("prog");
        parser.add_argument("a", option('a')).unwrap();
        parser.add_subparsers(true);

        let sp1 = parser.add_parser("sp1").unwrap();
        sp1.add_argument("t", switch('t', Action::StoreFalse)).unwrap();
        sp1.add_subparsers(nested_chain);
        sp1.add_parser("sp11")
            .unwrap()
            .add_argument("b", option('b'))
            .unwrap();
        sp1.add_parser("sp12")
            .unwrap()
            .add_argument("c", switch('c', Action::StoreTrue))
            .unwrap();

        if root_sp11 {
            parser
                .add_parser("sp11")
                .unwrap()
                .add_argument("b", option('b'))
                .unwrap();
        }
        parser
            .add_parser("sp2")
            .unwrap()
            .add_argument("t", switch('t', Action::StoreFalse))
            .unwrap();
        parser.create_arguments(true).unwrap();
        parser
    }

    fn split(line: &str) -> Vec<String> {
        line.split_whitespace().map(String::from).collect()
    }

    fn s(value: &str) -> Value {
        Value::Str(value.to_string())
    }

    #[test]
    fn test_grouping() {
        let parser = tree(true, true);
        let groups = parser.group_tokens(&split("-a test sp11 -b root sp1 -t sp11 -b okay sp12 -c sp2"));
        assert_eq!(groups.main, split("-a test"));
        assert_eq!(
            groups.commands,
            vec![
                ("sp11".to_string(), split("-b root")),
                ("sp1".to_string(), split("-t sp11 -b okay sp12 -c")),
                ("sp2".to_string(), Vec::new()),
            ]
        );
    }

    #[test]
    fn test_subparser_chain() {
        let parser = tree(true, false);
        let ns = parser
            .parse_args(split("-a test sp1 -t sp11 -b okay sp12 -c sp2"))
            .unwrap();
        assert_eq!(ns.get("a"), Some(&s("test")));

        let sp1 = ns.child("sp1").unwrap();
        let sp2 = ns.child("sp2").unwrap();
        assert_eq!(sp1.get("a"), Some(&s("test")));
        assert_eq!(sp2.get("a"), Some(&s("test")));
        assert_eq!(sp1.get("t"), Some(&Value::Bool(false)));
        assert_eq!(sp2.get("t"), Some(&Value::Bool(true)));

        let sp11 = sp1.child("sp11").unwrap();
        let sp12 = sp1.child("sp12").unwrap();
        assert_eq!(sp11.get("t"), Some(&Value::Bool(false)));
        assert_eq!(sp12.get("t"), Some(&Value::Bool(false)));
        assert_eq!(sp11.get("b"), Some(&s("okay")));
        assert_eq!(sp12.get("c"), Some(&Value::Bool(true)));
    }

    #[test]
    fn test_subparser_renamed() {
        let parser = tree(false, true);
        let ns = parser
            .parse_args(split("-a test sp11 -b root sp1 -t sp11 -b okay sp2"))
            .unwrap();
        assert_eq!(ns.child("sp1").unwrap().get("b"), Some(&s("okay")));
        assert_eq!(ns.child("sp11").unwrap().get("b"), Some(&s("root")));
    }

    #[test]
    fn test_subparser_renamed_chain() {
        let parser = tree(true, true);
        let ns = parser
            .parse_args(split("-a test sp11 -b root sp1 -t sp11 -b okay sp12 -c sp2"))
            .unwrap();
        let sp1 = ns.child("sp1").unwrap();
        assert_eq!(sp1.child("sp11").unwrap().get("b"), Some(&s("okay")));
        assert_eq!(ns.child("sp11").unwrap().get("b"), Some(&s("root")));
    }

    #[test]
    fn test_most_local_name_wins() {
        let mut parser = Parser::new("prog");
        parser.add_subparsers(true);
        parser
            .add_parser("dummy")
            .unwrap()
            .add_argument("a", option('a'))
            .unwrap();
        let outer = parser.add_parser("outer").unwrap();
        outer.add_subparsers(true);
        outer
            .add_parser("dummy")
            .unwrap()
            .add_argument("a", option('a'))
            .unwrap();
        parser.create_arguments(true).unwrap();

        let ns = parser.parse_args(split("outer dummy -a 3")).unwrap();
        let nested = ns.child("outer").unwrap().child("dummy").unwrap();
        assert_eq!(nested.get("a"), Some(&s("3")));
        assert!(ns.child("dummy").is_none());

        let ns = parser.parse_args(split("dummy -a 3")).unwrap();
        assert_eq!(ns.child("dummy").unwrap().get("a"), Some(&s("3")));
        assert!(ns.child("outer").is_none());
    }

    #[test]
    fn test_standard_subparsers_flatten() {
        let mut parser = Parser::new("prog");
        parser.add_argument("a", option('a')).unwrap();
        parser.add_subparsers(false);
        parser
            .add_parser("run")
            .unwrap()
            .add_argument("b", option('b'))
            .unwrap();
        parser.create_arguments(true).unwrap();

        let ns = parser.parse_args(split("-a 1 run -b 2")).unwrap();
        assert_eq!(ns.get("a"), Some(&s("1")));
        assert_eq!(ns.get("b"), Some(&s("2")));
        assert!(ns.child("run").is_none());
    }

    #[test]
    fn test_chained_help_lists_commands() {
        let mut parser = Parser::new("prog");
        parser.add_subparsers(true);
        parser.add_parser("alpha").unwrap().set_about("First command");
        parser.add_parser("beta").unwrap();
        parser.create_arguments(true).unwrap();

        let Err(Error::Clap(err)) = parser.parse_args(["--help"]) else {
            panic!("expected the help to be displayed");
        };
        assert_eq!(err.kind(), ErrorKind::DisplayHelp);
        let text = err.to_string();
        assert!(text.contains("alpha"));
        assert!(text.contains("First command"));
        assert!(text.contains("beta"));

        let ns = parser.parse_args(split("alpha beta")).unwrap();
        assert!(ns.child("alpha").is_some());
        assert!(ns.child("beta").is_some());
    }

    #[test]
    fn test_chained_below_standard() {
        let mut parser = Parser::new("prog");
        parser.add_argument("v", switch('v', Action::StoreTrue)).unwrap();
        parser.add_subparsers(false);
        let outer = parser.add_parser("outer").unwrap();
        outer.add_argument("o", option('o')).unwrap();
        outer.add_subparsers(true);
        outer
            .add_parser("x")
            .unwrap()
            .add_argument("a", option('a'))
            .unwrap();
        outer
            .add_parser("y")
            .unwrap()
            .add_argument("b", option('b'))
            .unwrap();
        parser.create_arguments(true).unwrap();

        let ns = parser
            .parse_args(split("-v outer -o 0 x -a 1 y -b 2"))
            .unwrap();
        assert_eq!(ns.get("v"), Some(&Value::Bool(true)));
        assert_eq!(ns.get("o"), Some(&s("0")));
        let x = ns.child("x").unwrap();
        assert_eq!(x.get("a"), Some(&s("1")));
        assert_eq!(x.get("v"), Some(&Value::Bool(true)));
        assert_eq!(ns.child("y").unwrap().get("b"), Some(&s("2")));

        let (ns, leftovers) = parser
            .parse_known_args(split("outer x -a 1 --zzz"))
            .unwrap();
        assert_eq!(leftovers, split("--zzz"));
        assert_eq!(ns.get("v"), Some(&Value::Bool(false)));
        assert_eq!(ns.child("x").unwrap().get("a"), Some(&s("1")));
    }

    #[test]
    fn test_parse_known_chained_structure() {
        let parser = tree(true, false);
        let (ns, leftovers) = parser
            .parse_known_args(split("-a test --unknown sp1 -t -x sp2 extra"))
            .unwrap();
        assert_eq!(leftovers, split("--unknown -x extra"));
        assert_eq!(ns.get("a"), Some(&s("test")));
        assert_eq!(ns.child("sp1").unwrap().get("t"), Some(&Value::Bool(false)));
        assert!(ns.child("sp2").is_some());

        let err = parser.parse_args(split("-a test --unknown")).unwrap_err();
        assert!(matches!(err, Error::Clap(e) if e.kind() == ErrorKind::UnknownArgument));
    }

    #[test]
    fn test_unfinalized_subparser() {
        let mut parser = Parser::new("prog");
        parser.add_subparsers(false);
        parser.add_parser("run").unwrap();
        parser.create_arguments(false).unwrap();
        assert!(matches!(
            parser.parse_args(split("run")),
            Err(Error::NotFinalized(name)) if name == "run"
        ));
    }

    #[test]
    fn test_namespace_key() {
        assert_eq!(namespace_key("test-1"), "test_1");
    }
}
