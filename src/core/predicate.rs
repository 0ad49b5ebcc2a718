//! Conditional rule predicates.
//!
//! Predicates are a small closed set of primitives over a BuildContext,
//! composable with all/any/not. Parsing is lenient: an unrecognized
//! primitive is preserved as `Predicate::Unknown` so it can be rejected
//! with full context at graph-build time rather than at parse time.
//!
//! Evaluation of a validated predicate is pure and total.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::context::{BuildContext, BuildEnvironment, Configuration, PlatformGroup};
use crate::util::Name;

/// A boolean condition over a build context.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Predicate {
    /// `editor` / `not-editor`: editor-build flag equals the given value
    Editor(bool),

    /// `platform(<group>)`: platform is in the named group
    PlatformGroup(PlatformGroup),

    /// `config(<configuration>)`: configuration equality
    Configuration(Configuration),

    /// `sanitizer(<name>)`: sanitizer-flag membership
    Sanitizer(Name),

    /// `env(shared|unique)`: build-environment equality
    Environment(BuildEnvironment),

    /// `all(...)`: every operand holds
    All(Vec<Predicate>),

    /// `any(...)`: at least one operand holds
    Any(Vec<Predicate>),

    /// `not(...)`: operand does not hold
    Not(Box<Predicate>),

    /// An unrecognized primitive, kept verbatim for graph-build-time rejection
    Unknown(String),
}

impl Predicate {
    /// Parse a predicate expression such as
    /// `all(editor, platform(linux), sanitizer(thread))`.
    ///
    /// Unrecognized primitives do not fail the parse; they become
    /// [`Predicate::Unknown`]. Structural errors (unbalanced parentheses,
    /// empty operand lists) do fail.
    pub fn parse(input: &str) -> Result<Predicate, ParseError> {
        let mut parser = Parser::new(input);
        let pred = parser.expression()?;
        parser.finish()?;
        Ok(pred)
    }

    /// Reject predicates containing unrecognized primitives.
    ///
    /// Returns the verbatim text of the first unknown primitive found.
    pub fn validate(&self) -> Result<(), String> {
        match self {
            Predicate::Unknown(raw) => Err(raw.clone()),
            Predicate::All(ps) | Predicate::Any(ps) => ps.iter().try_for_each(Predicate::validate),
            Predicate::Not(p) => p.validate(),
            _ => Ok(()),
        }
    }

    /// Evaluate against a build context.
    ///
    /// Total for validated predicates. `Unknown` evaluates to false, but
    /// the graph builder rejects it before evaluation is ever reached.
    pub fn evaluate(&self, ctx: &BuildContext) -> bool {
        match self {
            Predicate::Editor(expected) => ctx.editor_build == *expected,
            Predicate::PlatformGroup(group) => ctx.platform.is_in_group(*group),
            Predicate::Configuration(config) => ctx.configuration == *config,
            Predicate::Sanitizer(name) => ctx.has_sanitizer(name.as_str()),
            Predicate::Environment(env) => ctx.build_environment == *env,
            Predicate::All(ps) => ps.iter().all(|p| p.evaluate(ctx)),
            Predicate::Any(ps) => ps.iter().any(|p| p.evaluate(ctx)),
            Predicate::Not(p) => !p.evaluate(ctx),
            Predicate::Unknown(_) => false,
        }
    }
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Editor(true) => write!(f, "editor"),
            Predicate::Editor(false) => write!(f, "not-editor"),
            Predicate::PlatformGroup(g) => write!(f, "platform({})", g),
            Predicate::Configuration(c) => write!(f, "config({})", c),
            Predicate::Sanitizer(s) => write!(f, "sanitizer({})", s),
            Predicate::Environment(e) => write!(f, "env({})", e),
            Predicate::All(ps) => write_list(f, "all", ps),
            Predicate::Any(ps) => write_list(f, "any", ps),
            Predicate::Not(p) => write!(f, "not({})", p),
            Predicate::Unknown(raw) => write!(f, "{}", raw),
        }
    }
}

fn write_list(f: &mut fmt::Formatter<'_>, head: &str, ps: &[Predicate]) -> fmt::Result {
    write!(f, "{}(", head)?;
    for (i, p) in ps.iter().enumerate() {
        if i > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{}", p)?;
    }
    write!(f, ")")
}

/// Structural parse failure (unbalanced parentheses, empty expression).
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("malformed predicate at byte {offset}: {message}")]
pub struct ParseError {
    pub offset: usize,
    pub message: String,
}

struct Parser<'a> {
    input: &'a str,
    pos: usize,
}

impl<'a> Parser<'a> {
    fn new(input: &'a str) -> Self {
        Parser { input, pos: 0 }
    }

    fn error(&self, message: impl Into<String>) -> ParseError {
        ParseError {
            offset: self.pos,
            message: message.into(),
        }
    }

    fn rest(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn skip_ws(&mut self) {
        let trimmed = self.rest().trim_start();
        self.pos = self.input.len() - trimmed.len();
    }

    fn eat(&mut self, ch: char) -> bool {
        self.skip_ws();
        if self.rest().starts_with(ch) {
            self.pos += ch.len_utf8();
            true
        } else {
            false
        }
    }

    /// A bare word: letters, digits, `_`, `-`.
    fn word(&mut self) -> Result<&'a str, ParseError> {
        self.skip_ws();
        let start = self.pos;
        let end = self
            .rest()
            .find(|c: char| !c.is_ascii_alphanumeric() && c != '_' && c != '-')
            .map(|i| start + i)
            .unwrap_or(self.input.len());
        if start == end {
            return Err(self.error("expected a predicate name"));
        }
        self.pos = end;
        Ok(&self.input[start..end])
    }

    fn expression(&mut self) -> Result<Predicate, ParseError> {
        let head = self.word()?;
        let lowered = head.to_ascii_lowercase();

        // Nullary primitives take no argument list.
        if !self.eat('(') {
            return Ok(match lowered.as_str() {
                "editor" => Predicate::Editor(true),
                "not-editor" => Predicate::Editor(false),
                _ => Predicate::Unknown(head.to_string()),
            });
        }

        let pred = match lowered.as_str() {
            "all" | "any" => {
                let operands = self.operand_list()?;
                if operands.is_empty() {
                    return Err(self.error(format!("`{}` needs at least one operand", lowered)));
                }
                if lowered == "all" {
                    Predicate::All(operands)
                } else {
                    Predicate::Any(operands)
                }
            }
            "not" => {
                let inner = self.expression()?;
                Predicate::Not(Box::new(inner))
            }
            "platform" => {
                let arg = self.word()?;
                match PlatformGroup::parse(arg) {
                    Some(group) => Predicate::PlatformGroup(group),
                    None => Predicate::Unknown(format!("platform({})", arg)),
                }
            }
            "config" => {
                let arg = self.word()?;
                match Configuration::parse(arg) {
                    Some(config) => Predicate::Configuration(config),
                    None => Predicate::Unknown(format!("config({})", arg)),
                }
            }
            "sanitizer" => {
                let arg = self.word()?;
                Predicate::Sanitizer(Name::new(arg))
            }
            "env" => {
                let arg = self.word()?;
                match BuildEnvironment::parse(arg) {
                    Some(env) => Predicate::Environment(env),
                    None => Predicate::Unknown(format!("env({})", arg)),
                }
            }
            _ => {
                // Unknown primitive with arguments: swallow the balanced
                // argument text so parsing can continue past it.
                let args = self.raw_arguments()?;
                Predicate::Unknown(format!("{}({})", head, args))
            }
        };

        if !self.eat(')') {
            return Err(self.error("expected `)`"));
        }
        Ok(pred)
    }

    fn operand_list(&mut self) -> Result<Vec<Predicate>, ParseError> {
        let mut operands = Vec::new();
        self.skip_ws();
        if self.rest().starts_with(')') {
            return Ok(operands);
        }
        loop {
            operands.push(self.expression()?);
            if !self.eat(',') {
                break;
            }
        }
        Ok(operands)
    }

    /// Consume balanced text up to (not including) the matching `)`.
    fn raw_arguments(&mut self) -> Result<&'a str, ParseError> {
        let start = self.pos;
        let mut depth = 0usize;
        for (i, c) in self.rest().char_indices() {
            match c {
                '(' => depth += 1,
                ')' => {
                    if depth == 0 {
                        let args = &self.input[start..start + i];
                        self.pos = start + i;
                        return Ok(args.trim());
                    }
                    depth -= 1;
                }
                _ => {}
            }
        }
        Err(self.error("unbalanced parentheses"))
    }

    fn finish(&mut self) -> Result<(), ParseError> {
        self.skip_ws();
        if self.pos != self.input.len() {
            return Err(self.error("trailing input after predicate"));
        }
        Ok(())
    }
}
