//! Declarative checks of a dwelling record against the inputs SAP needs.
//!
//! A [`Rule`] tree is evaluated top-down against a record and always produces an [`Outcome`]:
//! whether the rule passed, and every violation found on the way. Evaluation never fails.

pub mod rules;

use crate::input::DwellingRecord;
use itertools::Itertools;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::fmt::{self, Display, Formatter};

pub use rules::validate;

/// The runtime type a required field's value must have.
#[derive(Clone, Debug, PartialEq)]
pub enum FieldType {
    Number,
    Integer,
    Boolean,
    String,
    List,
    Record,
    /// A string drawn from a closed set of values.
    Enum(&'static [&'static str]),
}

impl FieldType {
    fn matches(&self, value: &JsonValue) -> bool {
        match self {
            FieldType::Number => value.is_number(),
            FieldType::Integer => {
                value.is_u64() || value.is_i64() || value.as_f64().is_some_and(|n| n.fract() == 0.)
            }
            FieldType::Boolean => value.is_boolean(),
            FieldType::String => value.is_string(),
            FieldType::List => value.is_array(),
            FieldType::Record => value.is_object(),
            FieldType::Enum(options) => value
                .as_str()
                .is_some_and(|s| options.iter().any(|option| *option == s)),
        }
    }
}

impl Display for FieldType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Number => write!(f, "a number"),
            FieldType::Integer => write!(f, "a whole number"),
            FieldType::Boolean => write!(f, "true or false"),
            FieldType::String => write!(f, "a string"),
            FieldType::List => write!(f, "a list"),
            FieldType::Record => write!(f, "an object"),
            FieldType::Enum(options) => write!(f, "one of {}", options.iter().join(", ")),
        }
    }
}

/// A condition on a record that switches conditional rules on or off.
#[derive(Clone, Debug, PartialEq)]
pub enum Predicate {
    Present(&'static str),
    Truthy(&'static str),
    Equals(&'static str, JsonValue),
    Not(Box<Predicate>),
    /// Holds when at least one inner predicate holds.
    Any(Vec<Predicate>),
}

impl Predicate {
    pub fn holds(&self, record: &DwellingRecord) -> bool {
        match self {
            Predicate::Present(field) => record.is_present(field),
            Predicate::Truthy(field) => record.get(field).is_some_and(is_truthy),
            Predicate::Equals(field, expected) => record.get(field) == Some(expected),
            Predicate::Not(predicate) => !predicate.holds(record),
            Predicate::Any(predicates) => predicates.iter().any(|p| p.holds(record)),
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub enum Rule {
    /// The field must be present, truthy, and of the given type.
    Required {
        field: &'static str,
        field_type: FieldType,
    },
    /// When the predicate holds every inner rule must pass; otherwise passes.
    RequiredIf {
        predicate: Predicate,
        rules: Vec<Rule>,
    },
    /// As `RequiredIf`, and additionally when the predicate does not hold the inner rules must
    /// not all pass. A partially supplied inner group is not detected.
    RequiredIfAndOnlyIf {
        predicate: Predicate,
        rules: Vec<Rule>,
    },
    /// Exactly one inner rule must pass.
    OneOf {
        label: &'static str,
        rules: Vec<Rule>,
    },
    Group(Vec<Rule>),
    /// Inner rules must either all pass or all fail.
    OptionalGroup(Vec<Rule>),
}

impl Rule {
    pub fn required(field: &'static str, field_type: FieldType) -> Self {
        Rule::Required { field, field_type }
    }

    pub fn required_if(predicate: Predicate, rules: Vec<Rule>) -> Self {
        Rule::RequiredIf { predicate, rules }
    }

    pub fn required_if_and_only_if(predicate: Predicate, rules: Vec<Rule>) -> Self {
        Rule::RequiredIfAndOnlyIf { predicate, rules }
    }

    pub fn one_of(label: &'static str, rules: Vec<Rule>) -> Self {
        Rule::OneOf { label, rules }
    }

    pub fn evaluate(&self, record: &DwellingRecord) -> Outcome {
        match self {
            Rule::Required { field, field_type } => match record.get(field) {
                Some(value) if is_truthy(value) => {
                    if field_type.matches(value) {
                        Outcome::pass()
                    } else {
                        Outcome::fail(format!("{field} should be {field_type}, got {value}"))
                    }
                }
                _ => Outcome::fail(format!("{field} is required")),
            },
            Rule::RequiredIf { predicate, rules } => {
                if predicate.holds(record) {
                    evaluate_all(rules, record)
                } else {
                    Outcome::pass()
                }
            }
            Rule::RequiredIfAndOnlyIf { predicate, rules } => {
                let inner = evaluate_all(rules, record);
                if predicate.holds(record) {
                    inner
                } else if inner.passed {
                    Outcome::fail(format!(
                        "fields present that should not be: {}",
                        fields_named_by(rules).join(", ")
                    ))
                } else {
                    Outcome::pass()
                }
            }
            Rule::OneOf { label, rules } => {
                let passes = rules
                    .iter()
                    .filter(|rule| rule.evaluate(record).passed)
                    .count();
                match passes {
                    1 => Outcome::pass(),
                    0 => Outcome::fail(format!("no match for {label}")),
                    _ => Outcome::fail(format!("ambiguous match for {label}")),
                }
            }
            Rule::Group(rules) => evaluate_all(rules, record),
            Rule::OptionalGroup(rules) => {
                let (passing, failing): (Vec<_>, Vec<_>) = rules
                    .iter()
                    .partition(|rule| rule.evaluate(record).passed);
                if passing.is_empty() || failing.is_empty() {
                    Outcome::pass()
                } else {
                    Outcome::fail(format!(
                        "partial group: {} given without {}",
                        passing.iter().flat_map(|rule| rule.fields()).join(", "),
                        failing.iter().flat_map(|rule| rule.fields()).join(", ")
                    ))
                }
            }
        }
    }

    /// Every field name a rule refers to, in tree order.
    fn fields(&self) -> Vec<&'static str> {
        match self {
            Rule::Required { field, .. } => vec![*field],
            Rule::RequiredIf { rules, .. }
            | Rule::RequiredIfAndOnlyIf { rules, .. }
            | Rule::OneOf { rules, .. }
            | Rule::Group(rules)
            | Rule::OptionalGroup(rules) => fields_named_by(rules),
        }
    }
}

fn fields_named_by(rules: &[Rule]) -> Vec<&'static str> {
    rules.iter().flat_map(Rule::fields).collect()
}

/// Group semantics: every rule is evaluated and all violations are kept.
fn evaluate_all(rules: &[Rule], record: &DwellingRecord) -> Outcome {
    rules
        .iter()
        .map(|rule| rule.evaluate(record))
        .fold(Outcome::pass(), |mut outcome, inner| {
            outcome.passed &= inner.passed;
            outcome.violations.extend(inner.violations);
            outcome
        })
}

/// Null, false, zero, and empty strings, lists or objects all count as not provided.
fn is_truthy(value: &JsonValue) -> bool {
    match value {
        JsonValue::Null => false,
        JsonValue::Bool(b) => *b,
        JsonValue::Number(n) => n.as_f64().is_some_and(|n| n != 0.),
        JsonValue::String(s) => !s.is_empty(),
        JsonValue::Array(a) => !a.is_empty(),
        JsonValue::Object(o) => !o.is_empty(),
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Violation(String);

impl Violation {
    pub fn message(&self) -> &str {
        &self.0
    }
}

impl Display for Violation {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct Outcome {
    pub passed: bool,
    pub violations: Vec<Violation>,
}

impl Outcome {
    fn pass() -> Self {
        Self {
            passed: true,
            violations: vec![],
        }
    }

    fn fail(message: String) -> Self {
        Self {
            passed: false,
            violations: vec![Violation(message)],
        }
    }
}

pub type ValidationReport = Outcome;
