#![allow(dead_code)]

use std::cell::Cell;
use std::rc::Rc;

use formango::{Form, FormOptions, Issue, MaybeAsync, Path, Schema, Validation};
use serde_json::Value;

/// A miniature structural schema, enough to drive form tests.
#[derive(Debug, Clone)]
pub enum Rule {
    Any,
    String { min: usize },
    Nullable(Box<Rule>),
    Object(Vec<(&'static str, Rule)>),
    Array(Box<Rule>),
}

pub fn string() -> Rule {
    Rule::String { min: 0 }
}

pub fn min(min: usize) -> Rule {
    Rule::String { min }
}

pub fn nullable(rule: Rule) -> Rule {
    Rule::Nullable(Box::new(rule))
}

pub fn object(fields: Vec<(&'static str, Rule)>) -> Rule {
    Rule::Object(fields)
}

pub fn array(element: Rule) -> Rule {
    Rule::Array(Box::new(element))
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

impl Rule {
    pub fn check(&self, value: &Value, at: &Path, issues: &mut Vec<Issue>) {
        match (self, value) {
            (Rule::Any, _) => {}
            (Rule::Nullable(_), Value::Null) => {}
            (Rule::Nullable(inner), _) => inner.check(value, at, issues),
            (_, Value::Null) => issues.push(Issue::at_path("Required", at)),
            (Rule::String { min }, Value::String(s)) => {
                if s.chars().count() < *min {
                    issues.push(Issue::at_path(
                        format!("String must contain at least {min} character(s)"),
                        at,
                    ));
                }
            }
            (Rule::String { .. }, other) => issues.push(Issue::at_path(
                format!("Expected string, received {}", type_name(other)),
                at,
            )),
            (Rule::Object(fields), Value::Object(map)) => {
                for (key, rule) in fields {
                    rule.check(map.get(*key).unwrap_or(&Value::Null), &at.child(*key), issues);
                }
            }
            (Rule::Array(element), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    element.check(item, &at.child(i), issues);
                }
            }
            (_, other) => issues.push(Issue::at_path(
                format!("Expected {}, received {}", self.expected(), type_name(other)),
                at,
            )),
        }
    }

    fn expected(&self) -> &'static str {
        match self {
            Rule::Object(_) => "object",
            Rule::Array(_) => "array",
            _ => "value",
        }
    }

    pub fn issues(&self, value: &Value) -> Vec<Issue> {
        let mut issues = Vec::new();
        self.check(value, &Path::root(), &mut issues);
        issues
    }
}

/// Synchronous schema over a [`Rule`]; counts how often it ran.
pub struct TestSchema {
    pub rule: Rule,
    pub runs: Rc<Cell<usize>>,
}

impl Schema for TestSchema {
    type Output = Value;

    fn validate(&self, value: &Value) -> MaybeAsync<Validation<Value>> {
        self.runs.set(self.runs.get() + 1);
        let issues = self.rule.issues(value);
        MaybeAsync::Ready(if issues.is_empty() {
            Validation::Valid(value.clone())
        } else {
            Validation::Invalid(issues)
        })
    }
}

/// Schema that only answers after yielding to the runtime once.
pub struct AsyncSchema {
    pub rule: Rule,
}

impl Schema for AsyncSchema {
    type Output = Value;

    fn validate(&self, value: &Value) -> MaybeAsync<Validation<Value>> {
        let issues = self.rule.issues(value);
        let value = value.clone();
        MaybeAsync::pending(async move {
            tokio::task::yield_now().await;
            if issues.is_empty() {
                Validation::Valid(value)
            } else {
                Validation::Invalid(issues)
            }
        })
    }
}

pub fn schema(rule: Rule) -> TestSchema {
    TestSchema {
        rule,
        runs: Rc::new(Cell::new(0)),
    }
}

pub fn options(rule: Rule) -> FormOptions<TestSchema> {
    FormOptions::new(schema(rule)).id_seed(42)
}

pub fn form(rule: Rule) -> Form<TestSchema> {
    Form::new(options(rule))
}

/// A form accepting any document.
pub fn any_form() -> Form<TestSchema> {
    form(Rule::Any)
}

pub fn path_string(path: Option<Path>) -> Option<String> {
    path.map(|path| path.to_string())
}
