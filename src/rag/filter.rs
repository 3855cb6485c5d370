use std::collections::BTreeMap;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Eq,
    NotEq,
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Clause {
    key: String,
    op: Op,
    value: String,
}

/// A metadata filter such as `source == 'guide.md' && lang != "en"`.
///
/// Clauses are joined with `&&`; every clause must hold for a document to match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterExpression {
    clauses: Vec<Clause>,
}

impl FilterExpression {
    pub fn parse(expression: &str) -> Result<Self, AppError> {
        let invalid = |message: &str| AppError::InvalidFilterExpression {
            expression: expression.to_string(),
            message: message.to_string(),
        };

        let clauses = expression
            .split("&&")
            .map(|raw| {
                let raw = raw.trim();
                let (key, op, value) = if let Some((k, v)) = raw.split_once("==") {
                    (k, Op::Eq, v)
                } else if let Some((k, v)) = raw.split_once("!=") {
                    (k, Op::NotEq, v)
                } else {
                    return Err(invalid("expected `key == 'value'` or `key != 'value'`"));
                };

                let key = key.trim();
                if key.is_empty()
                    || !key.chars().all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
                {
                    return Err(invalid("metadata key must be a plain identifier"));
                }

                let value = unquote(value.trim()).ok_or_else(|| invalid("value must be quoted"))?;
                Ok(Clause { key: key.to_string(), op, value: value.to_string() })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self { clauses })
    }

    pub fn matches(&self, metadata: &BTreeMap<String, String>) -> bool {
        self.clauses.iter().all(|clause| {
            let actual = metadata.get(&clause.key).map(String::as_str);
            match clause.op {
                Op::Eq => actual == Some(clause.value.as_str()),
                Op::NotEq => actual != Some(clause.value.as_str()),
            }
        })
    }
}

fn unquote(raw: &str) -> Option<&str> {
    ['\'', '"'].into_iter().find_map(|quote| {
        raw.strip_prefix(quote)
            .and_then(|rest| rest.strip_suffix(quote))
            .filter(|inner| !inner.contains(quote))
    })
}
