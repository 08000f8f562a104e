//! Embedded expression resolution.
//!
//! Feature and spell descriptions carry placeholders such as
//! `{{proficiency#signed}}`, `{{savedc:wis}}` or `{{(classlevel/2)@roundup}}`.
//! [`resolve_text`] rewrites each token against the character; any token it
//! cannot make sense of is left exactly as written.

use crate::ability::Ability;
use crate::context::TextContext;
use crate::scope::StatScope;
use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use thiserror::Error;
use tracing::trace;

static TOKEN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\{\{(.*?)\}\}").expect("valid regex"));
static KEYWORD: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\b(characterlevel|classlevel|proficiency|level)\b").expect("valid regex")
});
static ABILITY_REF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b(abilitymod|modifier|savedc):(\w+)\b").expect("valid regex"));
static ROUNDING: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"@(roundup|rounddown|round)\s*$").expect("valid regex"));
static ARITHMETIC: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9+\-*/().\s]+$").expect("valid regex"));

/// Why a token was left verbatim.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExprError {
    #[error("unknown ability '{0}'")]
    UnknownAbility(String),
    #[error("unrecognized expression '{0}'")]
    Unrecognized(String),
    #[error("syntax error at position {0}")]
    Syntax(usize),
    #[error("division by zero")]
    DivisionByZero,
    #[error("expression nested too deeply")]
    TooDeep,
}

/// Parentheses and unary signs nest at most this deep.
pub const MAX_DEPTH: usize = 64;

/// Replace every `{{…}}` token in `text`.
///
/// # Examples
///
/// ```rust
/// use charstat::expression::resolve_text;
/// use charstat::scope::StatScope;
/// use charstat::{Ability, TextContext};
///
/// struct Fighter;
///
/// impl StatScope for Fighter {
///     fn proficiency_bonus(&self) -> i32 { 3 }
///     fn total_level(&self) -> i32 { 5 }
///     fn class_level(&self, name: &str) -> Option<i32> {
///         name.eq_ignore_ascii_case("fighter").then_some(5)
///     }
///     fn ability_modifier(&self, ability: Ability) -> i32 {
///         if ability == Ability::Strength { 4 } else { 0 }
///     }
/// }
///
/// let context = TextContext::new();
/// assert_eq!(
///     resolve_text("Regain 1d10 + {{level}} hit points", &Fighter, &context),
///     "Regain 1d10 + 5 hit points",
/// );
/// assert_eq!(
///     resolve_text("DC {{savedc:str}}, {{modifier:str#signed}} to hit", &Fighter, &context),
///     "DC 15, +4 to hit",
/// );
/// assert_eq!(
///     resolve_text("Deal {{unknownToken}} damage", &Fighter, &context),
///     "Deal {{unknownToken}} damage",
/// );
/// ```
pub fn resolve_text<S: StatScope + ?Sized>(
    text: &str,
    scope: &S,
    context: &TextContext,
) -> String {
    TOKEN
        .replace_all(text, |caps: &Captures<'_>| {
            let raw = &caps[1];
            match resolve_token(raw, text, scope, context) {
                Ok(value) => value,
                Err(err) => {
                    trace!(token = raw, %err, "left expression unresolved");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn resolve_token<S: StatScope + ?Sized>(
    raw: &str,
    text: &str,
    scope: &S,
    context: &TextContext,
) -> Result<String, ExprError> {
    let signed = raw.contains("#signed");
    let expr = raw.split('#').next().unwrap_or_default().trim().to_lowercase();

    if expr == "scalevalue" {
        return Ok(scale_value(text, scope, context));
    }

    let expr = substitute_keywords(&expr, text, scope, context);
    let expr = substitute_abilities(&expr, scope)?;

    let (expr, rounding) = match ROUNDING.captures(&expr) {
        Some(caps) => {
            let mode = caps[1].to_string();
            let start = caps.get(0).map_or(expr.len(), |m| m.start());
            (expr[..start].to_string(), Some(mode))
        }
        None => (expr, None),
    };

    if !ARITHMETIC.is_match(&expr) {
        return Err(ExprError::Unrecognized(expr));
    }
    let mut value = evaluate(&expr)?;
    value = match rounding.as_deref() {
        Some("roundup") => value.ceil(),
        Some("rounddown") => value.floor(),
        Some(_) => value.round(),
        None => value,
    };

    Ok(format_number(value, signed))
}

fn substitute_keywords<S: StatScope + ?Sized>(
    expr: &str,
    text: &str,
    scope: &S,
    context: &TextContext,
) -> String {
    KEYWORD
        .replace_all(expr, |caps: &Captures<'_>| match &caps[1] {
            "proficiency" => scope.proficiency_bonus().to_string(),
            "classlevel" => class_level(text, scope, context).to_string(),
            _ => scope.total_level().to_string(),
        })
        .into_owned()
}

/// The class named in the context, else the Rogue level for Sneak Attack
/// text, else the total level.
fn class_level<S: StatScope + ?Sized>(text: &str, scope: &S, context: &TextContext) -> i32 {
    if let Some(level) = context
        .class_name()
        .and_then(|name| scope.class_level(name))
        .filter(|l| *l > 0)
    {
        return level;
    }
    if mentions_sneak_attack(text, context) {
        if let Some(level) = scope.class_level("Rogue").filter(|l| *l > 0) {
            return level;
        }
    }
    scope.total_level()
}

fn mentions_sneak_attack(text: &str, context: &TextContext) -> bool {
    context.mentions("sneak attack") || text.to_lowercase().contains("sneak attack")
}

fn substitute_abilities<S: StatScope + ?Sized>(
    expr: &str,
    scope: &S,
) -> Result<String, ExprError> {
    let mut out = String::with_capacity(expr.len());
    let mut last = 0;
    for caps in ABILITY_REF.captures_iter(expr) {
        let Some(whole) = caps.get(0) else { continue };
        let ability =
            Ability::parse(&caps[2]).ok_or_else(|| ExprError::UnknownAbility(caps[2].to_string()))?;
        let modifier = scope.ability_modifier(ability);
        let value = match &caps[1] {
            "savedc" => scope
                .proficiency_bonus()
                .saturating_add(modifier)
                .saturating_add(8),
            _ => modifier,
        };
        out.push_str(&expr[last..whole.start()]);
        // Parenthesized so a negative modifier stays valid arithmetic.
        if value < 0 {
            out.push_str(&format!("({value})"));
        } else {
            out.push_str(&value.to_string());
        }
        last = whole.end();
    }
    out.push_str(&expr[last..]);
    Ok(out)
}

/// Dice that scale with a class level, keyed off the surrounding text.
fn scale_value<S: StatScope + ?Sized>(text: &str, scope: &S, context: &TextContext) -> String {
    if mentions_sneak_attack(text, context) {
        let rogue = scope.class_level("Rogue").unwrap_or(0);
        if rogue > 0 {
            return format!("{}d6", rogue.saturating_add(1) / 2);
        }
    }
    if context.mentions("martial arts") || text.to_lowercase().contains("martial arts") {
        let die = match scope.class_level("Monk").unwrap_or(0) {
            17.. => Some("1d10"),
            11.. => Some("1d8"),
            5.. => Some("1d6"),
            1.. => Some("1d4"),
            _ => None,
        };
        if let Some(die) = die {
            return die.to_string();
        }
    }
    "0".to_string()
}

fn format_number(value: f64, signed: bool) -> String {
    let body = if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{}", value as i64)
    } else {
        format!("{value}")
    };
    if signed && value >= 0.0 {
        format!("+{body}")
    } else {
        body
    }
}

/// Evaluate `+ - * /` arithmetic with parentheses and unary signs.
///
/// ```rust
/// use charstat::expression::{evaluate, ExprError};
///
/// assert_eq!(evaluate("14 + 4 * 2").unwrap(), 22.0);
/// assert_eq!(evaluate("-(3 - 5) / 4").unwrap(), 0.5);
/// assert_eq!(evaluate("1 / 0"), Err(ExprError::DivisionByZero));
/// ```
pub fn evaluate(expr: &str) -> Result<f64, ExprError> {
    let mut parser = Parser {
        chars: expr.chars().filter(|c| !c.is_whitespace()).collect(),
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != parser.chars.len() {
        return Err(ExprError::Syntax(parser.pos));
    }
    Ok(value)
}

struct Parser {
    chars: Vec<char>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<char> {
        self.chars.get(self.pos).copied()
    }

    fn expression(&mut self) -> Result<f64, ExprError> {
        let mut value = self.term()?;
        while let Some(op @ ('+' | '-')) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == '+' { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    fn term(&mut self) -> Result<f64, ExprError> {
        let mut value = self.factor()?;
        while let Some(op @ ('*' | '/')) = self.peek() {
            self.pos += 1;
            let rhs = self.factor()?;
            value = if op == '*' {
                value * rhs
            } else if rhs == 0.0 {
                return Err(ExprError::DivisionByZero);
            } else {
                value / rhs
            };
        }
        Ok(value)
    }

    /// Run `inner` one nesting level down.
    fn nested<F>(&mut self, inner: F) -> Result<f64, ExprError>
    where
        F: FnOnce(&mut Self) -> Result<f64, ExprError>,
    {
        if self.depth >= MAX_DEPTH {
            return Err(ExprError::TooDeep);
        }
        self.depth += 1;
        let value = inner(self);
        self.depth -= 1;
        value
    }

    fn factor(&mut self) -> Result<f64, ExprError> {
        match self.peek() {
            Some('-') => {
                self.pos += 1;
                Ok(-self.nested(Self::factor)?)
            }
            Some('+') => {
                self.pos += 1;
                self.nested(Self::factor)
            }
            Some('(') => {
                self.pos += 1;
                let value = self.nested(Self::expression)?;
                if self.peek() != Some(')') {
                    return Err(ExprError::Syntax(self.pos));
                }
                self.pos += 1;
                Ok(value)
            }
            Some(c) if c.is_ascii_digit() || c == '.' => self.number(),
            _ => Err(ExprError::Syntax(self.pos)),
        }
    }

    fn number(&mut self) -> Result<f64, ExprError> {
        let start = self.pos;
        while matches!(self.peek(), Some(c) if c.is_ascii_digit() || c == '.') {
            self.pos += 1;
        }
        let literal: String = self.chars[start..self.pos].iter().collect();
        literal.parse().map_err(|_| ExprError::Syntax(start))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Scope {
        levels: Vec<(&'static str, i32)>,
        wis: i32,
    }

    impl StatScope for Scope {
        fn proficiency_bonus(&self) -> i32 {
            crate::ability::proficiency_bonus(self.total_level())
        }

        fn total_level(&self) -> i32 {
            self.levels.iter().map(|(_, l)| l).sum()
        }

        fn class_level(&self, class_name: &str) -> Option<i32> {
            self.levels
                .iter()
                .find(|(name, _)| name.eq_ignore_ascii_case(class_name))
                .map(|(_, l)| *l)
        }

        fn ability_modifier(&self, ability: Ability) -> i32 {
            match ability {
                Ability::Wisdom => self.wis,
                Ability::Strength => -1,
                _ => 0,
            }
        }
    }

    fn rogue_monk() -> Scope {
        Scope {
            levels: vec![("Rogue", 5), ("Monk", 6)],
            wis: 3,
        }
    }

    fn resolve(text: &str) -> String {
        resolve_text(text, &rogue_monk(), &TextContext::new())
    }

    #[test]
    fn test_keywords() {
        assert_eq!(resolve("{{proficiency}}"), "4");
        assert_eq!(resolve("{{characterlevel}}"), "11");
        assert_eq!(resolve("{{level*2}}"), "22");
        assert_eq!(resolve("{{proficiency#signed}}"), "+4");
    }

    #[test]
    fn test_classlevel_priority() {
        let scope = rogue_monk();
        let monk = TextContext::new().with_class("Monk");
        assert_eq!(resolve_text("{{classlevel}}", &scope, &monk), "6");

        let sneak = TextContext::new().with_feature("Sneak Attack");
        assert_eq!(resolve_text("{{classlevel}}", &scope, &sneak), "5");

        assert_eq!(resolve_text("{{classlevel}}", &scope, &TextContext::new()), "11");
    }

    #[test]
    fn test_ability_references() {
        assert_eq!(resolve("{{savedc:wis}}"), "15");
        assert_eq!(resolve("{{modifier:wis#signed}}"), "+3");
        assert_eq!(resolve("{{abilitymod:str}}"), "-1");
        assert_eq!(resolve("{{abilitymod:str#signed}}"), "-1");
        assert_eq!(resolve("{{10+modifier:str}}"), "9");
        assert_eq!(resolve("{{modifier:luck}}"), "{{modifier:luck}}");
    }

    #[test]
    fn test_scale_value() {
        let scope = rogue_monk();
        let sneak = TextContext::new().with_feature("Sneak Attack");
        assert_eq!(resolve_text("{{scalevalue}}", &scope, &sneak), "3d6");
        assert_eq!(
            resolve_text("Martial Arts die: {{scalevalue}}", &scope, &TextContext::new()),
            "Martial Arts die: 1d6"
        );
        assert_eq!(resolve("{{scalevalue}}"), "0");
    }

    #[test]
    fn test_rounding_suffix() {
        assert_eq!(resolve("{{(characterlevel/2)@roundup}}"), "6");
        assert_eq!(resolve("{{(characterlevel/2)@rounddown}}"), "5");
        assert_eq!(resolve("{{characterlevel/2}}"), "5.5");
    }

    #[test]
    fn test_fail_soft() {
        assert_eq!(resolve("Deal {{unknownToken}} damage"), "Deal {{unknownToken}} damage");
        assert_eq!(resolve("{{1/0}}"), "{{1/0}}");
        assert_eq!(resolve("{{(2}}"), "{{(2}}");
        assert_eq!(resolve("no tokens here"), "no tokens here");
    }

    #[test]
    fn test_fail_soft_deep_nesting() {
        let parens = format!("{{{{{}1{}}}}}", "(".repeat(10_000), ")".repeat(10_000));
        assert_eq!(resolve(&parens), parens);

        let signs = format!("{{{{{}1}}}}", "-".repeat(10_000));
        assert_eq!(resolve(&signs), signs);

        let unclosed = format!("{{{{{}1}}}}", "(".repeat(20_000));
        assert_eq!(resolve(&format!("Deal {unclosed} damage")), format!("Deal {unclosed} damage"));
    }

    #[test]
    fn test_evaluate_depth_limit() {
        let ok = format!("{}7{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(evaluate(&ok).unwrap(), 7.0);

        let deep = format!("{}7{}", "(".repeat(MAX_DEPTH + 1), ")".repeat(MAX_DEPTH + 1));
        assert_eq!(evaluate(&deep), Err(ExprError::TooDeep));
        assert_eq!(evaluate(&"-".repeat(MAX_DEPTH + 1)), Err(ExprError::TooDeep));
        assert_eq!(evaluate("--3").unwrap(), 3.0);
    }

    #[test]
    fn test_evaluate_precedence() {
        assert_eq!(evaluate("2+3*4").unwrap(), 14.0);
        assert_eq!(evaluate("(2+3)*4").unwrap(), 20.0);
        assert_eq!(evaluate("10-(-1)").unwrap(), 11.0);
        assert!(matches!(evaluate(""), Err(ExprError::Syntax(0))));
        assert!(matches!(evaluate("2 2"), Err(ExprError::Syntax(_))));
    }
}
