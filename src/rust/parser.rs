// SPDX-License-Identifier: PMPL-1.0-or-later

//! Text syntax for formulas
//!
//! ```text
//! formula    := iff
//! iff        := implies (("<->" | "↔") implies)*
//! implies    := or (("->" | "→" | "=>") implies)?
//! or         := and (("|" | "∨") and)*
//! and        := unary (("&" | "∧") unary)*
//! unary      := ("~" | "¬" | "!") unary | quantified | primary
//! quantified := ("forall" | "∀" | "exists" | "∃") ident+ "." formula
//! primary    := "(" formula ")" | "⊤" | "⊥" | "true" | "false"
//!             | OPERATOR "(" formula ")" | ident "(" term,* ")" | ident
//! ```
//!
//! `OPERATOR` is any word in the modal/temporal/deontic [`Vocabulary`].
//! Term identifiers bound by an enclosing quantifier become [`Term::Var`],
//! all others [`Term::Const`].
//!
//! Input nested deeper than [`MAX_DEPTH`] fails with [`Error::TooDeep`].

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while},
    character::complete::{char, multispace0, satisfy},
    combinator::{all_consuming, map, opt, recognize, value},
    error::ErrorKind,
    multi::{many0, many1, separated_list0},
    sequence::{delimited, pair, preceded},
    IResult,
};
use std::cell::Cell;

use crate::analysis::Vocabulary;
use crate::core::{Formula, Quantifier, Term, MAX_DEPTH};
use crate::error::{Error, Result};

/// Parse a formula using the default operator vocabulary
pub fn parse_formula(input: &str) -> Result<Formula> {
    parse_formula_with(input, &Vocabulary::default())
}

/// Parse a formula, recognising operator words from `vocabulary`
pub fn parse_formula_with(input: &str, vocabulary: &Vocabulary) -> Result<Formula> {
    let parser = FormulaParser {
        vocabulary,
        depth: Cell::new(0),
    };
    let parsed = all_consuming(ws(|i| parser.formula(i)))(input);
    match parsed {
        // Chains of & | <-> fold without recursing, so the tree can still be too deep
        Ok((_, formula)) if formula.depth() > MAX_DEPTH => Err(Error::TooDeep(MAX_DEPTH)),
        Ok((_, formula)) => Ok(bind_variables(formula, &mut Vec::new())),
        Err(nom::Err::Failure(e)) if e.code == ErrorKind::TooLarge => {
            Err(Error::TooDeep(MAX_DEPTH))
        }
        Err(nom::Err::Error(e)) | Err(nom::Err::Failure(e)) => Err(Error::parse(input, e.input)),
        Err(nom::Err::Incomplete(_)) => Err(Error::parse(input, "")),
    }
}

fn too_deep<O>(input: &str) -> IResult<&str, O> {
    Err(nom::Err::Failure(nom::error::Error::new(
        input,
        ErrorKind::TooLarge,
    )))
}

fn ws<'a, O, F>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn identifier(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        satisfy(|c| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '\''),
    ))(input)
}

struct FormulaParser<'v> {
    vocabulary: &'v Vocabulary,
    /// Current recursion depth
    depth: Cell<usize>,
}

impl FormulaParser<'_> {
    /// Run `inner` one level deeper, failing hard past `MAX_DEPTH`
    fn nested<'a, O>(
        &self,
        input: &'a str,
        inner: impl FnOnce(&'a str) -> IResult<&'a str, O>,
    ) -> IResult<&'a str, O> {
        let depth = self.depth.get();
        if depth >= MAX_DEPTH {
            return too_deep(input);
        }
        self.depth.set(depth + 1);
        let result = inner(input);
        self.depth.set(depth);
        result
    }

    /// Left-folding `operands` more times adds that many levels
    fn check_chain<'a>(&self, input: &'a str, operands: usize) -> IResult<&'a str, ()> {
        if self.depth.get() + operands >= MAX_DEPTH {
            return too_deep(input);
        }
        Ok((input, ()))
    }

    fn formula<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, first) = self.implication(input)?;
        let (input, rest) = many0(preceded(
            ws(alt((tag("<->"), tag("↔")))),
            |i| self.implication(i),
        ))(input)?;
        let (input, _) = self.check_chain(input, rest.len())?;
        Ok((input, rest.into_iter().fold(first, Formula::iff)))
    }

    fn implication<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, left) = self.disjunction(input)?;
        let (input, right) = opt(preceded(
            ws(alt((tag("->"), tag("→"), tag("=>")))),
            |i| self.nested(i, |i| self.implication(i)),
        ))(input)?;
        let formula = match right {
            Some(right) => Formula::implies(left, right),
            None => left,
        };
        Ok((input, formula))
    }

    fn disjunction<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, first) = self.conjunction(input)?;
        let (input, rest) = many0(preceded(
            ws(alt((tag("|"), tag("∨")))),
            |i| self.conjunction(i),
        ))(input)?;
        let (input, _) = self.check_chain(input, rest.len())?;
        Ok((input, rest.into_iter().fold(first, Formula::or)))
    }

    fn conjunction<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, first) = self.unary(input)?;
        let (input, rest) = many0(preceded(
            ws(alt((tag("&"), tag("∧")))),
            |i| self.unary(i),
        ))(input)?;
        let (input, _) = self.check_chain(input, rest.len())?;
        Ok((input, rest.into_iter().fold(first, Formula::and)))
    }

    fn unary<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        self.nested(input, |input| {
            alt((
                map(
                    preceded(ws(alt((tag("~"), tag("¬"), tag("!")))), |i| self.unary(i)),
                    Formula::not,
                ),
                |i| self.quantified(i),
                |i| self.primary(i),
            ))(input)
        })
    }

    fn quantified<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, quantifier) = ws(alt((
            value(Quantifier::Forall, alt((tag("forall"), tag("∀")))),
            value(Quantifier::Exists, alt((tag("exists"), tag("∃")))),
        )))(input)?;
        let (input, variables) = many1(ws(identifier))(input)?;
        let (input, _) = ws(char('.'))(input)?;
        let (input, body) = self.formula(input)?;

        let formula = variables
            .into_iter()
            .rev()
            .fold(body, |acc, variable| Formula::Quantified {
                quantifier,
                variable: variable.to_string(),
                body: Box::new(acc),
            });
        Ok((input, formula))
    }

    fn primary<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        alt((
            delimited(ws(char('(')), |i| self.formula(i), ws(char(')'))),
            value(Formula::True, ws(tag("⊤"))),
            value(Formula::False, ws(tag("⊥"))),
            |i| self.named(i),
        ))(input)
    }

    /// Constants, operator applications, predicates and atoms
    fn named<'a>(&self, input: &'a str) -> IResult<&'a str, Formula> {
        let (input, name) = ws(identifier)(input)?;
        match name {
            "true" => return Ok((input, Formula::True)),
            "false" => return Ok((input, Formula::False)),
            _ => {}
        }

        if self.vocabulary.family(name).is_some() {
            let operator_body: IResult<&'a str, Formula> =
                delimited(ws(char('(')), |i| self.formula(i), ws(char(')')))(input);
            match operator_body {
                Ok((rest, body)) => return Ok((rest, Formula::operator(name, body))),
                Err(failure @ nom::Err::Failure(_)) => return Err(failure),
                Err(_) => {}
            }
        }

        let (input, args) = opt(delimited(
            ws(char('(')),
            separated_list0(ws(char(',')), |i| self.term(i)),
            ws(char(')')),
        ))(input)?;
        Ok((input, Formula::predicate(name, args.unwrap_or_default())))
    }

    fn term<'a>(&self, input: &'a str) -> IResult<&'a str, Term> {
        self.nested(input, |input| {
            let (input, name) = ws(identifier)(input)?;
            let (input, args) = opt(delimited(
                ws(char('(')),
                separated_list0(ws(char(',')), |i| self.term(i)),
                ws(char(')')),
            ))(input)?;
            let term = match args {
                Some(args) => Term::App {
                    func: name.to_string(),
                    args,
                },
                None => Term::Const(name.to_string()),
            };
            Ok((input, term))
        })
    }
}

fn bind_variables(formula: Formula, scope: &mut Vec<String>) -> Formula {
    match formula {
        Formula::Predicate { name, args } => Formula::Predicate {
            name,
            args: args.into_iter().map(|t| bind_term(t, scope)).collect(),
        },
        Formula::Not(inner) => Formula::not(bind_variables(*inner, scope)),
        Formula::Binary { op, left, right } => {
            let left = bind_variables(*left, scope);
            let right = bind_variables(*right, scope);
            Formula::binary(op, left, right)
        }
        Formula::Quantified {
            quantifier,
            variable,
            body,
        } => {
            scope.push(variable.clone());
            let body = bind_variables(*body, scope);
            scope.pop();
            Formula::Quantified {
                quantifier,
                variable,
                body: Box::new(body),
            }
        }
        Formula::Operator { name, body } => Formula::operator(name, bind_variables(*body, scope)),
        constant => constant,
    }
}

fn bind_term(term: Term, scope: &[String]) -> Term {
    match term {
        Term::Const(name) if scope.contains(&name) => Term::Var(name),
        Term::App { func, args } => Term::App {
            func,
            args: args.into_iter().map(|t| bind_term(t, scope)).collect(),
        },
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Connective;

    #[test]
    fn test_parse_implication() {
        let f = parse_formula("P -> P").unwrap();
        assert_eq!(f, Formula::implies(Formula::atom("P"), Formula::atom("P")));
    }

    #[test]
    fn test_implication_is_right_associative() {
        let f = parse_formula("P -> Q -> R").unwrap();
        assert_eq!(
            f,
            Formula::implies(
                Formula::atom("P"),
                Formula::implies(Formula::atom("Q"), Formula::atom("R"))
            )
        );
    }

    #[test]
    fn test_precedence() {
        let f = parse_formula("~P & Q | R").unwrap();
        assert_eq!(
            f,
            Formula::or(
                Formula::and(Formula::not(Formula::atom("P")), Formula::atom("Q")),
                Formula::atom("R")
            )
        );
    }

    #[test]
    fn test_parse_quantifiers_bind_variables() {
        let f = parse_formula("forall x. Human(x) -> Mortal(x)").unwrap();
        match &f {
            Formula::Quantified { quantifier, variable, body } => {
                assert_eq!(*quantifier, Quantifier::Forall);
                assert_eq!(variable, "x");
                match body.as_ref() {
                    Formula::Binary { op, left, .. } => {
                        assert_eq!(*op, Connective::Implies);
                        assert_eq!(**left, Formula::predicate("Human", vec![Term::var("x")]));
                    }
                    other => panic!("unexpected body {:?}", other),
                }
            }
            other => panic!("unexpected formula {:?}", other),
        }
    }

    #[test]
    fn test_multiple_quantified_variables() {
        let f = parse_formula("∃x y. Loves(x, y)").unwrap();
        assert_eq!(
            f,
            Formula::exists(
                "x",
                Formula::exists("y", Formula::predicate("Loves", vec![Term::var("x"), Term::var("y")]))
            )
        );
    }

    #[test]
    fn test_free_terms_are_constants() {
        let f = parse_formula("Loves(alice, mother(bob))").unwrap();
        assert_eq!(
            f,
            Formula::predicate(
                "Loves",
                vec![
                    Term::constant("alice"),
                    Term::App { func: "mother".to_string(), args: vec![Term::constant("bob")] },
                ]
            )
        );
    }

    #[test]
    fn test_operator_words_wrap_formulas() {
        let f = parse_formula("Always(P -> Eventually(Q))").unwrap();
        assert_eq!(
            f,
            Formula::operator(
                "Always",
                Formula::implies(Formula::atom("P"), Formula::operator("Eventually", Formula::atom("Q")))
            )
        );
    }

    #[test]
    fn test_display_round_trip() {
        for text in [
            "P -> P",
            "(P & Q) <-> ~(~P | ~Q)",
            "forall x. exists y. R(x, y) & ~Q(y)",
            "Obligatory(Pay) -> Permitted(Pay)",
            "~(forall x. P(x)) | true",
        ] {
            let parsed = parse_formula(text).unwrap();
            let reparsed = parse_formula(&parsed.to_string()).unwrap();
            assert_eq!(parsed, reparsed, "round trip failed for {}", text);
        }
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_formula("").is_err());
        assert!(parse_formula("P ->").is_err());
        assert!(parse_formula("(P & Q").is_err());
        let err = parse_formula("P & & Q").unwrap_err();
        assert!(matches!(err, Error::Parse { .. }));
    }

    #[test]
    fn test_nesting_limit() {
        let at_limit = format!("{}P", "~".repeat(MAX_DEPTH - 1));
        assert_eq!(parse_formula(&at_limit).unwrap().depth(), MAX_DEPTH);

        let past_limit = format!("{}P", "~".repeat(MAX_DEPTH));
        assert!(matches!(parse_formula(&past_limit), Err(Error::TooDeep(MAX_DEPTH))));
    }

    #[test]
    fn test_deep_input_fails_without_overflowing() {
        let negations = format!("{}P", "~".repeat(10_000));
        let parens = format!("{}P{}", "(".repeat(10_000), ")".repeat(10_000));
        let implications = vec!["P"; 10_000].join(" -> ");
        let conjunctions = vec!["P"; 10_000].join(" & ");
        let terms = format!("R({}x{})", "f(".repeat(10_000), ")".repeat(10_000));
        for text in [negations, parens, implications, conjunctions, terms] {
            assert!(matches!(parse_formula(&text), Err(Error::TooDeep(_))));
        }
    }
}
