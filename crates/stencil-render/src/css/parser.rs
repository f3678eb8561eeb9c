//! Stylesheet parsing.
//!
//! Built on `cssparser`, which handles tokenizing, comments, escapes and
//! block nesting. Selectors, at-rule preludes and declaration values are
//! kept as the trimmed source text they were written with; only the rule
//! structure is interpreted.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, ParseErrorKind, Parser, ParserInput,
    ParserState, QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser,
};

use super::{AtRule, CssRule, Declaration, GroupRule, StyleRule, Stylesheet, GROUPING_AT_RULES};
use crate::error::RenderError;

/// Parses stylesheet text.
///
/// Fails with [`RenderError::CssParse`] on the first invalid rule, carrying
/// the complete stylesheet text and the parser diagnostic.
pub fn parse_stylesheet(css: &str) -> Result<Stylesheet, RenderError> {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut rule_parser = RuleParser;

    let mut rules = Vec::new();
    for result in cssparser::StyleSheetParser::new(&mut parser, &mut rule_parser) {
        match result {
            Ok(rule) => rules.push(rule),
            Err((error, slice)) => {
                return Err(RenderError::CssParse {
                    css: css.to_string(),
                    reason: describe(&error, slice),
                })
            }
        }
    }
    Ok(Stylesheet::new(rules))
}

fn describe(error: &ParseError<'_, ()>, slice: &str) -> String {
    let kind = match &error.kind {
        ParseErrorKind::Basic(basic) => format!("{:?}", basic),
        ParseErrorKind::Custom(()) => "invalid rule".to_string(),
    };
    format!(
        "{} at {}:{} near `{}`",
        kind,
        error.location.line + 1,
        error.location.column,
        slice.trim()
    )
}

/// Consumes the rest of `input` and returns it as trimmed source text.
fn remaining_text<'i>(input: &mut Parser<'i, '_>) -> String {
    let start = input.position();
    while input.next().is_ok() {}
    input.slice_from(start).trim().to_string()
}

struct RuleParser;

impl<'i> QualifiedRuleParser<'i> for RuleParser {
    type Prelude = Vec<String>;
    type QualifiedRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        input.parse_comma_separated(|input| {
            let selector = remaining_text(input);
            if selector.is_empty() {
                return Err(input.new_custom_error::<(), ()>(()));
            }
            Ok(selector)
        })
    }

    fn parse_block<'t>(
        &mut self,
        selectors: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        let mut decl_parser = DeclarationListParser;
        let body = RuleBodyParser::new(input, &mut decl_parser);
        let declarations = body.flatten().collect();
        Ok(CssRule::Style(StyleRule {
            selectors,
            declarations,
        }))
    }
}

impl<'i> AtRuleParser<'i> for RuleParser {
    type Prelude = (String, String);
    type AtRule = CssRule;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Ok((name.as_ref().to_string(), remaining_text(input)))
    }

    fn rule_without_block(
        &mut self,
        (name, prelude): Self::Prelude,
        _start: &ParserState,
    ) -> Result<Self::AtRule, ()> {
        Ok(CssRule::Verbatim(AtRule {
            name,
            prelude,
            block: None,
        }))
    }

    fn parse_block<'t>(
        &mut self,
        (name, prelude): Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        if !GROUPING_AT_RULES.contains(&name.to_ascii_lowercase().as_str()) {
            let block = remaining_text(input);
            return Ok(CssRule::Verbatim(AtRule {
                name,
                prelude,
                block: Some(block),
            }));
        }

        let mut rules = Vec::new();
        for result in cssparser::StyleSheetParser::new(input, self) {
            match result {
                Ok(rule) => rules.push(rule),
                Err((error, _)) => return Err(error),
            }
        }
        Ok(CssRule::Group(GroupRule {
            name,
            prelude,
            rules,
        }))
    }
}

struct DeclarationListParser;

impl<'i> DeclarationParser<'i> for DeclarationListParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let value = remaining_text(input);
        if value.is_empty() {
            return Err(input.new_custom_error::<(), ()>(()));
        }
        Ok(Declaration {
            name: name.as_ref().to_string(),
            value,
        })
    }
}

impl<'i> AtRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();
}

impl<'i> QualifiedRuleParser<'i> for DeclarationListParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for DeclarationListParser {
    fn parse_declarations(&self) -> bool {
        true
    }
    fn parse_qualified(&self) -> bool {
        false
    }
}
