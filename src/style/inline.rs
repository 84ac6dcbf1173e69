//! Parsing of inline `style` attributes into [`StylePatch`]es.

use cssparser::{
    AtRuleParser, CowRcStr, DeclarationParser, ParseError, Parser, ParserInput, ParserState,
    QualifiedRuleParser, RuleBodyItemParser, RuleBodyParser, ToCss, Token,
};

use super::patch::{StylePatch, camel_case_name};

/// Parse a `style` attribute value. Property names come back camelCase;
/// values are kept verbatim (including `!important`). Malformed
/// declarations are dropped.
pub fn parse_inline_style(css: &str) -> StylePatch {
    let mut input = ParserInput::new(css);
    let mut parser = Parser::new(&mut input);
    let mut body = InlineStyleParser;

    let mut patch = StylePatch::new();
    for (name, value) in RuleBodyParser::new(&mut parser, &mut body).flatten() {
        if !value.is_empty() {
            patch.set(name, value);
        }
    }
    patch
}

/// Re-serialize `value` as one declaration value, or `None` when it could
/// leave its declaration: `;`, `!`, braces, bad tokens or markup. Open
/// functions and blocks are closed.
pub fn plain_value(value: &str) -> Option<String> {
    let mut input = ParserInput::new(value);
    let mut parser = Parser::new(&mut input);
    let mut out = String::new();
    write_plain(&mut parser, &mut out).ok()?;
    let out = out.trim();
    if out.is_empty() || out.contains('<') {
        return None;
    }
    Some(out.to_string())
}

fn write_plain(parser: &mut Parser<'_, '_>, out: &mut String) -> Result<(), ()> {
    while let Ok(token) = parser.next_including_whitespace() {
        let token = token.clone();
        match token {
            Token::Function(_) | Token::ParenthesisBlock | Token::SquareBracketBlock => {
                token.to_css(out).map_err(|_| ())?;
                parser
                    .parse_nested_block(|nested| match write_plain(nested, out) {
                        Ok(()) => Ok(()),
                        Err(()) => Err(nested.new_custom_error::<(), ()>(())),
                    })
                    .map_err(|_| ())?;
                out.push(if token == Token::SquareBracketBlock { ']' } else { ')' });
            }
            Token::CurlyBracketBlock
            | Token::CloseCurlyBracket
            | Token::CloseParenthesis
            | Token::CloseSquareBracket
            | Token::Semicolon
            | Token::BadString(_)
            | Token::BadUrl(_)
            | Token::CDO
            | Token::CDC
            | Token::Delim('<' | '>' | '!') => return Err(()),
            _ => token.to_css(out).map_err(|_| ())?,
        }
    }
    Ok(())
}

struct InlineStyleParser;

type Declaration = (String, String);

impl<'i> DeclarationParser<'i> for InlineStyleParser {
    type Declaration = Declaration;
    type Error = ();

    fn parse_value<'t>(
        &mut self,
        name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
        _start: &ParserState,
    ) -> Result<Self::Declaration, ParseError<'i, Self::Error>> {
        let start = input.position();
        while input.next_including_whitespace_and_comments().is_ok() {}
        let value = input.slice_from(start).trim().to_string();
        Ok((camel_case_name(&name), value))
    }
}

impl<'i> AtRuleParser<'i> for InlineStyleParser {
    type Prelude = ();
    type AtRule = Declaration;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        _name: CowRcStr<'i>,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::AtRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> QualifiedRuleParser<'i> for InlineStyleParser {
    type Prelude = ();
    type QualifiedRule = Declaration;
    type Error = ();

    fn parse_prelude<'t>(
        &mut self,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::Prelude, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }

    fn parse_block<'t>(
        &mut self,
        _prelude: Self::Prelude,
        _start: &ParserState,
        input: &mut Parser<'i, 't>,
    ) -> Result<Self::QualifiedRule, ParseError<'i, Self::Error>> {
        Err(input.new_custom_error(()))
    }
}

impl<'i> RuleBodyItemParser<'i, Declaration, ()> for InlineStyleParser {
    fn parse_declarations(&self) -> bool {
        true
    }

    fn parse_qualified(&self) -> bool {
        false
    }
}
