//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use super::ast::*;
use super::layout::{layout, Token};
use crate::error::DialectError;

/// Parse Container Linux Config source into an AST
pub fn parse(input: &str) -> Result<Document, Vec<DialectError>> {
    let len = input.len();

    let token_iter = layout(input)?
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| errs.into_iter().map(|e| e.into()).collect())
}

/// Helper to extract span range from chumsky's MapExtra
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Document, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let node = recursive(|node| {
        let key = select! {
            Token::Key(k) => k,
        }
        .map_with(|k, e| Spanned::new(k, span_range(&e.span())));

        // Anything that completes a value on the key's own line
        let inline = select! {
            Token::Scalar(s) => Node::Scalar(s),
            Token::Block(b) => Node::Block(b),
            Token::EmptySequence => Node::Sequence(Vec::new()),
            Token::EmptyMapping => Node::Mapping(Vec::new()),
        }
        .map_with(|n, e| Spanned::new(n, span_range(&e.span())))
        .then_ignore(just(Token::Newline));

        let nested = node
            .clone()
            .delimited_by(just(Token::Indent), just(Token::Dedent));

        // `- value` or `-` followed by an indented block on the next line
        let item = just(Token::Dash).ignore_then(choice((
            nested.clone(),
            just(Token::Newline).ignore_then(nested.clone()),
        )));

        let sequence = item
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map_with(|items, e| Spanned::new(Node::Sequence(items), span_range(&e.span())));

        // A list may sit at the same column as its key
        let value = choice((
            inline.clone(),
            just(Token::Newline).ignore_then(choice((nested.clone(), sequence.clone()))),
            just(Token::Newline).map_with(|_, e| Spanned::new(Node::Null, span_range(&e.span()))),
        ));

        let mapping = key
            .then(value)
            .repeated()
            .at_least(1)
            .collect::<Vec<_>>()
            .map_with(|entries, e| Spanned::new(Node::Mapping(entries), span_range(&e.span())));

        choice((mapping, sequence, inline)).boxed()
    });

    just(Token::DocumentStart)
        .then(just(Token::Newline))
        .or_not()
        .ignore_then(node.or_not())
        .then_ignore(end())
        .map_with(|root, e| Document {
            root: root.unwrap_or_else(|| Spanned::new(Node::Null, span_range(&e.span()))),
        })
}
