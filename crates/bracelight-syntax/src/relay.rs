//! Parse error relay.
//!
//! Recognition errors reach the owning parser along two paths:
//!
//! ```text
//!  ErrorProvidingParser::parse ──► display_recognition_error ──┐
//!                                                              ├──► ParseErrorEvent
//!  ErrorProvidingParser::report ──► DiagnosticListener::error ─┘
//!                                   (ErrorListener: token → stream → parser)
//! ```
//!
//! An event is only raised when the offending token carries a position
//! in the source text. Every missing link on the listener path drops
//! the message silently.
//!
//! ## Learning: Weak References
//!
//! A [`TokenStream`] points back at the parser that owns it. Holding a
//! strong `Arc` there would form a cycle; `Weak` breaks it, and
//! `Weak::upgrade` tells the listener whether the parser still exists.

use std::fmt;
use std::sync::{Arc, Weak};

use bracelight_buffer::{Snapshot, Span};
use bracelight_core::EventBus;
use parking_lot::Mutex;
use tokio::sync::broadcast;
use tree_sitter::{Node, Parser};

use crate::{SyntaxError, new_parser};

/// Longest token text shown in a message.
const MAX_TOKEN_DISPLAY: usize = 32;

/// A syntax error located in the source text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseErrorEvent {
    pub message: String,
    pub span: Span,
}

/// The token a recognition error points at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    /// 1-indexed
    pub line: usize,
    /// 0-indexed, in characters
    pub column: usize,
    /// Character span in the source, when known.
    pub span: Option<Span>,
}

impl Token {
    pub fn new(text: impl Into<String>, line: usize, column: usize) -> Self {
        Self {
            text: text.into(),
            line,
            column,
            span: None,
        }
    }

    pub fn with_span(mut self, span: Span) -> Self {
        self.span = Some(span);
        self
    }

    /// Quoted, escaped and truncated token text.
    fn display(&self) -> String {
        let mut shown = String::new();
        for (i, c) in self.text.chars().enumerate() {
            if i == MAX_TOKEN_DISPLAY {
                shown.push_str("...");
                break;
            }
            match c {
                '\n' => shown.push_str("\\n"),
                '\r' => shown.push_str("\\r"),
                '\t' => shown.push_str("\\t"),
                c => shown.push(c),
            }
        }
        format!("'{shown}'")
    }
}

/// Source text tokens are drawn from, tied to the parser reading it.
#[derive(Debug)]
pub struct TokenStream {
    snapshot: Snapshot,
    parser: Weak<ErrorProvidingParser>,
}

impl TokenStream {
    /// A stream no parser owns.
    pub fn detached(snapshot: Snapshot) -> Self {
        Self {
            snapshot,
            parser: Weak::new(),
        }
    }

    pub fn snapshot(&self) -> &Snapshot {
        &self.snapshot
    }

    /// The owning parser, if it is still alive.
    pub fn parser(&self) -> Option<Arc<ErrorProvidingParser>> {
        self.parser.upgrade()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Input the grammar cannot place.
    UnexpectedInput,
    /// The recognizer inserted a token that was not in the source.
    MissingToken { expected: String },
}

/// An error raised while recognizing input.
#[derive(Debug, Clone)]
pub struct RecognitionError {
    pub kind: RecognitionErrorKind,
    /// 1-indexed
    pub line: usize,
    /// 0-indexed, in characters
    pub column: usize,
    pub token: Option<Token>,
    pub input: Option<Arc<TokenStream>>,
}

impl RecognitionError {
    /// Location prefix, e.g. `line 3:14`.
    pub fn header(&self) -> String {
        format!("line {}:{}", self.line, self.column)
    }

    pub fn message(&self) -> String {
        match (&self.kind, &self.token) {
            (RecognitionErrorKind::UnexpectedInput, Some(token)) => {
                format!("no viable alternative at input {}", token.display())
            }
            (RecognitionErrorKind::UnexpectedInput, None) => "no viable alternative".to_string(),
            (RecognitionErrorKind::MissingToken { expected }, _) => {
                format!("missing '{expected}'")
            }
        }
    }
}

impl fmt::Display for RecognitionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.header(), self.message())
    }
}

/// Grammar-level syntax error handed to diagnostic listeners.
#[derive(Debug, Clone)]
pub struct GrammarSyntaxMessage {
    pub offending_token: Option<Token>,
    pub error: RecognitionError,
}

impl GrammarSyntaxMessage {
    pub fn new(error: RecognitionError) -> Self {
        Self {
            offending_token: error.token.clone(),
            error,
        }
    }
}

impl fmt::Display for GrammarSyntaxMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: syntax error: {}",
            self.error.header(),
            self.error.message()
        )
    }
}

/// A diagnostic routed to listeners.
#[derive(Debug, Clone)]
pub enum Message {
    GrammarSyntax(GrammarSyntaxMessage),
    /// Any other diagnostic, already formatted.
    Other(String),
}

impl fmt::Display for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Message::GrammarSyntax(message) => fmt::Display::fmt(message, f),
            Message::Other(text) => f.write_str(text),
        }
    }
}

/// A failure of the tooling itself rather than of the input.
#[derive(Debug, Clone)]
pub struct ToolMessage(pub String);

/// Receives diagnostics produced while checking a grammar's input.
pub trait DiagnosticListener: Send + Sync {
    fn error(&self, message: &Message);
    fn tool_error(&self, message: &ToolMessage);
    fn warning(&self, message: &Message);
    fn info(&self, message: &str);
}

/// Forwards grammar syntax errors to the parser that produced them.
///
/// Other diagnostics are ignored.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorListener;

impl ErrorListener {
    fn relay(message: &GrammarSyntaxMessage) -> Option<()> {
        let token = message.offending_token.as_ref()?;
        let stream = message.error.input.as_ref()?;
        let parser = stream.parser()?;
        let span = token.span?;
        parser.on_parse_error(ParseErrorEvent {
            message: message.to_string(),
            span,
        });
        Some(())
    }
}

impl DiagnosticListener for ErrorListener {
    fn error(&self, message: &Message) {
        if let Message::GrammarSyntax(message) = message {
            if Self::relay(message).is_none() {
                tracing::trace!("dropped unlocated syntax error: {}", message);
            }
        }
    }

    fn tool_error(&self, _message: &ToolMessage) {}

    fn warning(&self, _message: &Message) {}

    fn info(&self, _message: &str) {}
}

/// A parser that publishes its syntax errors as [`ParseErrorEvent`]s.
pub struct ErrorProvidingParser {
    language: String,
    parser: Mutex<Parser>,
    events: EventBus<ParseErrorEvent>,
    this: Weak<ErrorProvidingParser>,
}

impl ErrorProvidingParser {
    pub fn new(lang: &str) -> Result<Arc<Self>, SyntaxError> {
        let parser = new_parser(lang)?;
        Ok(Arc::new_cyclic(|this| Self {
            language: lang.to_string(),
            parser: Mutex::new(parser),
            events: EventBus::new(),
            this: this.clone(),
        }))
    }

    pub fn language(&self) -> &str {
        &self.language
    }

    pub fn subscribe(&self) -> broadcast::Receiver<ParseErrorEvent> {
        self.events.subscribe()
    }

    /// A stream over `snapshot` owned by this parser.
    pub fn token_stream(&self, snapshot: Snapshot) -> Arc<TokenStream> {
        Arc::new(TokenStream {
            snapshot,
            parser: self.this.clone(),
        })
    }

    /// Parses `snapshot`, displaying and returning every recognition error.
    pub fn parse(&self, snapshot: &Snapshot) -> Result<Vec<RecognitionError>, SyntaxError> {
        let errors = self.recognize(snapshot)?;
        for error in &errors {
            self.display_recognition_error(error);
        }
        Ok(errors)
    }

    /// Parses `snapshot` and hands each error to `listener`.
    pub fn report(
        &self,
        snapshot: &Snapshot,
        listener: &dyn DiagnosticListener,
    ) -> Result<usize, SyntaxError> {
        let errors = self.recognize(snapshot)?;
        let count = errors.len();
        for error in errors {
            listener.error(&Message::GrammarSyntax(GrammarSyntaxMessage::new(error)));
        }
        Ok(count)
    }

    /// Raises an event for `error` when its token is located, then logs it.
    pub fn display_recognition_error(&self, error: &RecognitionError) {
        let message = error.message();
        if let Some(span) = error.token.as_ref().and_then(|token| token.span) {
            self.on_parse_error(ParseErrorEvent {
                message: message.clone(),
                span,
            });
        }
        tracing::debug!(language = %self.language, "{} {}", error.header(), message);
    }

    pub fn on_parse_error(&self, event: ParseErrorEvent) {
        self.events.emit(event);
    }

    /// Collects recognition errors without reporting them.
    pub fn recognize(&self, snapshot: &Snapshot) -> Result<Vec<RecognitionError>, SyntaxError> {
        let source = snapshot.text();
        let tree = self
            .parser
            .lock()
            .parse(source.as_bytes(), None)
            .ok_or(SyntaxError::ParseError)?;

        let stream = self.token_stream(snapshot.clone());
        let mut errors = Vec::new();
        collect_errors(tree.root_node(), source.as_bytes(), &stream, &mut errors)?;
        Ok(errors)
    }
}

impl fmt::Debug for ErrorProvidingParser {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ErrorProvidingParser")
            .field("language", &self.language)
            .finish_non_exhaustive()
    }
}

/// Walks `node` for ERROR and MISSING nodes, in document order.
fn collect_errors(
    node: Node,
    source: &[u8],
    stream: &Arc<TokenStream>,
    errors: &mut Vec<RecognitionError>,
) -> Result<(), SyntaxError> {
    let kind = if node.is_missing() {
        Some(RecognitionErrorKind::MissingToken {
            expected: node.kind().to_string(),
        })
    } else if node.is_error() {
        Some(RecognitionErrorKind::UnexpectedInput)
    } else {
        None
    };

    if let Some(kind) = kind {
        errors.push(recognition_error(node, kind, source, stream)?);
        return Ok(());
    }

    if node.has_error() {
        let mut cursor = node.walk();
        for child in node.children(&mut cursor) {
            collect_errors(child, source, stream, errors)?;
        }
    }
    Ok(())
}

fn recognition_error(
    node: Node,
    kind: RecognitionErrorKind,
    source: &[u8],
    stream: &Arc<TokenStream>,
) -> Result<RecognitionError, SyntaxError> {
    let snapshot = stream.snapshot();
    let start = snapshot.byte_to_char(node.start_byte())?;
    let end = snapshot.byte_to_char(node.end_byte())?;
    let position = snapshot.offset_to_position(start)?;

    let text = node.utf8_text(source).unwrap_or_default();
    let token = Token::new(text, position.line + 1, position.column)
        .with_span(Span::from_bounds(start, end));

    Ok(RecognitionError {
        kind,
        line: token.line,
        column: token.column,
        token: Some(token),
        input: Some(Arc::clone(stream)),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::sync::broadcast::error::TryRecvError;

    fn located_error(stream: Option<Arc<TokenStream>>, span: Option<Span>) -> RecognitionError {
        let mut token = Token::new("}", 2, 4);
        token.span = span;
        RecognitionError {
            kind: RecognitionErrorKind::UnexpectedInput,
            line: 2,
            column: 4,
            token: Some(token),
            input: stream,
        }
    }

    #[test]
    fn test_valid_input_has_no_errors() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let mut events = parser.subscribe();

        let errors = parser.parse(&Snapshot::from_text("fn main() {}\n")).unwrap();
        assert!(errors.is_empty());
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_parse_emits_located_events() {
        let parser = ErrorProvidingParser::new("json").unwrap();
        let mut events = parser.subscribe();
        let text = "{\"a\": [1, 2}";

        let errors = parser.parse(&Snapshot::from_text(text)).unwrap();
        assert!(!errors.is_empty());

        let event = events.try_recv().unwrap();
        assert!(event.span.end <= text.chars().count());
        assert_eq!(event.message, errors[0].message());
    }

    #[test]
    fn test_errors_carry_positions() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let errors = parser
            .recognize(&Snapshot::from_text("fn main() {\n    let x = ;\n}\n"))
            .unwrap();

        assert!(!errors.is_empty());
        for error in &errors {
            assert!(error.header().starts_with("line "));
            assert!(error.token.as_ref().unwrap().span.is_some());
            assert!(error.input.is_some());
        }
    }

    #[test]
    fn test_display_without_span_logs_only() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let mut events = parser.subscribe();

        parser.display_recognition_error(&located_error(None, None));
        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));

        let span = Span::from_bounds(10, 11);
        parser.display_recognition_error(&located_error(None, Some(span)));
        let event = events.try_recv().unwrap();
        assert_eq!(event.span, span);
        assert_eq!(event.message, "no viable alternative at input '}'");
    }

    #[test]
    fn test_listener_relays_to_owning_parser() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let mut events = parser.subscribe();
        let stream = parser.token_stream(Snapshot::from_text("fn f() }"));
        let span = Span::from_bounds(7, 8);

        let message = GrammarSyntaxMessage::new(located_error(Some(stream), Some(span)));
        ErrorListener.error(&Message::GrammarSyntax(message.clone()));

        let event = events.try_recv().unwrap();
        assert_eq!(event.span, span);
        assert_eq!(event.message, message.to_string());
        assert!(event.message.starts_with("line 2:4: syntax error:"));
    }

    #[test]
    fn test_listener_drops_incomplete_messages() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let mut events = parser.subscribe();
        let span = Some(Span::from_bounds(0, 1));
        let stream = || Some(parser.token_stream(Snapshot::from_text("}")));

        // no token
        let mut error = located_error(stream(), span);
        error.token = None;
        ErrorListener.error(&Message::GrammarSyntax(GrammarSyntaxMessage::new(error)));

        // no input stream
        let message = GrammarSyntaxMessage::new(located_error(None, span));
        ErrorListener.error(&Message::GrammarSyntax(message));

        // stream without an owning parser
        let detached = Arc::new(TokenStream::detached(Snapshot::from_text("}")));
        let message = GrammarSyntaxMessage::new(located_error(Some(detached), span));
        ErrorListener.error(&Message::GrammarSyntax(message));

        // token without a span
        let message = GrammarSyntaxMessage::new(located_error(stream(), None));
        ErrorListener.error(&Message::GrammarSyntax(message));

        // not a grammar syntax message
        ErrorListener.error(&Message::Other("grammar has no rules".to_string()));
        ErrorListener.warning(&Message::Other("unused rule".to_string()));
        ErrorListener.tool_error(&ToolMessage("cannot write output".to_string()));
        ErrorListener.info("done");

        assert_eq!(events.try_recv(), Err(TryRecvError::Empty));
    }

    #[test]
    fn test_stream_outliving_parser_is_dropped() {
        let parser = ErrorProvidingParser::new("rust").unwrap();
        let stream = parser.token_stream(Snapshot::from_text("}"));
        assert!(stream.parser().is_some());

        drop(parser);
        assert!(stream.parser().is_none());

        let message = GrammarSyntaxMessage::new(located_error(
            Some(stream),
            Some(Span::from_bounds(0, 1)),
        ));
        // nothing to relay to, and no panic
        ErrorListener.error(&Message::GrammarSyntax(message));
    }

    #[test]
    fn test_report_routes_through_listener() {
        let parser = ErrorProvidingParser::new("python").unwrap();
        let mut events = parser.subscribe();

        let count = parser
            .report(&Snapshot::from_text("def f(:\n    pass\n"), &ErrorListener)
            .unwrap();
        assert!(count > 0);

        let event = events.try_recv().unwrap();
        assert!(event.message.contains("syntax error"));
    }

    #[test]
    fn test_token_display_is_escaped_and_truncated() {
        let token = Token::new("a\tb\n", 1, 0);
        assert_eq!(token.display(), "'a\\tb\\n'");

        let long = Token::new("x".repeat(40), 1, 0);
        assert_eq!(long.display(), format!("'{}...'", "x".repeat(32)));
    }
}
