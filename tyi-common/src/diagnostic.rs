use crate::src::Span;
use std::fmt;

/// Template identifier of a diagnostic
///
/// The positional arguments of a [`Diagnostic`] are substituted into the
/// template returned by [`DiagnosticKind::template`]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum DiagnosticKind {
    TypeMismatch,
    NoCommonType,
    MemberNotFound,
    NoMatchingOverload,
    AmbiguousOverload,
    CallNonFunction,
    CannotInfer,
    RecursiveType,
    Custom,
}

impl DiagnosticKind {
    pub fn template(self) -> &'static str {
        match self {
            DiagnosticKind::TypeMismatch => "Type mismatch between '{0}' and '{1}'",
            DiagnosticKind::NoCommonType => "No common type between {0}",
            DiagnosticKind::MemberNotFound => "No member named '{0}' in type '{1}'",
            DiagnosticKind::NoMatchingOverload => "No overload of '{0}' accepts arguments ({1})",
            DiagnosticKind::AmbiguousOverload => "Ambiguous call to '{0}', candidates are {1}",
            DiagnosticKind::CallNonFunction => "Type '{0}' cannot be called",
            DiagnosticKind::CannotInfer => "Cannot infer type '{0}'",
            DiagnosticKind::RecursiveType => "Recursive type",
            DiagnosticKind::Custom => "{0}",
        }
    }
}

impl fmt::Display for DiagnosticKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { write!(f, "{:?}", self) }
}

#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    Note,
    Warning,
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Note => write!(f, "note"),
            Severity::Warning => write!(f, "warning"),
            Severity::Error => write!(f, "error"),
        }
    }
}

/// A structured diagnostic, rendering is left to the consumer
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    kind: DiagnosticKind,
    severity: Severity,
    args: Vec<String>,
    spans: Vec<Span>,
    hints: Vec<String>,
}

impl Diagnostic {
    pub fn new(kind: DiagnosticKind) -> Self {
        Self {
            kind,
            severity: Severity::Error,
            args: Vec::new(),
            spans: Vec::new(),
            hints: Vec::new(),
        }
    }

    pub fn custom(msg: String) -> Self { Diagnostic::new(DiagnosticKind::Custom).with_arg(msg) }

    pub fn with_arg(mut self, arg: impl ToString) -> Self {
        self.args.push(arg.to_string());
        self
    }

    pub fn with_span(mut self, span: Span) -> Self {
        if !span.is_none() && !self.spans.contains(&span) {
            self.spans.push(span);
        }
        self
    }

    pub fn with_hint(mut self, hint: String) -> Self {
        self.hints.push(hint);
        self
    }

    pub fn with_severity(mut self, severity: Severity) -> Self {
        self.severity = severity;
        self
    }

    pub fn kind(&self) -> DiagnosticKind { self.kind }

    pub fn severity(&self) -> Severity { self.severity }

    pub fn args(&self) -> &[String] { &self.args }

    pub fn spans(&self) -> &[Span] { &self.spans }

    pub fn hints(&self) -> &[String] { &self.hints }

    /// Expands the template of the diagnostic kind with its arguments
    pub fn message(&self) -> String { expand(self.kind.template(), &self.args) }
}

/// Replaces every `{n}` of `template` with the n-th argument, or `?` when
/// it's missing
fn expand(template: &str, args: &[String]) -> String {
    let mut msg = String::new();
    let mut rest = template;

    while let Some(start) = rest.find('{') {
        msg.push_str(&rest[..start]);

        let end = match rest[start..].find('}') {
            Some(end) => start + end,
            None => {
                rest = &rest[start..];
                break;
            },
        };

        match rest[start + 1..end].parse::<usize>() {
            Ok(pos) => msg.push_str(args.get(pos).map(String::as_str).unwrap_or("?")),
            Err(_) => msg.push_str(&rest[start..=end]),
        }

        rest = &rest[end + 1..];
    }

    msg.push_str(rest);
    msg
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}[{}]: {}", self.severity, self.kind, self.message())
    }
}

/// Diagnostic attached to a constraint, filled in only if the constraint fails
#[derive(Debug, Clone, Default)]
pub struct DiagnosticBuilder {
    span: Span,
    hints: Vec<String>,
    diagnostic: Option<Diagnostic>,
}

impl DiagnosticBuilder {
    pub fn new(span: Span) -> Self {
        DiagnosticBuilder {
            span,
            hints: Vec::new(),
            diagnostic: None,
        }
    }

    pub fn span(&self) -> Span { self.span }

    pub fn add_hint(&mut self, hint: String) { self.hints.push(hint); }

    pub fn is_filled(&self) -> bool { self.diagnostic.is_some() }

    /// Populates the template and arguments of the pending diagnostic
    pub fn fill<I>(&mut self, kind: DiagnosticKind, args: I)
    where
        I: IntoIterator,
        I::Item: ToString,
    {
        let diagnostic = args
            .into_iter()
            .fold(Diagnostic::new(kind), |diagnostic, arg| diagnostic.with_arg(arg))
            .with_span(self.span);

        self.diagnostic = Some(diagnostic);
    }

    pub fn finish(self) -> Option<Diagnostic> {
        let hints = self.hints;

        self.diagnostic
            .map(|diagnostic| hints.into_iter().fold(diagnostic, Diagnostic::with_hint))
    }
}

/// Bag collecting the diagnostics emitted while solving
#[derive(Debug, Default)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self { Diagnostics::default() }

    pub fn push(&mut self, diagnostic: Diagnostic) { self.items.push(diagnostic) }

    pub fn is_empty(&self) -> bool { self.items.is_empty() }

    pub fn len(&self) -> usize { self.items.len() }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> { self.items.iter() }

    pub fn take(&mut self) -> Vec<Diagnostic> { std::mem::take(&mut self.items) }
}

#[cfg(feature = "codespan-reporting")]
mod codespan {
    use super::{Diagnostic, Severity};
    use codespan_reporting::diagnostic::{self, Label};

    impl Diagnostic {
        pub fn codespan_diagnostic<FileId: Copy>(
            self,
            file_id: FileId,
        ) -> diagnostic::Diagnostic<FileId> {
            let severity = match self.severity {
                Severity::Note => diagnostic::Severity::Note,
                Severity::Warning => diagnostic::Severity::Warning,
                Severity::Error => diagnostic::Severity::Error,
            };

            diagnostic::Diagnostic::new(severity)
                .with_message(self.message())
                .with_code(self.kind.to_string())
                .with_labels(
                    self.spans
                        .into_iter()
                        .filter_map(|span| span.as_range())
                        .map(|span| Label::primary(file_id, span))
                        .collect(),
                )
                .with_notes(self.hints)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_expansion() {
        let diagnostic = Diagnostic::new(DiagnosticKind::TypeMismatch)
            .with_arg("Int")
            .with_arg("Bool");

        assert_eq!(diagnostic.message(), "Type mismatch between 'Int' and 'Bool'");
        assert_eq!(
            diagnostic.to_string(),
            "error[TypeMismatch]: Type mismatch between 'Int' and 'Bool'"
        );
    }

    #[test]
    fn missing_argument() {
        let diagnostic = Diagnostic::new(DiagnosticKind::MemberNotFound).with_arg("bar");

        assert_eq!(diagnostic.message(), "No member named 'bar' in type '?'");
    }

    #[test]
    fn unclosed_placeholder_is_kept() {
        let args = vec![String::from("Int")];

        assert_eq!(expand("{0} and {1", &args), "Int and {1");
        assert_eq!(expand("{", &args), "{");
        assert_eq!(expand("{x} {0}", &args), "{x} Int");
    }

    #[test]
    fn builder_is_empty_until_filled() {
        let mut builder = DiagnosticBuilder::new(Span::range(3, 7));
        builder.add_hint(String::from("Specify the type"));

        assert!(!builder.is_filled());
        assert!(builder.clone().finish().is_none());

        builder.fill(DiagnosticKind::CallNonFunction, vec!["Int"]);

        let diagnostic = builder.finish().unwrap();
        assert_eq!(diagnostic.message(), "Type 'Int' cannot be called");
        assert_eq!(diagnostic.spans(), &[Span::range(3, 7)]);
        assert_eq!(diagnostic.hints(), &[String::from("Specify the type")]);
    }
}
