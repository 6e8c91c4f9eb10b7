use tessera_syntax::SyntaxKind;

/// Misuse of the builder API by the parser on top of it.
///
/// Violations never abort the build: they are logged at error severity and
/// collected in [`Builder::violations`](crate::Builder::violations).
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
pub enum Violation {
    #[error("another not done marker was added after this one; it must be done first")]
    UnclosedChild,
    #[error("'before' marker precedes the marker being done")]
    BeforePrecedesMarker,
    #[error("a marker starts before and finishes inside the marker being done")]
    CrossingMarkers,
    #[error("marker dropped while markers added after it are still open")]
    DropWithOpenChildren,
    #[error("parser produced no markers")]
    EmptyProduction,
    #[error(
        "unbalanced tree; most probably caused by unbalanced markers, \
         enable debug mode to find the exact location"
    )]
    Unbalanced,
    #[error("tokens {kinds:?} were not inserted into the tree")]
    TokensNotInserted { kinds: Vec<SyntaxKind> },
    #[error("tokens {kinds:?} are outside of root element {root:?}")]
    TokensOutsideRoot { kinds: Vec<SyntaxKind>, root: SyntaxKind },
}
