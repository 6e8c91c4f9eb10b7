//! Token kinds, kind sets and the immutable token stream a production is
//! built over.

mod syntax_kind;
mod syntax_set;
mod token_stream;

/// Opaque kind tag shared by tokens and nodes.
pub use syntax_kind::SyntaxKind;
/// Compact set for grouping `SyntaxKind` values.
pub use syntax_set::SyntaxSet;
/// Lexed tokens over a source text.
pub use token_stream::TokenStream;
