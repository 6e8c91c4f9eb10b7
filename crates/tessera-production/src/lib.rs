//! An incremental, backtrackable builder of syntax-tree productions.
//!
//! A recursive-descent parser walks a [`TokenStream`](tessera_syntax::TokenStream)
//! through a [`Builder`], opening and closing [`Marker`]s around the nodes it
//! recognizes. Markers can be rolled back, dropped, preceded by new parents
//! or closed before a later marker. Whitespace and comments are ignored while
//! parsing; where they end up is decided once at the end by the
//! [`EdgeBinder`]s of each boundary.

mod arena;
mod attributes;
mod balancer;
mod binder;
mod builder;
mod cancel;
mod config;
mod cursor;
mod marker;
mod production;
mod result;
mod violation;


pub use arena::MarkerId;
pub use binder::{
    Binder, DefaultLeftBinder, DefaultRightBinder, EdgeBinder, GreedyLeftBinder,
    GreedyRightBinder, LeadingCommentsBinder, Recursive, TokenRun, TrailingCommentsBinder,
};
pub use builder::Builder;
pub use cancel::Cancelled;
pub use config::BuilderConfig;
pub use cursor::TokenRemapper;
pub use marker::{CompletedMarker, Marker, MarkerRef};
pub use result::{EntryEvent, ProductionEntry, ProductionResult, TreeEvent};
pub use violation::Violation;
