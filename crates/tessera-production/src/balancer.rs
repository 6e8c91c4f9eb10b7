//! Moves node boundaries across whitespace and comments.
//!
//! While parsing, every boundary is recorded at a significant token. Once the
//! production is complete a single forward pass shows each boundary the run
//! of trivia around it and lets its binder choose where the edge goes.

use std::sync::Arc;

use tessera_syntax::TokenStream;

use crate::attributes::Edge;
use crate::binder::{Binder, DefaultRightBinder, TokenRun};
use crate::config::BuilderConfig;
use crate::production::Production;

pub(crate) fn balance(production: &mut Production, tokens: &TokenStream, config: &BuilderConfig) {
    let len = production.len();
    if len < 2 {
        return;
    }

    let point_error: Binder = Arc::new(DefaultRightBinder);
    let token_count = tokens.len() as u32;
    let is_trivia = |index: u32| config.is_trivia(tokens.kind(index as usize));
    let mut last_index = 0;

    for i in 1..len - 1 {
        let entry = production.entry(i);
        let binder = if production.is_error_entry(entry) {
            Arc::clone(&point_error)
        } else {
            let slot = entry.unsigned_abs();
            let (edge, default) = if entry > 0 {
                (Edge::Left, &config.default_left)
            } else {
                (Edge::Right, &config.default_right)
            };
            Arc::clone(production.attributes.binder(slot, edge).unwrap_or(default))
        };
        let recursive = binder.is_recursive();

        let lexeme = production.lexeme_at(i);
        let lower_bound = if recursive { 0 } else { production.lexeme_at(i - 1) };

        let mut ws_start = lexeme.max(last_index).min(token_count);
        while ws_start > lower_bound && is_trivia(ws_start - 1) {
            ws_start -= 1;
        }
        let mut ws_end = ws_start;
        while ws_end < token_count && is_trivia(ws_end) {
            ws_end += 1;
        }

        if ws_start < ws_end {
            let run = TokenRun::new(tokens, ws_start as usize..ws_end as usize, &config.comments);
            let offset = binder.edge_position(&run).min(run.len()) as u32;
            let rebound = ws_start + offset;
            if rebound != lexeme {
                tracing::trace!(entry, from = lexeme, to = rebound, "rebound edge");
            }
            production.set_lexeme_at(i, rebound);
            if recursive {
                production.confine_markers_to_max_lexeme(i, rebound);
            }
        } else if lexeme < ws_start {
            production.set_lexeme_at(i, ws_start);
        }

        last_index = production.lexeme_at(i);
    }
}
