//! Property-based tests: random token streams parsed by a small
//! parenthesized-list grammar, with random node shapes and speculative
//! parses that are rolled back.

use proptest::prelude::*;
use tessera_production::{Builder, BuilderConfig, EntryEvent, ProductionResult, TreeEvent};
use tessera_syntax::{SyntaxKind, SyntaxSet, TokenStream};

const IDENT: SyntaxKind = SyntaxKind::new(1);
const WS: SyntaxKind = SyntaxKind::new(2);
const COMMENT: SyntaxKind = SyntaxKind::new(3);
const L_PAREN: SyntaxKind = SyntaxKind::new(4);
const R_PAREN: SyntaxKind = SyntaxKind::new(5);

const FILE: SyntaxKind = SyntaxKind::new(10);
const ITEM: SyntaxKind = SyntaxKind::new(11);
const WRAP: SyntaxKind = SyntaxKind::new(12);
const PAREN: SyntaxKind = SyntaxKind::new(13);
const ERROR: SyntaxKind = SyntaxKind::new(14);

#[derive(Clone, Copy, Debug)]
struct Op {
    speculate: bool,
    shape: u8,
}

struct Parser<'b, 'a> {
    b: &'b mut Builder<'a>,
    ops: &'b [Op],
    next: usize,
    speculation: bool,
}

impl Parser<'_, '_> {
    fn op(&mut self) -> Op {
        let op = self.ops.get(self.next).copied().unwrap_or(Op { speculate: false, shape: 0 });
        self.next += 1;
        op
    }

    fn file(&mut self) {
        let root = self.b.mark();
        self.list(0);
        root.done(self.b, FILE);
    }

    fn list(&mut self, depth: usize) {
        while !self.b.eof() {
            if self.b.at(R_PAREN) {
                if depth > 0 {
                    return;
                }
                let m = self.b.mark();
                self.b.advance();
                m.error(self.b, "unexpected ')'");
                continue;
            }

            let op = self.op();
            if op.speculate && self.speculation {
                let attempt = self.b.mark();
                self.b.advance();
                if !self.b.eof() {
                    self.b.advance();
                }
                self.b.error("speculative");
                attempt.rollback_to(self.b);
            }

            if self.b.at(L_PAREN) {
                self.paren(depth);
            } else {
                self.atom(op.shape);
            }
        }
    }

    fn paren(&mut self, depth: usize) {
        let m = self.b.mark();
        self.b.advance();
        self.list(depth + 1);
        if self.b.at(R_PAREN) {
            self.b.advance();
        } else {
            self.b.error("expected ')'");
        }
        m.done(self.b, PAREN);
    }

    fn atom(&mut self, shape: u8) {
        let m = self.b.mark();
        self.b.advance();
        match shape % 3 {
            0 => {
                m.done(self.b, ITEM);
            }
            1 => {
                let item = m.done(self.b, ITEM);
                item.precede(self.b).done(self.b, WRAP);
            }
            _ => {
                m.collapse(self.b, ITEM);
            }
        }
    }
}

fn parse(tokens: TokenStream, ops: &[Op], speculation: bool) -> ProductionResult {
    let config = BuilderConfig::new(SyntaxSet::new([WS]), ERROR)
        .with_comments(SyntaxSet::new([COMMENT]))
        .with_debug(true);
    let mut b = Builder::new(tokens, config);
    Parser { b: &mut b, ops, next: 0, speculation }.file();
    assert!(b.violations().is_empty(), "{:?}", b.violations());
    b.finish()
}

fn tokens_strategy() -> impl Strategy<Value = TokenStream> {
    let token = prop_oneof![
        Just((IDENT, "x")),
        Just((WS, " ")),
        Just((COMMENT, "#c")),
        Just((L_PAREN, "(")),
        Just((R_PAREN, ")")),
    ];
    prop::collection::vec(token, 0..40).prop_map(TokenStream::from_pieces)
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        (any::<bool>(), any::<u8>()).prop_map(|(speculate, shape)| Op { speculate, shape }),
        0..40,
    )
}

proptest! {
    #[test]
    fn every_token_is_emitted_once_in_order(
        tokens in tokens_strategy(),
        ops in ops_strategy(),
    ) {
        let result = parse(tokens.clone(), &ops, true);

        let mut text = String::new();
        let mut depth = 0i32;
        for event in result.events() {
            match event {
                TreeEvent::Token { range, .. } => text.push_str(&tokens.text()[range]),
                TreeEvent::Enter { .. } => depth += 1,
                TreeEvent::Leave => {
                    depth -= 1;
                    prop_assert!(depth >= 0);
                }
                TreeEvent::Error { .. } => {}
            }
        }
        prop_assert_eq!(depth, 0);
        prop_assert_eq!(text, tokens.text());
    }

    #[test]
    fn balanced_production_is_well_nested(
        tokens in tokens_strategy(),
        ops in ops_strategy(),
    ) {
        let result = parse(tokens, &ops, true);

        let mut previous = 0;
        let mut open = Vec::new();
        for entry in &result {
            let boundary = match entry.event() {
                EntryEvent::Finish => entry.end_token(),
                EntryEvent::Start | EntryEvent::Error => entry.start_token(),
            };
            prop_assert!(boundary >= previous, "{:?}", entry);
            previous = boundary;

            match entry.event() {
                EntryEvent::Start => open.push(entry),
                EntryEvent::Finish => {
                    let start = open.pop();
                    prop_assert_eq!(start.map(|it| it.token_range()), Some(entry.token_range()));
                    prop_assert!(entry.start_token() <= entry.end_token());
                }
                EntryEvent::Error => {}
            }
        }
        prop_assert!(open.is_empty());
    }

    #[test]
    fn rolled_back_speculation_leaves_no_trace(
        tokens in tokens_strategy(),
        ops in ops_strategy(),
    ) {
        let plain = parse(tokens.clone(), &ops, false);
        let speculative = parse(tokens, &ops, true);

        prop_assert_eq!(
            speculative.iter().collect::<Vec<_>>(),
            plain.iter().collect::<Vec<_>>()
        );
        prop_assert_eq!(speculative.collapsed_positions(), plain.collapsed_positions());
    }
}
