use drop_bomb::DropBomb;
use tessera_syntax::SyntaxKind;

use crate::arena::MarkerId;
use crate::binder::Binder;
use crate::builder::Builder;

/// Anything that names a marker of a [`Builder`].
pub trait MarkerRef {
    fn id(&self) -> MarkerId;
}

impl MarkerRef for MarkerId {
    fn id(&self) -> MarkerId {
        *self
    }
}

/// An open node boundary. It must be finished with one of the consuming
/// methods before it goes out of scope.
pub struct Marker {
    id: MarkerId,
    bomb: DropBomb,
}

impl Marker {
    pub(crate) fn new(id: MarkerId) -> Self {
        Self { id, bomb: DropBomb::new("Marker must be either completed or abandoned") }
    }

    fn defuse(mut self) -> MarkerId {
        self.bomb.defuse();
        self.id
    }

    /// Closes the node at the current token.
    pub fn done(self, b: &mut Builder<'_>, kind: SyntaxKind) -> CompletedMarker {
        let id = self.defuse();
        b.close(id, kind, None, None);
        CompletedMarker::new(id, kind)
    }

    /// Closes the node and marks it as a single leaf in the final tree.
    pub fn collapse(self, b: &mut Builder<'_>, kind: SyntaxKind) -> CompletedMarker {
        let id = self.defuse();
        b.collapse(id, kind);
        CompletedMarker::new(id, kind)
    }

    /// Closes the node as an error node carrying `message`.
    pub fn error(self, b: &mut Builder<'_>, message: impl Into<Box<str>>) -> CompletedMarker {
        let id = self.defuse();
        let kind = b.config().error_kind();
        b.close(id, kind, None, Some(message.into()));
        CompletedMarker::new(id, kind)
    }

    /// Closes the node right before `before` starts.
    pub fn done_before(
        self,
        b: &mut Builder<'_>,
        kind: SyntaxKind,
        before: &impl MarkerRef,
    ) -> CompletedMarker {
        let id = self.defuse();
        b.close(id, kind, Some(before.id()), None);
        CompletedMarker::new(id, kind)
    }

    pub fn error_before(
        self,
        b: &mut Builder<'_>,
        message: impl Into<Box<str>>,
        before: &impl MarkerRef,
    ) -> CompletedMarker {
        let id = self.defuse();
        let kind = b.config().error_kind();
        b.close(id, kind, Some(before.id()), Some(message.into()));
        CompletedMarker::new(id, kind)
    }

    /// Opens a new marker that starts where this one does and encloses it.
    #[track_caller]
    pub fn precede(&self, b: &mut Builder<'_>) -> Self {
        b.precede(self.id)
    }

    /// Forgets this marker; markers created after it stay in place.
    pub fn drop(self, b: &mut Builder<'_>) {
        let id = self.defuse();
        b.drop_marker(id);
    }

    /// Forgets this marker and everything recorded after it, and moves the
    /// cursor back to where it was created.
    pub fn rollback_to(self, b: &mut Builder<'_>) {
        let id = self.defuse();
        b.rollback_to(id);
    }

    pub fn set_edge_binders(
        &self,
        b: &mut Builder<'_>,
        left: Option<Binder>,
        right: Option<Binder>,
    ) {
        b.set_edge_binders(self, left, right);
    }
}

impl MarkerRef for Marker {
    fn id(&self) -> MarkerId {
        self.id
    }
}

/// A closed node boundary.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CompletedMarker {
    id: MarkerId,
    kind: SyntaxKind,
}

impl CompletedMarker {
    pub(crate) fn new(id: MarkerId, kind: SyntaxKind) -> Self {
        Self { id, kind }
    }

    pub fn kind(&self) -> SyntaxKind {
        self.kind
    }

    #[track_caller]
    pub fn precede(self, b: &mut Builder<'_>) -> Marker {
        b.precede(self.id)
    }

    /// Removes the node boundaries but keeps everything inside.
    pub fn drop(self, b: &mut Builder<'_>) {
        b.drop_marker(self.id);
    }

    pub fn rollback_to(self, b: &mut Builder<'_>) {
        b.rollback_to(self.id);
    }

    pub fn set_edge_binders(self, b: &mut Builder<'_>, left: Option<Binder>, right: Option<Binder>) {
        b.set_edge_binders(&self, left, right);
    }
}

impl MarkerRef for CompletedMarker {
    fn id(&self) -> MarkerId {
        self.id
    }
}
