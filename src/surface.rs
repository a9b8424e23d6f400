//! Platform abstraction for the two dispatch sinks the fabric fans out to
//! (§4.5). The core treats rendering, the DOM, and the cross-origin channel
//! as external collaborators — these traits are the seam.

use crate::events::{PointerEvent, SyntheticPointerMessage};

/// Resolves the target surface's pixel dimensions for the overscan mapping.
/// A real embedding host backs this with its actual viewport; tests and the
/// replay binary use a fixed rectangle.
pub trait ScreenMapper {
    fn surface_size(&self) -> (f64, f64);
}

pub struct FixedScreenMapper {
    pub width: f64,
    pub height: f64,
}

impl ScreenMapper for FixedScreenMapper {
    fn surface_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

/// Resolves the DOM element at a mapped screen point and dispatches a
/// synthetic pointer event locally. Implemented by the embedding host.
pub trait LocalDispatch {
    fn dispatch_local(&mut self, event: &PointerEvent) -> anyhow::Result<()>;
}

/// Posts a `SYNTHETIC_POINTER_EVENT` message to a cross-origin embedded
/// document. The recipient (out of scope) re-dispatches it locally.
pub trait ForeignPoster {
    fn post_message(&mut self, message: &SyntheticPointerMessage) -> anyhow::Result<()>;
}

/// One fan-out destination for emitted pointer events. The fabric never lets
/// a sink failure interrupt delivery to the others.
pub trait Surface {
    fn name(&self) -> &'static str;
    fn dispatch(&mut self, event: &PointerEvent) -> anyhow::Result<()>;
}

pub struct LocalSurface<D: LocalDispatch> {
    dispatcher: D,
}

impl<D: LocalDispatch> LocalSurface<D> {
    pub fn new(dispatcher: D) -> Self {
        Self { dispatcher }
    }
}

impl<D: LocalDispatch> Surface for LocalSurface<D> {
    fn name(&self) -> &'static str {
        "local"
    }

    fn dispatch(&mut self, event: &PointerEvent) -> anyhow::Result<()> {
        self.dispatcher.dispatch_local(event)
    }
}

pub struct ForeignSurface<P: ForeignPoster> {
    poster: P,
}

impl<P: ForeignPoster> ForeignSurface<P> {
    pub fn new(poster: P) -> Self {
        Self { poster }
    }
}

impl<P: ForeignPoster> Surface for ForeignSurface<P> {
    fn name(&self) -> &'static str {
        "foreign"
    }

    fn dispatch(&mut self, event: &PointerEvent) -> anyhow::Result<()> {
        let message = SyntheticPointerMessage::from_pointer_event(event);
        self.poster.post_message(&message)
    }
}
