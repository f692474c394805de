//! Per-frame notification of dependent LOD data layers.

use std::cell::RefCell;
use std::rc::Rc;

use crate::frame::LodFrame;

/// A simulation or rendering layer that follows the LOD transform.
///
/// The controller calls [`update_for_frame`](Self::update_for_frame) on every
/// registered layer after publishing the frame. Absent layers are simply not
/// registered.
pub trait LodDataLayer {
    /// Short name used in logs.
    fn name(&self) -> &'static str;

    /// React to the newly published transform. Failures are the layer's own
    /// concern.
    fn update_for_frame(&mut self, frame: &LodFrame);
}

/// Lets the frame driver keep a handle to a layer it also registers.
impl<L: LodDataLayer + ?Sized> LodDataLayer for Rc<RefCell<L>> {
    fn name(&self) -> &'static str {
        self.borrow().name()
    }

    fn update_for_frame(&mut self, frame: &LodFrame) {
        self.borrow_mut().update_for_frame(frame);
    }
}
