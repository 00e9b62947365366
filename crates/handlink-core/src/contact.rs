//! Capability interface for touch interaction
//!
//! The skeleton does not know what it touches. Whatever detects fingertip
//! contact reports through this trait, and interaction code implements it.

/// Receives fingertip contact transitions
pub trait ProximityListener {
    /// Fingertip `joint` started touching the target
    fn on_contact_enter(&mut self, joint: usize);

    /// Fingertip `joint` stopped touching the target
    fn on_contact_exit(&mut self, joint: usize);
}

impl<T: ProximityListener + ?Sized> ProximityListener for &mut T {
    fn on_contact_enter(&mut self, joint: usize) {
        (**self).on_contact_enter(joint)
    }

    fn on_contact_exit(&mut self, joint: usize) {
        (**self).on_contact_exit(joint)
    }
}
