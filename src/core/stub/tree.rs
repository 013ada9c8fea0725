//! Per-output view ordering.

use crate::core::handle::View;

/// The two independent view orderings of one output.
#[derive(Debug, Default, Clone)]
pub struct ViewTree {
    /// Views in stacking order (back to front).
    /// The last element is the topmost view.
    pub stacking_order: Vec<View>,
    /// Views in creation order. Restacking never touches this list.
    pub creation_order: Vec<View>,
}

impl ViewTree {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, view: View) -> bool {
        self.creation_order.contains(&view)
    }

    pub fn len(&self) -> usize {
        self.creation_order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.creation_order.is_empty()
    }

    /// Insert a new view at the top of the stack.
    pub fn insert(&mut self, view: View) {
        if !self.contains(view) {
            self.stacking_order.push(view);
            self.creation_order.push(view);
        }
    }

    /// Remove a view from both orderings.
    pub fn remove(&mut self, view: View) {
        self.stacking_order.retain(|&v| v != view);
        self.creation_order.retain(|&v| v != view);
    }

    fn position(&self, view: View) -> Option<usize> {
        self.stacking_order.iter().position(|&v| v == view)
    }

    /// Move a view to the top (front) of the stack.
    pub fn bring_to_front(&mut self, view: View) {
        if let Some(pos) = self.position(view) {
            let view = self.stacking_order.remove(pos);
            self.stacking_order.push(view);
        }
    }

    /// Move a view to the bottom of the stack.
    pub fn send_to_back(&mut self, view: View) {
        if let Some(pos) = self.position(view) {
            let view = self.stacking_order.remove(pos);
            self.stacking_order.insert(0, view);
        }
    }

    /// Restack `view` directly above `other`.
    pub fn bring_above(&mut self, view: View, other: View) {
        if view == other || self.position(other).is_none() {
            return;
        }
        if let Some(pos) = self.position(view) {
            let view = self.stacking_order.remove(pos);
            if let Some(anchor) = self.position(other) {
                self.stacking_order.insert(anchor + 1, view);
            }
        }
    }

    /// Restack `view` directly below `other`.
    pub fn send_below(&mut self, view: View, other: View) {
        if view == other || self.position(other).is_none() {
            return;
        }
        if let Some(pos) = self.position(view) {
            let view = self.stacking_order.remove(pos);
            if let Some(anchor) = self.position(other) {
                self.stacking_order.insert(anchor, view);
            }
        }
    }

    /// Get the topmost view.
    pub fn topmost(&self) -> Option<View> {
        self.stacking_order.last().copied()
    }

    /// Replace the stacking order. `order` must be a permutation of the
    /// views on this output; anything else is refused and nothing changes.
    pub fn restack(&mut self, order: &[View]) -> bool {
        if order.len() != self.stacking_order.len() {
            return false;
        }
        let mut wanted = order.to_vec();
        let mut current = self.stacking_order.clone();
        wanted.sort_unstable();
        current.sort_unstable();
        if wanted != current {
            return false;
        }
        self.stacking_order = order.to_vec();
        true
    }
}
