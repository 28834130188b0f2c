//! Iterative traversal over lists of particle trees.
//!
//! Every walk uses an explicit stack, so depth is bounded by heap, not by
//! the call stack. Order is pre-order, siblings in construction order.

use crate::float::Float;
use crate::particle::ParticleNode;
use alloc::vec::Vec;

/// Pre-order iterator over a forest.
pub struct Iter<'a, F: Float> {
    stack: Vec<&'a ParticleNode<F>>,
}

impl<'a, F: Float> Iterator for Iter<'a, F> {
    type Item = &'a ParticleNode<F>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.stack.pop()?;
        self.stack.extend(node.children().iter().rev());
        Some(node)
    }
}

pub fn iter<F: Float>(roots: &[ParticleNode<F>]) -> Iter<'_, F> {
    Iter { stack: roots.iter().rev().collect() }
}

/// Flat view of every node in the forest, rebuilt on each call.
pub fn flatten<F: Float>(roots: &[ParticleNode<F>]) -> Vec<&ParticleNode<F>> {
    iter(roots).collect()
}

pub fn node_count<F: Float>(roots: &[ParticleNode<F>]) -> usize {
    iter(roots).count()
}

/// First node carrying `label`, in pre-order.
pub fn find_by_label<F: Float>(roots: &[ParticleNode<F>], label: u32) -> Option<&ParticleNode<F>> {
    iter(roots).find(|node| node.label == label)
}

/// Visit every node mutably in pre-order.
///
/// `f` sees a node before any of its descendants and may edit its
/// children; the walk continues into whatever children remain.
pub fn for_each_mut<F: Float>(roots: &mut [ParticleNode<F>], mut f: impl FnMut(&mut ParticleNode<F>)) {
    let mut stack: Vec<&mut ParticleNode<F>> = roots.iter_mut().rev().collect();
    while let Some(node) = stack.pop() {
        f(&mut *node);
        stack.extend(node.children_mut().iter_mut().rev());
    }
}
