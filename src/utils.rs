//! Small shared helpers.

use std::{cell::{Ref, RefCell, RefMut}, rc::Rc};

/// A shared mutable cell, `Rc<RefCell<T>>` without the turbofish noise.
/// The interpreter's output sink hands clones of one of these to tests so
/// they can read back what `print` wrote.
#[derive(Debug, Default)]
pub struct RcCell<T> {
	inner: Rc<RefCell<T>>,
}

impl<T> Clone for RcCell<T> {
	fn clone(&self) -> Self { Self { inner: self.inner.clone() } }
}

impl<T> RcCell<T> {
	pub fn new(value: T) -> Self { Self { inner: Rc::new(RefCell::new(value)) } }

	pub fn borrow(&self) -> Ref<'_, T> { self.inner.borrow() }

	pub fn borrow_mut(&self) -> RefMut<'_, T> { self.inner.borrow_mut() }
}
