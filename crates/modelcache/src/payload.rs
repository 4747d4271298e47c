//! Payloads: the full cached value
//!
//! A payload is either a bare shared resource (`Arc<R>`) or a tuple whose first
//! element is the shared resource and whose remaining elements are arbitrary
//! values returned alongside it.

use std::sync::Arc;

use crate::resource::{Resource, ResourceShape};

/// A cacheable build result with a resource at the front
pub trait Payload: Send + Sync {
    /// Current shape of the structurally checked resource inside this payload
    fn resource_shape(&self) -> ResourceShape;
}

impl<R> Payload for Arc<R>
where
    R: Resource + ?Sized,
{
    fn resource_shape(&self) -> ResourceShape {
        self.as_ref().shape()
    }
}

impl<R, A> Payload for (Arc<R>, A)
where
    R: Resource + ?Sized,
    A: Send + Sync,
{
    fn resource_shape(&self) -> ResourceShape {
        self.0.shape()
    }
}

impl<R, A, B> Payload for (Arc<R>, A, B)
where
    R: Resource + ?Sized,
    A: Send + Sync,
    B: Send + Sync,
{
    fn resource_shape(&self) -> ResourceShape {
        self.0.shape()
    }
}

impl<R, A, B, C> Payload for (Arc<R>, A, B, C)
where
    R: Resource + ?Sized,
    A: Send + Sync,
    B: Send + Sync,
    C: Send + Sync,
{
    fn resource_shape(&self) -> ResourceShape {
        self.0.shape()
    }
}
