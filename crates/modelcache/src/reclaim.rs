//! Reclamation hook fired after an eviction
//!
//! Evicting an entry only drops the cache's handle. Whatever runtime owns the
//! heavy memory behind the resource gets a best-effort "reclaim now" signal;
//! the store neither waits for it nor checks what it did.

/// Receiver of post-eviction reclamation signals
pub trait Reclaimer: Send + Sync {
    /// Ask the owning runtime to release memory it no longer needs
    fn reclaim(&self);
}

/// Reclaimer that does nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopReclaimer;

impl Reclaimer for NoopReclaimer {
    fn reclaim(&self) {}
}

impl<F> Reclaimer for F
where
    F: Fn() + Send + Sync,
{
    fn reclaim(&self) {
        self()
    }
}
