//! Combine-latest over a fixed set of live sources
//!
//! Holds the most recent value of every source. Nothing is emitted until each
//! source has produced at least once; after that every single update re-emits
//! the full set, carrying the other sources' latest values forward. The first
//! error ends the stream and drops every source, as does a source that ends
//! before it ever reported.

use crate::error::Result;
use futures::stream::{SelectAll, Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};

/// A source stream tagged with its position; yields `(index, None)` once when it ends
struct Tagged<S> {
    index: usize,
    inner: S,
    ended: bool,
}

impl<S: Stream + Unpin> Stream for Tagged<S> {
    type Item = (usize, Option<S::Item>);

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.ended {
            return Poll::Ready(None);
        }
        let index = self.index;
        match self.inner.poll_next_unpin(cx) {
            Poll::Ready(Some(value)) => Poll::Ready(Some((index, Some(value)))),
            Poll::Ready(None) => {
                self.ended = true;
                Poll::Ready(Some((index, None)))
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Merged view of N sources, yielding the latest value of each in source order
pub struct CombineLatest<S, T> {
    sources: SelectAll<Tagged<S>>,
    latest: Vec<Option<T>>,
    waiting: usize,
    done: bool,
}

impl<S, T> CombineLatest<S, T>
where
    S: Stream<Item = Result<T>> + Unpin,
    T: Clone,
{
    pub fn new(sources: impl IntoIterator<Item = S>) -> Self {
        let sources: SelectAll<Tagged<S>> = sources
            .into_iter()
            .enumerate()
            .map(|(index, inner)| Tagged {
                index,
                inner,
                ended: false,
            })
            .collect();
        let count = sources.len();
        Self {
            sources,
            latest: vec![None; count],
            waiting: count,
            done: false,
        }
    }

    /// Number of sources that have not reported yet
    pub fn waiting(&self) -> usize {
        self.waiting
    }

    /// Drop every source; the stream yields nothing afterwards
    pub fn close(&mut self) {
        self.sources = SelectAll::new();
        self.done = true;
    }

    pub fn is_closed(&self) -> bool {
        self.done
    }
}

// No field is structurally pinned; sources are polled through `Unpin` handles.
impl<S, T> Unpin for CombineLatest<S, T> {}

impl<S, T> Stream for CombineLatest<S, T>
where
    S: Stream<Item = Result<T>> + Unpin,
    T: Clone,
{
    type Item = Result<Vec<T>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.done {
            return Poll::Ready(None);
        }

        loop {
            match this.sources.poll_next_unpin(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(None) => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(Some((index, None))) => {
                    // a source that never reported means no full set can ever exist
                    if this.latest[index].is_none() {
                        this.close();
                        return Poll::Ready(None);
                    }
                }
                Poll::Ready(Some((_, Some(Err(e))))) => {
                    this.close();
                    return Poll::Ready(Some(Err(e)));
                }
                Poll::Ready(Some((index, Some(Ok(value))))) => {
                    if this.latest[index].replace(value).is_none() {
                        this.waiting -= 1;
                    }
                    if this.waiting == 0 {
                        let merged = this.latest.iter().flatten().cloned().collect();
                        return Poll::Ready(Some(Ok(merged)));
                    }
                }
            }
        }
    }
}
