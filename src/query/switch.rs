//! Re-targetable radius queries
//!
//! A `SwitchHits` follows a stream of query parameters. Each new center/radius
//! drops the current `HitStream` (cancelling all of its cell subscriptions)
//! before the replacement set is opened, so subscriptions never pile up.

use super::{GeoQuery, Hit, HitStream, QueryOptions};
use crate::coord::GeoPoint;
use crate::error::Result;
use crate::store::DocumentStore;
use futures::stream::BoxStream;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::watch;
use tracing::debug;

/// Center and radius of a radius query
#[derive(Debug, Clone, PartialEq)]
pub struct WithinParams {
    pub center: GeoPoint,
    pub radius_km: f64,
}

impl WithinParams {
    pub fn new(center: GeoPoint, radius_km: f64) -> Self {
        Self { center, radius_km }
    }
}

/// Stream the current value of a `watch` channel, then every later change
pub fn watch_params(rx: watch::Receiver<WithinParams>) -> impl Stream<Item = WithinParams> + Send {
    futures::stream::unfold((rx, true), |(mut rx, first)| async move {
        if !first {
            rx.changed().await.ok()?;
        }
        let params = rx.borrow_and_update().clone();
        Some((params, (rx, false)))
    })
}

/// Hit lists of whichever query the latest parameters describe
pub struct SwitchHits<S> {
    query: GeoQuery<S>,
    params: BoxStream<'static, WithinParams>,
    field: String,
    opts: QueryOptions,
    current: Option<HitStream>,
    params_done: bool,
    finished: bool,
}

impl<S: DocumentStore> SwitchHits<S> {
    pub(super) fn new(
        query: GeoQuery<S>,
        params: BoxStream<'static, WithinParams>,
        field: String,
        opts: QueryOptions,
    ) -> Self {
        Self {
            query,
            params,
            field,
            opts,
            current: None,
            params_done: false,
            finished: false,
        }
    }

    /// Cells of the active query, if any
    pub fn cells(&self) -> Option<&[String]> {
        self.current.as_ref().map(|c| c.cells())
    }

    /// Stop following parameters and tear down the active query
    pub fn cancel(&mut self) {
        self.finished = true;
        self.current = None;
    }

    fn switch_to(&mut self, params: WithinParams) -> Result<()> {
        // drop first so the old cells are cancelled before new ones open
        self.current = None;
        debug!(radius_km = params.radius_km, "Switching radius query");
        let stream = self
            .query
            .within(&params.center, params.radius_km, &self.field, self.opts.clone())?;
        self.current = Some(stream);
        Ok(())
    }
}

impl<S: DocumentStore> Stream for SwitchHits<S> {
    type Item = Result<Vec<Hit>>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.finished {
            return Poll::Ready(None);
        }

        // Only the newest parameters matter; skip any that queued up
        let mut latest = None;
        while !this.params_done {
            match this.params.poll_next_unpin(cx) {
                Poll::Ready(Some(params)) => latest = Some(params),
                Poll::Ready(None) => this.params_done = true,
                Poll::Pending => break,
            }
        }
        if let Some(params) = latest {
            if let Err(e) = this.switch_to(params) {
                this.cancel();
                return Poll::Ready(Some(Err(e)));
            }
        }

        let Some(current) = this.current.as_mut() else {
            return if this.params_done {
                this.finished = true;
                Poll::Ready(None)
            } else {
                Poll::Pending
            };
        };

        match current.poll_next_unpin(cx) {
            Poll::Ready(Some(Ok(hits))) => Poll::Ready(Some(Ok(hits))),
            Poll::Ready(Some(Err(e))) => {
                this.cancel();
                Poll::Ready(Some(Err(e)))
            }
            Poll::Ready(None) => {
                this.current = None;
                if this.params_done {
                    this.finished = true;
                    Poll::Ready(None)
                } else {
                    Poll::Pending
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
