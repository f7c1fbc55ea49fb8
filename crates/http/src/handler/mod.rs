//! Request handler abstractions.
//!
//! A [`Handler`] receives the completed [`Request`] and a [`ResponseWriter`]
//! bound to the same connection, and is solely responsible for driving the
//! writer through a legal write sequence. The dispatcher neither inspects
//! nor retries on handler behavior.

use std::future::Future;

use async_trait::async_trait;

use crate::protocol::Request;
use crate::response::ResponseWriter;

#[async_trait]
pub trait Handler<W>: Send + Sync
where
    W: Send + 'static,
{
    async fn call(&self, writer: ResponseWriter<W>, request: Request);
}

/// Adapts a plain async fn into a [`Handler`].
#[derive(Debug)]
pub struct HandlerFn<F> {
    f: F,
}

#[async_trait]
impl<W, F, Fut> Handler<W> for HandlerFn<F>
where
    W: Send + 'static,
    F: Fn(ResponseWriter<W>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    async fn call(&self, writer: ResponseWriter<W>, request: Request) {
        (self.f)(writer, request).await
    }
}

pub fn make_handler<W, F, Fut>(f: F) -> HandlerFn<F>
where
    W: Send + 'static,
    F: Fn(ResponseWriter<W>, Request) -> Fut + Send + Sync,
    Fut: Future<Output = ()> + Send,
{
    HandlerFn { f }
}
