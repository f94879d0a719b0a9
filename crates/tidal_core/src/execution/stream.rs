//! Pull-based batch streams.
//!
//! Every operator produces a stream of batches. Consumers pull batches one at a
//! time with `poll_next`. A stream is single pass, re-executing the plan
//! produces a new one.
//!
//! Closing a stream closes everything upstream of it. Dropping a stream closes
//! it. Once a stream returns an error it closes its upstream and reports
//! end-of-stream on every following pull.

use std::fmt::Debug;
use std::sync::Arc;

use tidal_error::Result;

use crate::arrays::batch::Batch;
use crate::arrays::field::Schema;

pub trait BatchStream: Debug + Send {
    /// Schema of every batch produced by this stream.
    fn schema(&self) -> &Arc<Schema>;

    /// Pull the next batch, `None` once the stream is exhausted.
    fn poll_next(&mut self) -> Result<Option<Batch>>;

    /// Release resources held by this stream and its upstream.
    ///
    /// Idempotent. Pulling after close returns `None`.
    fn close(&mut self);
}

pub type BoxedBatchStream = Box<dyn BatchStream>;

/// Adapter exposing a stream as an iterator.
#[derive(Debug)]
pub struct BatchIter {
    stream: BoxedBatchStream,
}

impl BatchIter {
    pub fn new(stream: BoxedBatchStream) -> Self {
        BatchIter { stream }
    }
}

impl Iterator for BatchIter {
    type Item = Result<Batch>;

    fn next(&mut self) -> Option<Self::Item> {
        self.stream.poll_next().transpose()
    }
}

/// Pull every batch from a stream.
pub fn collect_stream(stream: BoxedBatchStream) -> Result<Vec<Batch>> {
    BatchIter::new(stream).collect()
}

/// Upstream handle held by operator streams.
///
/// Becomes empty once closed or after an error passes through it, after which
/// pulls return `None`.
#[derive(Debug)]
pub(crate) struct Upstream {
    stream: Option<BoxedBatchStream>,
}

impl Upstream {
    pub(crate) fn new(stream: BoxedBatchStream) -> Self {
        Upstream {
            stream: Some(stream),
        }
    }

    /// Pull a batch from upstream and map it.
    ///
    /// Closes upstream if either the pull or the map errors.
    pub(crate) fn pull_map<F>(&mut self, f: F) -> Result<Option<Batch>>
    where
        F: FnOnce(Batch) -> Result<Batch>,
    {
        let stream = match self.stream.as_mut() {
            Some(stream) => stream,
            None => return Ok(None),
        };

        let result = match stream.poll_next() {
            Ok(Some(batch)) => f(batch).map(Some),
            Ok(None) => Ok(None),
            Err(e) => Err(e),
        };

        match result {
            Ok(Some(batch)) => Ok(Some(batch)),
            Ok(None) => {
                self.close();
                Ok(None)
            }
            Err(e) => {
                self.close();
                Err(e)
            }
        }
    }

    pub(crate) fn close(&mut self) {
        if let Some(mut stream) = self.stream.take() {
            stream.close();
        }
    }
}

impl Drop for Upstream {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    //! Streams for exercising operators.

    use std::sync::atomic::{AtomicBool, Ordering};

    use tidal_error::{DbError, Result};

    use super::*;

    /// Yields fixed batches then optionally an error, recording whether it
    /// was closed.
    #[derive(Debug)]
    pub struct TrackedStream {
        schema: Arc<Schema>,
        batches: std::vec::IntoIter<Batch>,
        fail_at_end: bool,
        closed: Arc<AtomicBool>,
    }

    impl TrackedStream {
        pub fn new(schema: Arc<Schema>, batches: Vec<Batch>) -> (Self, Arc<AtomicBool>) {
            let closed = Arc::new(AtomicBool::new(false));
            let stream = TrackedStream {
                schema,
                batches: batches.into_iter(),
                fail_at_end: false,
                closed: closed.clone(),
            };
            (stream, closed)
        }

        pub fn failing(mut self) -> Self {
            self.fail_at_end = true;
            self
        }
    }

    impl BatchStream for TrackedStream {
        fn schema(&self) -> &Arc<Schema> {
            &self.schema
        }

        fn poll_next(&mut self) -> Result<Option<Batch>> {
            if self.closed.load(Ordering::SeqCst) {
                return Ok(None);
            }
            match self.batches.next() {
                Some(batch) => Ok(Some(batch)),
                None if self.fail_at_end => Err(DbError::new("upstream failure")),
                None => Ok(None),
            }
        }

        fn close(&mut self) {
            self.closed.store(true, Ordering::SeqCst);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::testutil::TrackedStream;
    use super::*;
    use crate::generate_batch;

    #[test]
    fn iter_yields_all_batches() {
        let b1 = generate_batch!(("a", [1, 2]));
        let b2 = generate_batch!(("a", [3]));
        let (stream, _) = TrackedStream::new(b1.schema().clone(), vec![b1, b2]);

        let batches = collect_stream(Box::new(stream)).unwrap();
        assert_eq!(2, batches.len());
        assert_eq!(1, batches[1].num_rows());
    }

    #[test]
    fn upstream_closes_on_exhaustion() {
        let b1 = generate_batch!(("a", [1, 2]));
        let (stream, closed) = TrackedStream::new(b1.schema().clone(), vec![b1]);
        let mut upstream = Upstream::new(Box::new(stream));

        assert!(upstream.pull_map(Ok).unwrap().is_some());
        assert!(!closed.load(Ordering::SeqCst));
        assert!(upstream.pull_map(Ok).unwrap().is_none());
        assert!(closed.load(Ordering::SeqCst));
    }

    #[test]
    fn upstream_fused_after_error() {
        let b1 = generate_batch!(("a", [1, 2]));
        let (stream, closed) = TrackedStream::new(b1.schema().clone(), vec![b1]);
        let mut upstream = Upstream::new(Box::new(stream.failing()));

        assert!(upstream.pull_map(Ok).unwrap().is_some());
        assert!(upstream.pull_map(Ok).is_err());
        assert!(closed.load(Ordering::SeqCst));
        assert!(upstream.pull_map(Ok).unwrap().is_none());
    }

    #[test]
    fn upstream_closes_on_drop() {
        let b1 = generate_batch!(("a", [1, 2]));
        let (stream, closed) = TrackedStream::new(b1.schema().clone(), vec![b1]);
        let upstream = Upstream::new(Box::new(stream));

        std::mem::drop(upstream);
        assert!(closed.load(Ordering::SeqCst));
    }
}
