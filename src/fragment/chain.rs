//! Zero-copy concatenation of received fragment windows.

use std::collections::VecDeque;

use bytes::{Buf, BufMut, Bytes, BytesMut};

/// Ordered chunks read as one continuous [`Buf`].
///
/// Reads that fit inside the current chunk are served without copying;
/// reads that span chunks gather into a fresh buffer.
#[derive(Clone, Debug, Default)]
pub struct ByteChain {
    chunks: VecDeque<Bytes>,
    remaining: usize,
}

impl ByteChain {
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Append `chunk` after everything already queued.
    pub fn push(&mut self, chunk: Bytes) {
        if chunk.is_empty() {
            return;
        }
        self.remaining += chunk.len();
        self.chunks.push_back(chunk);
    }

    /// Number of non-empty chunks still queued.
    #[must_use]
    pub fn chunk_count(&self) -> usize { self.chunks.len() }
}

impl FromIterator<Bytes> for ByteChain {
    fn from_iter<I: IntoIterator<Item = Bytes>>(iter: I) -> Self {
        let mut chain = Self::new();
        for chunk in iter {
            chain.push(chunk);
        }
        chain
    }
}

impl Buf for ByteChain {
    fn remaining(&self) -> usize { self.remaining }

    fn chunk(&self) -> &[u8] {
        match self.chunks.front() {
            Some(chunk) => chunk,
            None => &[],
        }
    }

    fn advance(&mut self, mut cnt: usize) {
        assert!(cnt <= self.remaining, "cannot advance past the end of the chain");
        self.remaining -= cnt;
        while cnt > 0 {
            let Some(front) = self.chunks.front_mut() else {
                break;
            };
            if cnt < front.len() {
                front.advance(cnt);
                break;
            }
            cnt -= front.len();
            self.chunks.pop_front();
        }
    }

    fn copy_to_bytes(&mut self, len: usize) -> Bytes {
        if let Some(front) = self.chunks.front_mut()
            && len <= front.len()
        {
            let out = front.split_to(len);
            if front.is_empty() {
                self.chunks.pop_front();
            }
            self.remaining -= len;
            return out;
        }
        let mut out = BytesMut::with_capacity(len);
        out.put((&mut *self).take(len));
        out.freeze()
    }
}
