//! Pull buffer shared by the streaming providers
//!
//! Holds decoded canonical PCM between `stream` calls. The window exposed
//! by one pull is considered consumed at the start of the next one, so the
//! buffer never grows beyond one request plus one decoded frame.

use log::error;

use super::decoder::DecodeResult;

#[derive(Debug, Default)]
pub struct StreamBuffer {
    buffer: Vec<u8>,
    /// Bytes exposed by the last pull
    used: usize,
    /// The decoder has no more frames
    exhausted: bool,
    /// Sticky until `reset`
    end_of_stream: bool,
}

impl StreamBuffer {
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            ..Self::default()
        }
    }

    /// Refill from `fill` until `size` bytes are buffered
    ///
    /// `fill` appends one decoded frame and returns `Ok(false)` once the
    /// decoder is exhausted. A decoder error is logged and treated as
    /// exhaustion.
    ///
    /// # Returns
    /// Bytes now available through `data`; zero once the stream has ended.
    pub fn pull<F>(&mut self, size: usize, mut fill: F) -> usize
    where
        F: FnMut(&mut Vec<u8>) -> DecodeResult<bool>,
    {
        if self.end_of_stream {
            return 0;
        }

        self.buffer.drain(..self.used);
        self.used = 0;

        while self.buffer.len() < size && !self.exhausted {
            match fill(&mut self.buffer) {
                Ok(true) => {}
                Ok(false) => self.exhausted = true,
                Err(e) => {
                    error!("Stream decode failed: {}", e);
                    self.exhausted = true;
                }
            }
        }

        self.used = size.min(self.buffer.len());
        if self.used == 0 && self.exhausted {
            self.end_of_stream = true;
        }
        self.used
    }

    /// Window exposed by the last pull
    pub fn data(&self) -> &[u8] {
        &self.buffer[..self.used]
    }

    /// Drop buffered audio and clear end of stream
    pub fn reset(&mut self) {
        self.buffer.clear();
        self.used = 0;
        self.exhausted = false;
        self.end_of_stream = false;
    }

    /// Drop buffered audio and enter end of stream
    pub fn finish(&mut self) {
        self.buffer.clear();
        self.used = 0;
        self.exhausted = true;
        self.end_of_stream = true;
    }
}
