//! Timestamp-ordered frame buffer.

use swing_models::Frame;

/// Frames awaiting analysis, kept sorted ascending by timestamp.
///
/// Frames with equal timestamps keep their arrival order. The buffer never
/// evicts on its own; it only empties through [`FrameBuffer::clear`].
#[derive(Debug, Default, Clone)]
pub struct FrameBuffer {
    frames: Vec<Frame>,
}

impl FrameBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a frame at its timestamp position.
    pub fn insert(&mut self, frame: Frame) {
        // Clients mostly send in order, so the common case is an append.
        match self.frames.last() {
            Some(last) if frame.timestamp < last.timestamp => {
                let idx = self.frames.partition_point(|f| f.timestamp <= frame.timestamp);
                self.frames.insert(idx, frame);
            }
            _ => self.frames.push(frame),
        }
    }

    pub fn first_timestamp(&self) -> Option<f64> {
        self.frames.first().map(|f| f.timestamp)
    }

    pub fn last_timestamp(&self) -> Option<f64> {
        self.frames.last().map(|f| f.timestamp)
    }

    /// Seconds between the oldest and newest buffered frame.
    pub fn span(&self) -> f64 {
        match (self.first_timestamp(), self.last_timestamp()) {
            (Some(first), Some(last)) => last - first,
            _ => 0.0,
        }
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    /// Independent copy of the current frames.
    pub fn snapshot(&self) -> Vec<Frame> {
        self.frames.clone()
    }

    pub fn frames(&self) -> &[Frame] {
        &self.frames
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn frame(ts: f64, tag: &str) -> Frame {
        Frame::new(ts, tag)
    }

    fn timestamps(buffer: &FrameBuffer) -> Vec<f64> {
        buffer.frames().iter().map(|f| f.timestamp).collect()
    }

    #[test]
    fn test_sorted_after_every_insert() {
        let mut buffer = FrameBuffer::new();
        for ts in [0.5, 0.1, 0.9, 0.3, 0.3, 2.0, 0.0, 1.7] {
            buffer.insert(frame(ts, "x"));
            let ts = timestamps(&buffer);
            assert!(ts.windows(2).all(|w| w[0] <= w[1]), "unsorted: {:?}", ts);
        }
        assert_eq!(buffer.len(), 8);
        assert_eq!(buffer.first_timestamp(), Some(0.0));
        assert_eq!(buffer.last_timestamp(), Some(2.0));
        assert_eq!(buffer.span(), 2.0);
    }

    #[test]
    fn test_equal_timestamps_keep_arrival_order() {
        let mut buffer = FrameBuffer::new();
        buffer.insert(frame(1.0, "a"));
        buffer.insert(frame(2.0, "c"));
        buffer.insert(frame(1.0, "b"));
        let tags: Vec<&str> = buffer.frames().iter().map(|f| &*f.image).collect();
        assert_eq!(tags, vec!["a", "b", "c"]);
    }

    #[test]
    fn test_empty_buffer() {
        let mut buffer = FrameBuffer::new();
        assert_eq!(buffer.first_timestamp(), None);
        assert_eq!(buffer.last_timestamp(), None);
        assert_eq!(buffer.span(), 0.0);

        buffer.insert(frame(3.0, "x"));
        buffer.clear();
        assert!(buffer.is_empty());
        assert_eq!(buffer.last_timestamp(), None);
    }

    #[test]
    fn test_snapshot_is_independent() {
        let mut buffer = FrameBuffer::new();
        buffer.insert(frame(0.0, "a"));
        let snapshot = buffer.snapshot();
        buffer.insert(frame(0.5, "b"));
        assert_eq!(snapshot.len(), 1);
        assert_eq!(buffer.len(), 2);
    }
}
