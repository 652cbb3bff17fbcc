//! Ordered chain of filters applied to every frame.

use tracing::{debug, trace};

use crate::error::Result;
use crate::filter::Filter;
use crate::frame::VideoFrame;

/// Processing pipeline that chains filters together.
///
/// ```text
/// frame -> filter[0] -> filter[1] -> ... -> filter[n-1] -> frame
/// ```
///
/// The output of each filter is the exact input of the next one. An empty
/// pipeline returns its input unchanged. The first filter error aborts the
/// frame and is returned as is.
#[derive(Default)]
pub struct Pipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl Pipeline {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a filter to the end of the chain.
    pub fn add_filter(&mut self, filter: impl Filter + 'static) {
        self.filters.push(Box::new(filter));
    }

    /// Builder-style variant of [`Pipeline::add_filter`].
    pub fn with_filter(mut self, filter: impl Filter + 'static) -> Self {
        self.add_filter(filter);
        self
    }

    pub fn len(&self) -> usize {
        self.filters.len()
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    /// Names of the filters in processing order.
    pub fn filter_names(&self) -> Vec<&str> {
        self.filters.iter().map(|f| f.name()).collect()
    }

    /// Passes the frame through every filter in insertion order.
    pub fn process(&self, frame: VideoFrame) -> Result<VideoFrame> {
        let mut current = frame;
        for (index, filter) in self.filters.iter().enumerate() {
            trace!(stage = index, filter = filter.name(), "processing");
            current = filter.process(current).inspect_err(|e| {
                debug!(stage = index, filter = filter.name(), "stage failed: {}", e);
            })?;
        }
        Ok(current)
    }
}

impl Filter for Pipeline {
    fn name(&self) -> &str {
        "pipeline"
    }

    fn process(&self, input: VideoFrame) -> Result<VideoFrame> {
        Pipeline::process(self, input)
    }
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("filters", &self.filter_names())
            .finish()
    }
}
