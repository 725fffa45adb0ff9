mod file_store;
mod memory_store;
mod segment;
mod segment_store;

pub use {
    file_store::FileSegmentStore, memory_store::MemorySegmentStore, segment::Segment,
    segment_store::SegmentStore,
};
