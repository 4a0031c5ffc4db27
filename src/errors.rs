//! Error types returned by octree construction, the codec, and boolean operations.

/// Everything that can make a CSG call fail.
///
/// Structural problems are returned as soon as they are detected and are never
/// retried. Worker failures distinguish a pool that could not start
/// ([`CsgError::WorkerCreation`], recoverable by running synchronously) from a
/// job whose computation failed ([`CsgError::Operation`]).
#[derive(Debug, thiserror::Error)]
pub enum CsgError {
    /// An octree holding polygons was queried before `build_tree` gave it a box
    #[error("octree has polygons but no bounding box; build_tree must run first")]
    MissingBoundingBox,
    /// An operation descriptor has the wrong shape (unknown arity, empty operand list)
    #[error("malformed operation: {0}")]
    MalformedOperation(String),
    /// Flat position array whose length is not a whole number of triangles
    #[error("vertex array length {0} is not a multiple of 9 (three xyz vertices per triangle)")]
    VertexArrayLength(usize),
    /// Normal array that does not pair up with the position array
    #[error("normal array length {normals} does not match vertex array length {vertices}")]
    NormalArrayLength { vertices: usize, normals: usize },
    /// The transform has no inverse, so normals cannot be carried through it
    #[error("transform matrix is not invertible")]
    NonInvertibleMatrix,
    /// Vertices of a material carry attributes that disagree with its registered layout
    #[error("vertices of material {material} do not match its registered vertex layout")]
    AttributeLayout { material: u32 },
    /// The binary octree encoding could not be read
    #[error(transparent)]
    Decode(#[from] DecodeError),
    /// The worker pool could not be created or did not start in time
    #[error("worker creation failed: {0}")]
    WorkerCreation(String),
    /// A dispatched job reported a failure
    #[error("job {job_index} failed: {message}")]
    Operation { job_index: usize, message: String },
}

/// Problems found while decoding the binary octree format.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("buffer truncated at byte {offset}: needed {needed} bytes, {remaining} remaining")]
    Truncated {
        offset: usize,
        needed: usize,
        remaining: usize,
    },
    #[error("unknown octree flag bits {0:#04x}")]
    InvalidFlags(u8),
    #[error("{0} trailing bytes after the root octree")]
    TrailingBytes(usize),
    #[error("octree nesting exceeds {0} levels")]
    TooDeep(usize),
    #[error("octree node declares subtrees but carries no bounding box")]
    SubtreesWithoutBox,
}
