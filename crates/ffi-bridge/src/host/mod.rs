//! Host-side glue
//!
//! What a host runtime links against: a tagged external pointer for prior
//! handles, wrappers that check it before any native call, and an
//! in-process allocator standing in for the managed heap.

pub mod external_ptr;
pub mod local;
pub mod wrapper;

pub use external_ptr::ExternalPtr;
pub use local::{LocalHost, LocalMatrix, LocalToken};
pub use wrapper::{
    free_epa_parameters, new_epa_parameters, sample_partition, sample_partition_with_callbacks,
    HostCallbacks,
};
