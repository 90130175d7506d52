//! Host-engine FFI bridge for EPA partition sampling
//!
//! This crate is the boundary between a host statistical runtime and the
//! native sampling engine. Data flows in both directions:
//!
//! - host → engine: numeric inputs arrive as [`FlatBufferView`]s, a prior is
//!   built once into a [`PriorHandle`] and passed back by opaque pointer.
//! - engine → host: draws are written into a pinned [`ManagedVector`] owned
//!   by the host, and callback-driven priors re-enter the host through a
//!   [`CallbackTable`] mid-sample.
//!
//! The C ABI lives in [`abi`]; [`host`] holds the glue a host links against
//! together with [`LocalHost`], an in-process stand-in for the managed heap.

pub mod abi;
pub mod buffer;
pub mod callback;
pub mod guard;
pub mod handle;
pub mod host;
pub mod managed;
pub mod orchestrator;

pub use buffer::{Element, ElementKind, FlatBufferView};
pub use callback::{CallbackTable, ForeignLikelihood, ItemLikelihoodFn, SubsetLikelihoodFn};
pub use guard::{ensure_idle, sampling_in_progress, SamplingScope};
pub use handle::PriorHandle;
pub use host::{ExternalPtr, LocalHost, LocalMatrix, LocalToken};
pub use managed::{HostAllocator, ManagedVector};
pub use orchestrator::{sample_epa, sample_into, sample_partitions, EpaDraws, PriorKind, SampleRequest};
