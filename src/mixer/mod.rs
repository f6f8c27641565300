pub mod interleave;
pub mod orchestrator;
pub mod selection;

pub use interleave::{MAX_MIX_TRACKS, interleave, interleave_with};
pub use orchestrator::{FetchPolicy, MixOptions, MixOutcome, PlaylistMixer, WriteStrategy};
pub use selection::MixSelection;
