//! Speech pipeline: text-to-speech followed by voice conversion.
//!
//! A request's text is rendered to audio chunks by a [`TextToSpeech`]
//! engine, the chunks are concatenated in emission order and written to a
//! scratch WAV file, and a [`VoiceConverter`] re-renders that file in the
//! timbre of a registered [`VoiceProfile`](voxcast_types::VoiceProfile).
//! The converted WAV bytes are what the HTTP layer returns.
//!
//! The engines themselves are external programs. [`KokoroEngine`] and
//! [`RvcConverter`] drive them as subprocesses; [`mock`] holds in-process
//! stand-ins for tests.

pub mod artifacts;
pub mod convert;
pub mod error;
pub mod frames;
pub mod mock;
pub mod pipeline;
pub mod tts;
pub mod wav;

pub use artifacts::ensure_artifacts;
pub use convert::{RvcConverter, VoiceConverter};
pub use error::SpeechError;
pub use pipeline::SpeechPipeline;
pub use tts::{KokoroEngine, TextToSpeech, VoiceSelector};
