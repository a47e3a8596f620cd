//! Script, image and speech providers for the reel pipeline.
//!
//! Each provider sits behind one of the collaborator traits in [`traits`]:
//! - Gemini for scripts, scene images and narration
//! - ElevenLabs as an alternative narration voice
//! - Offline placeholders used when no credentials are configured

pub mod config;
pub mod elevenlabs;
pub mod error;
pub mod gemini;
pub mod placeholder;
pub mod traits;

pub use config::{build_providers, AudioBackend, AudioProviderKind, ProviderConfig, Providers};
pub use error::{ProviderError, ProviderResult};
pub use traits::{AudioGenerator, ImageGenerator, ScriptGenerator};
