//! Voice command audit log.

pub mod voice_command_log;

pub use voice_command_log::{NewVoiceCommandLog, VoiceCommandLog};
