pub mod handler;

use clap::Args;

use crate::cli::AudioArgs;

pub use handler::handle_link_audio_command;

#[derive(Args, Debug)]
pub struct LinkAudioCommands {
    #[command(flatten)]
    pub audio: AudioArgs,
}
