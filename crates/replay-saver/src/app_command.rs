use replay_saver_core::TriggerSource;

/// Commands sent from trigger sources to the main application.
#[derive(Debug, Clone, Copy)]
pub enum AppCommand {
    /// Save the replay buffer.
    SaveReplay {
        /// What asked for the save.
        source: TriggerSource,
    },
    /// Request application shutdown.
    Shutdown,
}
