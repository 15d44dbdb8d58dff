//! Supervision of external processes and interpretation of their console output.

mod classifier;
mod error;
mod game_output_handler;
mod output_handler;
mod output_state_machine;
mod parsed_event;
mod process_record;
mod process_spec;
mod restart_policy;
mod server_state;
mod signal;
mod supervised;
mod supervisor;
mod supervisor_event;
mod supervisor_settings;
mod tunnel_output_handler;

pub use error::{Result as SupervisorResult, SupervisorError};
pub use game_output_handler::GameOutputHandler;
pub use output_handler::{LineSignal, OutputHandler, OutputStream, PassthroughHandler};
pub use output_state_machine::OutputStateMachine;
pub use parsed_event::{EventKind, ParsedEvent};
pub use process_record::{ProcessHandle, ProcessRecord, ProcessStatus};
pub use process_spec::ProcessSpec;
pub use restart_policy::RestartPolicy;
pub use server_state::{ServerState, ServerStatus};
pub use supervised::SupervisedProcess;
pub use supervisor::ProcessSupervisor;
pub use supervisor_event::SupervisorEvent;
pub use supervisor_settings::SupervisorSettings;
pub use tunnel_output_handler::{TunnelOutputHandler, parse_endpoint};

#[cfg(test)]
mod tests;

/// Capacity of every per-instance event channel.
const EVENT_CHANNEL_CAPACITY: usize = 256;
