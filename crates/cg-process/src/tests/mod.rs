mod output_state_machine;

/// Vanilla console line at INFO from the main server thread
pub(crate) fn server_line(message: &str) -> String {
    format!("[20:40:13] [Server thread/INFO]: {message}")
}
